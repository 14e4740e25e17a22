use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::contract::ISimple7702Account;

/// A single call executed by the smart account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new<C: SolCall>(target: Address, call: C) -> Self {
        Self {
            target,
            value: U256::ZERO,
            data: call.abi_encode().into(),
        }
    }

    /// 4-byte selector of the encoded call
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|x| x.try_into().ok())
    }
}

/// Encode the account calldata, `execute` for a single call and `executeBatch` otherwise
pub fn encode_calls(calls: &[Call]) -> Bytes {
    match calls {
        [call] => ISimple7702Account::executeCall {
            target: call.target,
            value: call.value,
            data: call.data.clone(),
        }
        .abi_encode()
        .into(),
        calls => ISimple7702Account::executeBatchCall {
            calls: calls
                .iter()
                .map(|call| ISimple7702Account::Call {
                    target: call.target,
                    value: call.value,
                    data: call.data.clone(),
                })
                .collect(),
        }
        .abi_encode()
        .into(),
    }
}
