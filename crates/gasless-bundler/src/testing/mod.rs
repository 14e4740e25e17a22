use std::fmt::Debug;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use gasless_evm::operation::{GasFees, GasLimits, UserOperation};

use crate::types::{TransactionReceipt, UserOperationReceipt};
use crate::Error;

#[async_trait]
pub trait MockBundlerClient: 'static + Send + Sync + Debug {
    fn new() -> Self
    where
        Self: Sized;

    async fn fetch_gas_price(&self) -> Result<GasFees, Error> {
        unimplemented!()
    }

    async fn estimate_user_operation_gas(&self, _operation: &UserOperation, _entry_point: Address) -> Result<GasLimits, Error> {
        unimplemented!()
    }

    async fn send_user_operation(&self, _operation: &UserOperation, _entry_point: Address) -> Result<B256, Error> {
        unimplemented!()
    }

    async fn fetch_user_operation_receipt(&self, _hash: B256) -> Result<Option<UserOperationReceipt>, Error> {
        unimplemented!()
    }
}

/// Receipt of an operation included in `transaction_hash`
pub fn receipt(user_op_hash: B256, transaction_hash: B256, success: bool) -> UserOperationReceipt {
    UserOperationReceipt {
        user_op_hash,
        success,
        reason: (!success).then(|| "execution reverted".to_string()),
        receipt: TransactionReceipt { transaction_hash },
    }
}
