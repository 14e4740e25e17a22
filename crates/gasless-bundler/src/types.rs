use alloy::primitives::{Address, Bytes, B256, U256};
use gasless_evm::operation::{GasFees, GasLimits, UserOperation};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Factory marker telling the bundler that the sender is a 7702 account
pub const EIP7702_FACTORY: &str = "0x7702";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcAuthorization {
    pub chain_id: U256,
    pub address: Address,
    pub nonce: U256,
    pub y_parity: U256,
    pub r: U256,
    pub s: U256,
}

/// Unpacked user operation as accepted by `eth_sendUserOperation` for EntryPoint v0.8
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub factory: String,
    pub factory_data: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: U256,
    pub verification_gas_limit: U256,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub paymaster: Address,
    pub paymaster_verification_gas_limit: U256,
    pub paymaster_post_op_gas_limit: U256,
    pub paymaster_data: Bytes,
    pub signature: Bytes,

    #[serde(rename = "eip7702Auth")]
    pub eip7702_auth: RpcAuthorization,
}

impl From<&UserOperation> for RpcUserOperation {
    fn from(operation: &UserOperation) -> Self {
        let authorization = &operation.authorization;

        Self {
            sender: operation.sender,
            nonce: operation.nonce,
            factory: EIP7702_FACTORY.to_string(),
            factory_data: Bytes::new(),
            call_data: operation.call_data.clone(),
            call_gas_limit: U256::from(operation.gas.call_gas_limit),
            verification_gas_limit: U256::from(operation.gas.verification_gas_limit),
            pre_verification_gas: U256::from(operation.gas.pre_verification_gas),
            max_fee_per_gas: U256::from(operation.fees.max_fee_per_gas),
            max_priority_fee_per_gas: U256::from(operation.fees.max_priority_fee_per_gas),
            paymaster: operation.paymaster.paymaster,
            paymaster_verification_gas_limit: U256::from(operation.paymaster.verification_gas_limit),
            paymaster_post_op_gas_limit: U256::from(operation.paymaster.post_op_gas_limit),
            paymaster_data: operation.paymaster.data.clone(),
            signature: operation.signature.clone(),
            eip7702_auth: RpcAuthorization {
                chain_id: authorization.chain_id,
                address: authorization.address,
                nonce: U256::from(authorization.nonce),
                y_parity: U256::from(authorization.y_parity()),
                r: authorization.r(),
                s: authorization.s(),
            },
        }
    }
}

fn to_u128(value: U256, field: &str) -> Result<u128, Error> {
    u128::try_from(value).map_err(|_| Error::InvalidResponse(format!("{} overflows", field)))
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcGasPrice {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Answer of `pimlico_getUserOperationGasPrice`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RpcGasPriceTiers {
    pub slow: Option<RpcGasPrice>,
    pub standard: RpcGasPrice,
    pub fast: Option<RpcGasPrice>,
}

impl TryFrom<RpcGasPriceTiers> for GasFees {
    type Error = Error;

    fn try_from(value: RpcGasPriceTiers) -> Result<Self, Self::Error> {
        let fees = GasFees {
            max_fee_per_gas: to_u128(value.standard.max_fee_per_gas, "maxFeePerGas")?,
            max_priority_fee_per_gas: to_u128(value.standard.max_priority_fee_per_gas, "maxPriorityFeePerGas")?,
        };

        if fees.max_fee_per_gas == 0 {
            return Err(Error::InvalidResponse("standard tier suggests a zero max fee".to_string()));
        }

        if fees.max_priority_fee_per_gas > fees.max_fee_per_gas {
            return Err(Error::InvalidResponse("standard tier priority fee exceeds its max fee".to_string()));
        }

        Ok(fees)
    }
}

/// Answer of `eth_estimateUserOperationGas`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcGasEstimate {
    pub pre_verification_gas: U256,
    pub verification_gas_limit: U256,
    pub call_gas_limit: U256,

    #[serde(default)]
    pub paymaster_verification_gas_limit: Option<U256>,

    #[serde(default)]
    pub paymaster_post_op_gas_limit: Option<U256>,
}

impl TryFrom<RpcGasEstimate> for GasLimits {
    type Error = Error;

    fn try_from(value: RpcGasEstimate) -> Result<Self, Self::Error> {
        Ok(GasLimits {
            call_gas_limit: to_u128(value.call_gas_limit, "callGasLimit")?,
            verification_gas_limit: to_u128(value.verification_gas_limit, "verificationGasLimit")?,
            pre_verification_gas: to_u128(value.pre_verification_gas, "preVerificationGas")?,
        })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
}

/// Answer of `eth_getUserOperationReceipt` once the operation is included
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationReceipt {
    pub user_op_hash: B256,
    pub success: bool,

    #[serde(default)]
    pub reason: Option<String>,

    pub receipt: TransactionReceipt,
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Bytes, U256};
    use gasless_evm::account::SmartAccount;
    use gasless_evm::constants::Contract;
    use gasless_evm::operation::{GasFees, PaymasterFields, UserOperation};
    use gasless_evm::signature::authorization::sign_authorization;
    use gasless_evm::testing::TestAccount;
    use gasless_evm::ChainID;
    use serde_json::json;

    use crate::types::{RpcGasPriceTiers, RpcUserOperation};
    use crate::Error;

    #[test]
    fn operation_is_serialized_with_the_7702_factory() {
        let account = SmartAccount::new(&TestAccount::DONOR.configuration(), ChainID::ArbitrumSepolia).unwrap();
        let operation = UserOperation::new(
            account.address(),
            U256::from(1),
            Bytes::from_static(&[0x01]),
            GasFees {
                max_fee_per_gas: 100,
                max_priority_fee_per_gas: 10,
            },
            PaymasterFields {
                paymaster: Contract::PAYMASTER_V08_ARBITRUM_SEPOLIA,
                verification_gas_limit: 0x200000,
                post_op_gas_limit: 0x15000,
                data: Bytes::from_static(&[0x00]),
            },
            sign_authorization(&account, 7).unwrap(),
        );

        let value = serde_json::to_value(RpcUserOperation::from(&operation)).unwrap();

        assert_eq!(value["factory"], json!("0x7702"));
        assert_eq!(value["factoryData"], json!("0x"));
        assert_eq!(value["nonce"], json!("0x1"));
        assert_eq!(value["maxFeePerGas"], json!("0x64"));
        assert_eq!(value["paymasterVerificationGasLimit"], json!("0x200000"));
        assert_eq!(value["paymasterPostOpGasLimit"], json!("0x15000"));
        assert_eq!(value["eip7702Auth"]["chainId"], json!("0x66eee"));
        assert_eq!(value["eip7702Auth"]["nonce"], json!("0x7"));
        assert_eq!(value["eip7702Auth"]["address"], json!(Contract::SIMPLE_7702_ACCOUNT));
    }

    #[test]
    fn standard_tier_is_selected() {
        let tiers: RpcGasPriceTiers = serde_json::from_value(json!({
            "slow": { "maxFeePerGas": "0x1", "maxPriorityFeePerGas": "0x1" },
            "standard": { "maxFeePerGas": "0x2faf080", "maxPriorityFeePerGas": "0x0" },
            "fast": { "maxFeePerGas": "0x3", "maxPriorityFeePerGas": "0x3" }
        }))
        .unwrap();

        let fees = GasFees::try_from(tiers).unwrap();
        assert_eq!(fees.max_fee_per_gas, 50_000_000);
        assert_eq!(fees.max_priority_fee_per_gas, 0);
    }

    #[test]
    fn zero_fee_suggestion_is_refused() {
        let tiers: RpcGasPriceTiers = serde_json::from_value(json!({
            "standard": { "maxFeePerGas": "0x0", "maxPriorityFeePerGas": "0x0" }
        }))
        .unwrap();

        assert!(matches!(GasFees::try_from(tiers), Err(Error::InvalidResponse(_))));
    }

    #[test]
    fn missing_standard_tier_does_not_parse() {
        let result = serde_json::from_value::<RpcGasPriceTiers>(json!({ "fast": { "maxFeePerGas": "0x1", "maxPriorityFeePerGas": "0x1" } }));

        assert!(result.is_err());
    }
}
