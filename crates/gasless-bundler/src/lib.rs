#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;

use alloy::primitives::{Address, B256};
use alloy::transports::{RpcError, TransportError};
use gasless_common::{log_if_error, measure_duration, metric};
use gasless_evm::operation::{GasFees, GasLimits, UserOperation};
use gasless_evm::ChainID;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

mod pimlico;
pub use pimlico::{PimlicoClient, PimlicoConfiguration};

pub mod types;
pub use types::UserOperationReceipt;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Bundler error codes defined by ERC-7769
pub struct ErrorCode;

impl ErrorCode {
    pub const REJECTED_BY_VALIDATION: i64 = -32500;
    pub const REJECTED_BY_PAYMASTER: i64 = -32501;
    pub const EXECUTION_REVERTED: i64 = -32521;
    pub const INVALID_PARAMS: i64 = -32602;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("bundler unavailable {0}")]
    Unavailable(String),

    #[error("bundler rejected the request (code {code}) {message}")]
    Rejected { code: i64, message: String },

    #[error("invalid bundler response {0}")]
    InvalidResponse(String),

    #[error("internal error {0}")]
    Internal(String),
}

impl Error {
    /// Rejection caused by an account or authorization nonce that has already been used
    pub fn is_stale_nonce(&self) -> bool {
        match self {
            Self::Rejected { message, .. } => {
                let message = message.to_lowercase();
                message.contains("aa25") || message.contains("nonce too low") || message.contains("invalid account nonce") || message.contains("authorization nonce")
            },
            _ => false,
        }
    }

    /// Rejection caused by the calls of the operation reverting during simulation
    pub fn is_execution_reverted(&self) -> bool {
        matches!(self, Self::Rejected { code, .. } if *code == ErrorCode::EXECUTION_REVERTED)
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        match value {
            RpcError::ErrorResp(payload) => Error::Rejected {
                code: payload.code,
                message: payload.message.to_string(),
            },
            RpcError::NullResp => Error::InvalidResponse("null response".to_string()),
            RpcError::DeserError { err, text } => Error::InvalidResponse(format!("{} in {}", err, text)),
            RpcError::Transport(e) => Error::Unavailable(e.to_string()),
            e => Error::Internal(e.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Configuration {
    #[cfg(any(test, feature = "testing"))]
    #[serde(skip)]
    Mock(Arc<dyn testing::MockBundlerClient>),

    Pimlico(PimlicoConfiguration),
}

#[cfg(any(test, feature = "testing"))]
impl Configuration {
    pub fn mock<T: testing::MockBundlerClient>() -> Self {
        Self::Mock(Arc::new(T::new()))
    }
}

/// Relay network accepting user operations
#[derive(Clone)]
pub enum Client {
    #[cfg(any(test, feature = "testing"))]
    Mock(Arc<dyn testing::MockBundlerClient>),

    Pimlico(PimlicoClient),
}

impl Client {
    pub fn new(configuration: &Configuration, chain_id: &ChainID) -> Result<Self, Error> {
        Ok(match configuration {
            #[cfg(any(test, feature = "testing"))]
            Configuration::Mock(client) => Self::Mock(client.clone()),

            Configuration::Pimlico(configuration) => Self::Pimlico(PimlicoClient::new(configuration, chain_id)?),
        })
    }

    /// Fee suggestion of the standard tier
    #[instrument(name = "fetch_gas_price", skip(self))]
    pub async fn fetch_gas_price(&self) -> Result<GasFees, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(any(test, feature = "testing"))]
            Self::Mock(client) => client.fetch_gas_price().await,

            Self::Pimlico(client) => client.fetch_gas_price().await,
        }));

        metric!(counter[bundler_request] = 1, method = "fetch_gas_price");
        metric!(histogram[bundler_request_duration_milliseconds] = duration.as_millis(), method = "fetch_gas_price");
        metric!(on error result => counter [ bundler_request_error ] = 1, method = "fetch_gas_price");
        result
    }

    #[instrument(name = "estimate_user_operation_gas", skip(self, operation))]
    pub async fn estimate_user_operation_gas(&self, operation: &UserOperation, entry_point: Address) -> Result<GasLimits, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(any(test, feature = "testing"))]
            Self::Mock(client) => client.estimate_user_operation_gas(operation, entry_point).await,

            Self::Pimlico(client) => client.estimate_user_operation_gas(operation, entry_point).await,
        }));

        metric!(counter[bundler_request] = 1, method = "estimate_user_operation_gas");
        metric!(histogram[bundler_request_duration_milliseconds] = duration.as_millis(), method = "estimate_user_operation_gas");
        metric!(on error result => counter [ bundler_request_error ] = 1, method = "estimate_user_operation_gas");
        result
    }

    /// Submit the operation and return its hash
    #[instrument(name = "send_user_operation", skip(self, operation))]
    pub async fn send_user_operation(&self, operation: &UserOperation, entry_point: Address) -> Result<B256, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(any(test, feature = "testing"))]
            Self::Mock(client) => client.send_user_operation(operation, entry_point).await,

            Self::Pimlico(client) => client.send_user_operation(operation, entry_point).await,
        }));

        metric!(counter[bundler_request] = 1, method = "send_user_operation");
        metric!(histogram[bundler_request_duration_milliseconds] = duration.as_millis(), method = "send_user_operation");
        metric!(on error result => counter [ bundler_request_error ] = 1, method = "send_user_operation");
        result
    }

    /// Receipt of the operation, `None` while it is still pending
    #[instrument(name = "fetch_user_operation_receipt", skip(self))]
    pub async fn fetch_user_operation_receipt(&self, hash: B256) -> Result<Option<UserOperationReceipt>, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match self {
            #[cfg(any(test, feature = "testing"))]
            Self::Mock(client) => client.fetch_user_operation_receipt(hash).await,

            Self::Pimlico(client) => client.fetch_user_operation_receipt(hash).await,
        }));

        metric!(histogram[bundler_request_duration_milliseconds] = duration.as_millis(), method = "fetch_user_operation_receipt");
        metric!(on error result => counter [ bundler_request_error ] = 1, method = "fetch_user_operation_receipt");
        result
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{b256, Bytes, U256};
    use gasless_evm::account::SmartAccount;
    use gasless_evm::constants::Contract;
    use gasless_evm::operation::{GasFees, PaymasterFields, UserOperation};
    use gasless_evm::signature::authorization::sign_authorization;
    use gasless_evm::testing::{JsonRpcResponder, TestAccount};
    use gasless_evm::ChainID;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer};

    use crate::{Client, Configuration, Error, PimlicoConfiguration};

    fn client(server: &MockServer) -> Client {
        let configuration = Configuration::Pimlico(PimlicoConfiguration {
            endpoint: Some(server.uri()),
            timeout: 5,
        });

        Client::new(&configuration, &ChainID::ArbitrumSepolia).unwrap()
    }

    fn operation() -> UserOperation {
        let account = SmartAccount::new(&TestAccount::DONOR.configuration(), ChainID::ArbitrumSepolia).unwrap();

        UserOperation::new(
            account.address(),
            U256::ZERO,
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
            sign_authorization(&account, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn gas_price_is_read_from_the_standard_tier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "pimlico_getUserOperationGasPrice" })))
            .respond_with(JsonRpcResponder::result(json!({
                "slow": { "maxFeePerGas": "0x5f5e100", "maxPriorityFeePerGas": "0x1" },
                "standard": { "maxFeePerGas": "0x6acfc00", "maxPriorityFeePerGas": "0x2" },
                "fast": { "maxFeePerGas": "0x7735940", "maxPriorityFeePerGas": "0x3" }
            })))
            .mount(&server)
            .await;

        let fees = client(&server).fetch_gas_price().await.unwrap();

        assert_eq!(fees.max_fee_per_gas, 112_000_000);
        assert_eq!(fees.max_priority_fee_per_gas, 2);
    }

    #[tokio::test]
    async fn malformed_gas_price_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(JsonRpcResponder::result(json!({ "standard": "0x1" })))
            .mount(&server)
            .await;

        let result = client(&server).fetch_gas_price().await;

        assert!(matches!(result, Err(Error::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn estimation_returns_gas_limits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_estimateUserOperationGas" })))
            .respond_with(JsonRpcResponder::result(json!({
                "preVerificationGas": "0xc350",
                "verificationGasLimit": "0x186a0",
                "callGasLimit": "0x7530",
                "paymasterVerificationGasLimit": "0x200000",
                "paymasterPostOpGasLimit": "0x15000"
            })))
            .mount(&server)
            .await;

        let limits = client(&server).estimate_user_operation_gas(&operation(), Contract::ENTRY_POINT_V08).await.unwrap();

        assert_eq!(limits.pre_verification_gas, 50_000);
        assert_eq!(limits.verification_gas_limit, 100_000);
        assert_eq!(limits.call_gas_limit, 30_000);
    }

    #[tokio::test]
    async fn operation_is_sent_to_the_entry_point() {
        let hash = b256!("1111111111111111111111111111111111111111111111111111111111111111");

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "eth_sendUserOperation",
                "params": [{ "factory": "0x7702", "paymasterPostOpGasLimit": "0x15000" }, Contract::ENTRY_POINT_V08]
            })))
            .respond_with(JsonRpcResponder::result(json!(hash)))
            .mount(&server)
            .await;

        let result = client(&server).send_user_operation(&operation(), Contract::ENTRY_POINT_V08).await.unwrap();

        assert_eq!(result, hash);
    }

    #[tokio::test]
    async fn stale_nonce_rejection_is_recognized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(JsonRpcResponder::error(-32500, "AA25 invalid account nonce"))
            .mount(&server)
            .await;

        let error = client(&server).send_user_operation(&operation(), Contract::ENTRY_POINT_V08).await.unwrap_err();

        assert!(error.is_stale_nonce());
        assert!(!error.is_execution_reverted());
    }

    #[tokio::test]
    async fn pending_receipt_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_getUserOperationReceipt" })))
            .respond_with(JsonRpcResponder::result(json!(null)))
            .mount(&server)
            .await;

        let receipt = client(&server)
            .fetch_user_operation_receipt(b256!("2222222222222222222222222222222222222222222222222222222222222222"))
            .await
            .unwrap();

        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn included_receipt_exposes_the_transaction_hash() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(JsonRpcResponder::result(json!({
                "userOpHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
                "success": true,
                "reason": "",
                "receipt": { "transactionHash": "0xdead00000000000000000000000000000000000000000000000000000000beef", "blockNumber": "0x10" }
            })))
            .mount(&server)
            .await;

        let receipt = client(&server)
            .fetch_user_operation_receipt(b256!("2222222222222222222222222222222222222222222222222222222222222222"))
            .await
            .unwrap()
            .unwrap();

        assert!(receipt.success);
        assert_eq!(receipt.receipt.transaction_hash, b256!("dead00000000000000000000000000000000000000000000000000000000beef"));
    }
}
