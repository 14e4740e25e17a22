#[cfg(any(test, feature = "testing"))]
use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use alloy::transports::{RpcError, TransportError};
use gasless_common::service::failover;
use gasless_common::{measure_duration, metric};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

pub mod account;
pub mod constants;
pub mod contract;
pub mod math;
pub mod operation;
pub mod signature;

mod network;
pub use network::ChainID;
pub use tracing;

mod client;
pub use client::EvmClient;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use crate::account::{EvmAccountConfiguration, SmartAccount};
use crate::contract::{IEntryPoint, IERC20Permit};
use crate::signature::permit::TokenDomain;

/// Log chain errors, reverted calls are business errors and only deserve a warning
#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {
        match $e {
            Ok(v) => Ok(v),
            Err($crate::Error::Contract(error)) => {
                $crate::tracing::warn!(message = %error);
                Err($crate::Error::Contract(error))
            },
            Err(error) => {
                $crate::tracing::error!(message = %error);
                Err(error)
            },
        }
    };
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("rpc unavailable {0}")]
    RpcUnavailable(String),

    #[error("rpc error {0}")]
    Rpc(String),

    #[error("contract error {0}")]
    Contract(String),

    #[error("invalid response {0}")]
    InvalidResponse(String),

    #[error("invalid key {0}")]
    InvalidKey(String),

    #[error("signing error {0}")]
    Signing(String),

    #[error("invalid amount {0}")]
    InvalidAmount(String),

    #[error("invalid chain id {0}")]
    InvalidChainID(String),

    #[error("internal error {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error comes from the transport rather than from the node answering
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RpcUnavailable(_))
    }
}

impl From<TransportError> for Error {
    fn from(value: TransportError) -> Self {
        match value {
            RpcError::ErrorResp(payload) if payload.code == 3 || payload.message.contains("revert") => Error::Contract(payload.message.to_string()),
            RpcError::ErrorResp(payload) => Error::Rpc(format!("{} (code {})", payload.message, payload.code)),
            RpcError::NullResp => Error::InvalidResponse("null response".to_string()),
            RpcError::DeserError { err, text } => Error::InvalidResponse(format!("{} in {}", err, text)),
            RpcError::Transport(e) => Error::RpcUnavailable(e.to_string()),
            e => Error::Internal(e.to_string()),
        }
    }
}

impl From<failover::Error<TransportError>> for Error {
    fn from(value: failover::Error<TransportError>) -> Self {
        match value {
            failover::Error::Rejected => Self::RpcUnavailable("could not connect to endpoint".to_string()),
            failover::Error::Inner(e) => e.into(),
        }
    }
}

impl From<alloy::sol_types::Error> for Error {
    fn from(value: alloy::sol_types::Error) -> Self {
        Self::InvalidResponse(value.to_string())
    }
}

impl From<alloy::signers::Error> for Error {
    fn from(value: alloy::signers::Error) -> Self {
        Self::Signing(value.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RpcConfiguration {
    pub chain_id: ChainID,
    pub endpoint: String,
    pub timeout: u64,

    #[serde(default)]
    pub fallbacks: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Configuration {
    #[cfg(any(test, feature = "testing"))]
    #[serde(skip)]
    Mock(Arc<dyn testing::MockChainClient>),

    Rpc(RpcConfiguration),
}

#[cfg(any(test, feature = "testing"))]
impl Configuration {
    pub fn mock<T: testing::MockChainClient>() -> Self {
        Self::Mock(Arc::new(T::new()))
    }
}

impl Configuration {
    pub fn chain_id(&self) -> ChainID {
        match self {
            #[cfg(any(test, feature = "testing"))]
            Self::Mock(client) => client.chain_id(),

            Self::Rpc(configuration) => configuration.chain_id,
        }
    }
}

#[derive(Clone)]
enum Backend {
    #[cfg(any(test, feature = "testing"))]
    Mock(Arc<dyn testing::MockChainClient>),

    Rpc(EvmClient),
}

/// Read-only access to the chain. Balances and nonces are always read fresh, only the token permit
/// domains (name and version) are cached since they never change for a deployed token.
#[derive(Clone)]
pub struct Client {
    chain_id: ChainID,

    backend: Backend,
    domains: Cache<Address, TokenDomain>,
}

impl Client {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        let backend = match configuration {
            #[cfg(any(test, feature = "testing"))]
            Configuration::Mock(client) => Backend::Mock(client.clone()),

            Configuration::Rpc(configuration) => {
                let mut client = EvmClient::new(&configuration.endpoint, configuration.timeout)?;
                for fallback in &configuration.fallbacks {
                    client = client.with_fallback(fallback, configuration.timeout)?;
                }

                Backend::Rpc(client)
            },
        };

        Ok(Self {
            chain_id: configuration.chain_id(),
            backend,
            domains: Cache::builder()
                .max_capacity(64)
                .time_to_live(Duration::from_secs(3600))
                .build(),
        })
    }

    /// Returns the chain_id on which this client is bound
    pub fn chain_id(&self) -> &ChainID {
        &self.chain_id
    }

    /// Initialize the 7702 smart account owned by the given key
    pub fn initialize_account(&self, account: &EvmAccountConfiguration) -> Result<SmartAccount, Error> {
        SmartAccount::new(account, self.chain_id)
    }

    /// Fetch the chain id reported by the node
    #[instrument(name = "fetch_chain_id", skip(self))]
    pub async fn fetch_chain_id(&self) -> Result<u64, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_chain_id().await,

            Backend::Rpc(client) => client.chain_id().await.map_err(Error::from),
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_chain_id");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_chain_id");
        result
    }

    /// Call `balanceOf(owner)` on the given `token`
    #[instrument(name = "fetch_token_balance", skip(self))]
    pub async fn fetch_token_balance(&self, token: Address, owner: Address) -> Result<U256, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_token_balance(token, owner).await,

            Backend::Rpc(client) => Self::call(client, token, IERC20Permit::balanceOfCall { owner }).await,
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_token_balance");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_token_balance");
        result
    }

    /// Fetch the number of transactions sent by `address`, which is the nonce expected by the next
    /// delegation authorization of that key.
    #[instrument(name = "fetch_transaction_count", skip(self))]
    pub async fn fetch_transaction_count(&self, address: Address) -> Result<u64, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_transaction_count(address).await,

            Backend::Rpc(client) => client.get_transaction_count(address).await.map_err(Error::from),
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_transaction_count");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_transaction_count");
        result
    }

    /// Call `nonces(owner)` on the given permit-enabled `token`
    #[instrument(name = "fetch_permit_nonce", skip(self))]
    pub async fn fetch_permit_nonce(&self, token: Address, owner: Address) -> Result<U256, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_permit_nonce(token, owner).await,

            Backend::Rpc(client) => Self::call(client, token, IERC20Permit::noncesCall { owner }).await,
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_permit_nonce");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_permit_nonce");
        result
    }

    /// Fetch the name and version used by the token in its EIP-712 domain
    #[instrument(name = "fetch_token_domain", skip(self))]
    pub async fn fetch_token_domain(&self, token: Address) -> Result<TokenDomain, Error> {
        if let Some(domain) = self.domains.get(&token).await {
            return Ok(domain);
        }

        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_token_domain(token).await,

            Backend::Rpc(client) => {
                let (name, version) = futures::try_join!(
                    Self::call(client, token, IERC20Permit::nameCall {}),
                    Self::call(client, token, IERC20Permit::versionCall {})
                )?;

                Ok(TokenDomain { name, version })
            },
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_token_domain");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_token_domain");

        let domain = result?;
        self.domains.insert(token, domain.clone()).await;

        Ok(domain)
    }

    /// Call `getNonce(sender, 0)` on the entry point
    #[instrument(name = "fetch_account_nonce", skip(self))]
    pub async fn fetch_account_nonce(&self, entry_point: Address, sender: Address) -> Result<U256, Error> {
        let (result, duration) = measure_duration!(log_if_error!(match &self.backend {
            #[cfg(any(test, feature = "testing"))]
            Backend::Mock(client) => client.fetch_account_nonce(entry_point, sender).await,

            Backend::Rpc(client) => {
                let call = IEntryPoint::getNonceCall {
                    sender,
                    key: Default::default(),
                };

                Self::call(client, entry_point, call).await
            },
        }));

        metric!(histogram[evm_rpc] = duration.as_millis(), method = "fetch_account_nonce");
        metric!(on error result => counter [ evm_rpc_error ] = 1, method = "fetch_account_nonce");
        result
    }

    async fn call<C: SolCall>(client: &EvmClient, to: Address, call: C) -> Result<C::Return, Error> {
        let request = TransactionRequest::default().with_to(to).with_input(call.abi_encode());
        let output = client.call(request).await?;

        Ok(C::abi_decode_returns(&output)?)
    }
}
