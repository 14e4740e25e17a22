use std::ops::Deref;
use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::ClientBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::{Client as HttpClient, Url};
use alloy::transports::http::Http;
use alloy::transports::{RpcError, TransportError, TransportErrorKind, TransportResult};
use gasless_common::service::failover::{Error, Failover, FailurePredicate};
use tracing::instrument;

use crate::Error as EvmError;

macro_rules! call_with_failover {
    ($self: ident, |$client: ident| $call: expr) => {
        $self
            .0
            .call(|$client| async move { $call.await })
            .await
            .map_err(|e| match e {
                Error::Inner(e) => e,
                Error::Rejected => {
                    tracing::warn!("every endpoint is unavailable");
                    TransportErrorKind::custom_str("every endpoint is unavailable")
                },
            })
    };
}

struct EvmRpcClient(DynProvider);

impl EvmRpcClient {
    fn new(endpoint: &str, timeout: u64) -> Result<Self, EvmError> {
        let url = Url::parse(endpoint).map_err(|e| EvmError::Internal(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| EvmError::Internal(e.to_string()))?;

        let client = ClientBuilder::default().transport(Http::with_client(http, url), false);
        Ok(Self(ProviderBuilder::new().connect_client(client).erased()))
    }
}

impl Deref for EvmRpcClient {
    type Target = DynProvider;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FailurePredicate<TransportError> for EvmRpcClient {
    fn is_err(&self, err: &TransportError) -> bool {
        matches!(err, RpcError::Transport(_) | RpcError::NullResp)
    }
}

/// JSON-RPC client over a primary endpoint and its fallbacks. Only transport failures count against
/// an endpoint, a node answering with an error is not a reason to switch.
#[derive(Clone)]
pub struct EvmClient(Failover<EvmRpcClient>);

impl EvmClient {
    pub fn new(endpoint: &str, timeout: u64) -> Result<Self, EvmError> {
        Ok(Self(Failover::new().with(EvmRpcClient::new(endpoint, timeout)?)))
    }

    pub fn with_fallback(mut self, endpoint: &str, timeout: u64) -> Result<Self, EvmError> {
        self.0 = self.0.with(EvmRpcClient::new(endpoint, timeout)?);
        Ok(self)
    }

    #[instrument(name = "eth_chainId", skip(self))]
    pub async fn chain_id(&self) -> TransportResult<u64> {
        call_with_failover!(self, |client| client.get_chain_id())
    }

    #[instrument(name = "eth_getTransactionCount", skip(self))]
    pub async fn get_transaction_count(&self, address: Address) -> TransportResult<u64> {
        call_with_failover!(self, |client| client.get_transaction_count(address))
    }

    #[instrument(name = "eth_call", skip(self, request), fields(to = ?request.to))]
    pub async fn call(&self, request: TransactionRequest) -> TransportResult<Bytes> {
        call_with_failover!(self, |client| client.call(request))
    }
}
