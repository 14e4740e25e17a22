use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy::rpc::client::{ClientBuilder, RpcClient};
use alloy::transports::http::reqwest::{Client as HttpClient, Url};
use alloy::transports::http::Http;
use gasless_evm::constants::Bundler;
use gasless_evm::operation::{GasFees, GasLimits, UserOperation};
use gasless_evm::ChainID;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::types::{RpcGasEstimate, RpcGasPriceTiers, RpcUserOperation, UserOperationReceipt};
use crate::Error;

/// Pimlico bundler. The endpoint defaults to the public bundler of the chain.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PimlicoConfiguration {
    #[serde(default)]
    pub endpoint: Option<String>,

    pub timeout: u64,
}

#[derive(Clone)]
pub struct PimlicoClient(RpcClient);

impl PimlicoClient {
    pub fn new(configuration: &PimlicoConfiguration, chain_id: &ChainID) -> Result<Self, Error> {
        let endpoint = configuration.endpoint.clone().unwrap_or_else(|| Bundler::endpoint(chain_id));
        let url = Url::parse(&endpoint).map_err(|e| Error::Internal(format!("invalid endpoint {}: {}", endpoint, e)))?;

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(configuration.timeout))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self(ClientBuilder::default().transport(Http::with_client(http, url), false)))
    }

    #[instrument(name = "pimlico_getUserOperationGasPrice", skip(self))]
    pub async fn fetch_gas_price(&self) -> Result<GasFees, Error> {
        let tiers: RpcGasPriceTiers = self.0.request_noparams("pimlico_getUserOperationGasPrice").await?;

        GasFees::try_from(tiers)
    }

    #[instrument(name = "eth_estimateUserOperationGas", skip(self, operation), fields(sender = %operation.sender))]
    pub async fn estimate_user_operation_gas(&self, operation: &UserOperation, entry_point: Address) -> Result<GasLimits, Error> {
        let estimate: RpcGasEstimate = self
            .0
            .request("eth_estimateUserOperationGas", (RpcUserOperation::from(operation), entry_point))
            .await?;

        GasLimits::try_from(estimate)
    }

    #[instrument(name = "eth_sendUserOperation", skip(self, operation), fields(sender = %operation.sender))]
    pub async fn send_user_operation(&self, operation: &UserOperation, entry_point: Address) -> Result<B256, Error> {
        Ok(self
            .0
            .request("eth_sendUserOperation", (RpcUserOperation::from(operation), entry_point))
            .await?)
    }

    #[instrument(name = "eth_getUserOperationReceipt", skip(self))]
    pub async fn fetch_user_operation_receipt(&self, hash: B256) -> Result<Option<UserOperationReceipt>, Error> {
        Ok(self.0.request("eth_getUserOperationReceipt", (hash,)).await?)
    }
}
