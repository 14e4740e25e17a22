use jsonrpsee::http_client::HttpClient;

use crate::{ContractInfoResponse, DonateRequest, ExecuteResponse, GaslessAPIClient, MarkCompletedRequest, MintRequest, RedeemRequest};

pub type Error = jsonrpsee::core::ClientError;

pub struct Client {
    inner: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        Ok(Self {
            inner: HttpClient::builder().build(endpoint)?,
        })
    }

    pub async fn health(&self) -> Result<bool, Error> {
        self.inner.health().await
    }

    pub async fn get_contract_info(&self) -> Result<ContractInfoResponse, Error> {
        self.inner.get_contract_info().await
    }

    pub async fn donate(&self, params: DonateRequest) -> Result<ExecuteResponse, Error> {
        self.inner.donate(params).await
    }

    pub async fn mint(&self, params: MintRequest) -> Result<ExecuteResponse, Error> {
        self.inner.mint(params).await
    }

    pub async fn mark_completed(&self, params: MarkCompletedRequest) -> Result<ExecuteResponse, Error> {
        self.inner.mark_completed(params).await
    }

    pub async fn redeem(&self, params: RedeemRequest) -> Result<ExecuteResponse, Error> {
        self.inner.redeem(params).await
    }
}
