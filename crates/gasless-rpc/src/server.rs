use async_trait::async_trait;
use gasless_common::service::Error as ServiceError;
use gasless_common::{measure_duration, metric};
use gasless_execution::ErrorClass;
use jsonrpsee::server::middleware::http::ProxyGetRequestLayer;
use jsonrpsee::server::{RpcServiceBuilder, ServerBuilder, ServerHandle};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info, instrument, warn};

use crate::context::Context;
use crate::endpoint::badge::{mark_completed_endpoint, mint_endpoint, redeem_endpoint};
use crate::endpoint::contract::get_contract_info_endpoint;
use crate::endpoint::donate::donate_endpoint;
use crate::endpoint::health::health_endpoint;
use crate::middleware::PayloadFormatter;
use crate::{
    Configuration, ContractInfoResponse, DonateRequest, Error, ExecuteResponse, GaslessAPIServer, MarkCompletedRequest, MintRequest, RedeemRequest,
};

macro_rules! log_if_error {
    ($e: expr) => {{
        let result = $e;
        match &result {
            Err(e) if e.class() == ErrorClass::Configuration => error!(message = %e),
            Err(e) => warn!(message = %e),
            _ => (),
        };

        result
    }};
}

macro_rules! instrument_method {
    ($method: ident ($($arg: expr),*)) => {{
        metric!(counter [ rpc_request ] = 1, method = stringify!($method));

        let (result, time) = measure_duration!(log_if_error!($method($($arg),*).await));
        metric!(histogram [ rpc_request_duration_milliseconds ] = time.as_millis(), method = stringify!($method));
        metric!(on error result => counter [ rpc_request_error ] = 1, method = stringify!($method));

        result
    }};
}

pub struct GaslessServer {
    context: Context,
}

impl GaslessServer {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        Ok(Self {
            context: Context::new(configuration.clone())?,
        })
    }

    pub async fn start(self) -> Result<ServerHandle, ServiceError> {
        let url = format!("0.0.0.0:{}", self.context.configuration.rpc.port);
        info!("Starting RPC server at {}", url);

        let health = ProxyGetRequestLayer::new("/health", "gasless_health").map_err(ServiceError::from)?;
        let http_middleware = ServiceBuilder::new().layer(CorsLayer::permissive()).layer(health);

        let rpc_middleware = RpcServiceBuilder::new().layer_fn(PayloadFormatter::new);

        let server = ServerBuilder::default()
            .max_connections(1024)
            .http_only()
            .set_http_middleware(http_middleware)
            .set_rpc_middleware(rpc_middleware)
            .build(url)
            .await
            .map_err(ServiceError::from)?;

        Ok(server.start(self.into_rpc()))
    }
}

#[async_trait]
impl GaslessAPIServer for GaslessServer {
    #[instrument(name = "gasless_health", skip(self))]
    async fn health(&self) -> Result<bool, Error> {
        instrument_method!(health_endpoint(&self.context))
    }

    #[instrument(name = "gasless_getContractInfo", skip(self))]
    async fn get_contract_info(&self) -> Result<ContractInfoResponse, Error> {
        instrument_method!(get_contract_info_endpoint(&self.context))
    }

    #[instrument(name = "gasless_donate", skip(self), fields(amount = %params.amount))]
    async fn donate(&self, params: DonateRequest) -> Result<ExecuteResponse, Error> {
        instrument_method!(donate_endpoint(&self.context, params))
    }

    #[instrument(name = "gasless_mint", skip(self, params), fields(params = %serde_json::to_string(&params).unwrap_or_else(|_| "INVALID_JSON".into())))]
    async fn mint(&self, params: MintRequest) -> Result<ExecuteResponse, Error> {
        instrument_method!(mint_endpoint(&self.context, params))
    }

    #[instrument(name = "gasless_markCompleted", skip(self, params), fields(params = %serde_json::to_string(&params).unwrap_or_else(|_| "INVALID_JSON".into())))]
    async fn mark_completed(&self, params: MarkCompletedRequest) -> Result<ExecuteResponse, Error> {
        instrument_method!(mark_completed_endpoint(&self.context, params))
    }

    // the private key shape must never reach the logs
    #[instrument(name = "gasless_redeem", skip(self, params))]
    async fn redeem(&self, params: RedeemRequest) -> Result<ExecuteResponse, Error> {
        instrument_method!(redeem_endpoint(&self.context, params))
    }
}
