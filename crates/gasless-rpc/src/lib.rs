use gasless_execution::{ErrorClass, ErrorKind};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObject;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod context;
pub use context::{Configuration, RPCConfiguration};

mod endpoint;
pub use endpoint::badge::{HolderRedeemRequest, MarkCompletedRequest, MintRequest, PrivateKeyRedeemRequest, RedeemRequest};
pub use endpoint::common::ExecuteResponse;
pub use endpoint::contract::ContractInfoResponse;
pub use endpoint::donate::DonateRequest;

mod middleware;

#[cfg(test)]
mod testing;

pub mod client;
pub mod server;

#[rpc(server, client)]
pub trait GaslessAPI {
    #[method(name = "gasless_health")]
    async fn health(&self) -> Result<bool, Error>;

    #[method(name = "gasless_getContractInfo")]
    async fn get_contract_info(&self) -> Result<ContractInfoResponse, Error>;

    #[method(name = "gasless_donate")]
    async fn donate(&self, params: DonateRequest) -> Result<ExecuteResponse, Error>;

    #[method(name = "gasless_mint")]
    async fn mint(&self, params: MintRequest) -> Result<ExecuteResponse, Error>;

    #[method(name = "gasless_markCompleted")]
    async fn mark_completed(&self, params: MarkCompletedRequest) -> Result<ExecuteResponse, Error>;

    #[method(name = "gasless_redeem")]
    async fn redeem(&self, params: RedeemRequest) -> Result<ExecuteResponse, Error>;
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameters {0}")]
    InvalidParameters(String),

    #[error("unsupported request {0}")]
    Unsupported(String),

    #[error(transparent)]
    Execution(#[from] gasless_execution::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameters(_) | Self::Unsupported(_) => ErrorKind::InvalidInput,
            Self::Execution(e) => e.kind(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidParameters(_) | Self::Unsupported(_) => ErrorClass::Client,
            Self::Execution(e) => e.class(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Execution(e) if e.is_retryable())
    }
}

/// Stable wire code and name of every error kind. Codes 150 to 159 are client errors, 160 to 169
/// transient ones and 170 onwards configuration errors.
fn wire_code(kind: ErrorKind) -> (i32, &'static str) {
    match kind {
        ErrorKind::InvalidInput => (150, "INVALID_INPUT"),
        ErrorKind::PreconditionFailed => (151, "PRECONDITION_FAILED"),
        ErrorKind::SubmissionRejected => (152, "SUBMISSION_REJECTED"),
        ErrorKind::ExecutionReverted => (153, "EXECUTION_REVERTED"),
        ErrorKind::FeeEstimationUnavailable => (160, "FEE_ESTIMATION_UNAVAILABLE"),
        ErrorKind::ConfirmationTimeout => (161, "CONFIRMATION_TIMEOUT"),
        ErrorKind::OwnerBusy => (162, "OWNER_BUSY"),
        ErrorKind::RpcUnavailable => (163, "RPC_UNAVAILABLE"),
        ErrorKind::ConfigurationMissing => (170, "CONFIGURATION_MISSING"),
        ErrorKind::SigningFailed => (171, "SIGNING_FAILED"),
    }
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
pub struct ErrorData {
    pub kind: ErrorKind,
    pub class: ErrorClass,
    pub retryable: bool,
    pub detail: String,
}

impl<'a> From<Error> for ErrorObject<'a> {
    fn from(value: Error) -> Self {
        let (code, name) = wire_code(value.kind());
        let data = ErrorData {
            kind: value.kind(),
            class: value.class(),
            retryable: value.is_retryable(),
            detail: value.to_string(),
        };

        ErrorObject::owned(code, format!("An error occurred ({})", name), Some(data))
    }
}
