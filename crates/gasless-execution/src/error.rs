use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes of a gasless operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ConfigurationMissing,
    InvalidInput,
    PreconditionFailed,
    SigningFailed,
    FeeEstimationUnavailable,
    SubmissionRejected,
    ExecutionReverted,
    ConfirmationTimeout,
    OwnerBusy,
    RpcUnavailable,
}

/// How the caller should react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The deployment is misconfigured, nothing the caller can do
    Configuration,

    /// The request or the on-chain state it targets is not acceptable
    Client,

    /// Infrastructure hiccup, the request may be sent again
    Transient,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing configuration {0}")]
    ConfigurationMissing(String),

    #[error("invalid input {0}")]
    InvalidInput(String),

    #[error("precondition failed {0}")]
    PreconditionFailed(String),

    #[error("signing failed {0}")]
    SigningFailed(String),

    #[error("fee estimation unavailable {0}")]
    FeeEstimationUnavailable(String),

    #[error("submission rejected {0}")]
    SubmissionRejected(String),

    #[error("stale nonce {0}")]
    InvalidNonce(String),

    #[error("execution reverted {0}")]
    ExecutionReverted(String),

    #[error("no receipt for user operation {0} within the confirmation window")]
    ConfirmationTimeout(B256),

    #[error("owner busy {0}")]
    OwnerBusy(String),

    #[error("rpc unavailable {0}")]
    RpcUnavailable(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::SigningFailed(_) => ErrorKind::SigningFailed,
            Self::FeeEstimationUnavailable(_) => ErrorKind::FeeEstimationUnavailable,
            Self::SubmissionRejected(_) | Self::InvalidNonce(_) => ErrorKind::SubmissionRejected,
            Self::ExecutionReverted(_) => ErrorKind::ExecutionReverted,
            Self::ConfirmationTimeout(_) => ErrorKind::ConfirmationTimeout,
            Self::OwnerBusy(_) => ErrorKind::OwnerBusy,
            Self::RpcUnavailable(_) => ErrorKind::RpcUnavailable,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.kind() {
            ErrorKind::ConfigurationMissing | ErrorKind::SigningFailed => ErrorClass::Configuration,
            ErrorKind::InvalidInput | ErrorKind::PreconditionFailed | ErrorKind::ExecutionReverted => ErrorClass::Client,
            ErrorKind::SubmissionRejected if matches!(self, Self::InvalidNonce(_)) => ErrorClass::Transient,
            ErrorKind::SubmissionRejected => ErrorClass::Client,
            ErrorKind::FeeEstimationUnavailable | ErrorKind::ConfirmationTimeout | ErrorKind::OwnerBusy | ErrorKind::RpcUnavailable => ErrorClass::Transient,
        }
    }

    /// Whether running a fresh pipeline with the same intent may succeed. A confirmation timeout is
    /// transient but ambiguous: the operation may still land, so it is not reported as retryable.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient && !matches!(self, Self::ConfirmationTimeout(_))
    }
}

impl From<gasless_evm::Error> for Error {
    fn from(value: gasless_evm::Error) -> Self {
        use gasless_evm::Error as Chain;

        match value {
            Chain::InvalidKey(e) | Chain::Signing(e) => Self::SigningFailed(e),
            Chain::InvalidAmount(e) => Self::InvalidInput(e),
            Chain::InvalidChainID(e) => Self::ConfigurationMissing(e),
            Chain::Contract(e) => Self::ExecutionReverted(e),
            e @ (Chain::RpcUnavailable(_) | Chain::Rpc(_) | Chain::InvalidResponse(_) | Chain::Internal(_)) => Self::RpcUnavailable(e.to_string()),
        }
    }
}

impl From<gasless_sponsoring::Error> for Error {
    fn from(value: gasless_sponsoring::Error) -> Self {
        match value {
            gasless_sponsoring::Error::MissingConfiguration(e) => Self::ConfigurationMissing(e),
            gasless_sponsoring::Error::Chain(e) => e.into(),
        }
    }
}

impl From<gasless_bundler::Error> for Error {
    fn from(value: gasless_bundler::Error) -> Self {
        match value {
            e if e.is_stale_nonce() => Self::InvalidNonce(e.to_string()),
            e if e.is_execution_reverted() => Self::ExecutionReverted(e.to_string()),
            e @ gasless_bundler::Error::Rejected { .. } => Self::SubmissionRejected(e.to_string()),
            e => Self::RpcUnavailable(e.to_string()),
        }
    }
}

impl From<gasless_relayer::Error> for Error {
    fn from(value: gasless_relayer::Error) -> Self {
        match value {
            gasless_relayer::Error::Lock(e) => Self::OwnerBusy(e.to_string()),
            gasless_relayer::Error::RelayerLockExpired => Self::OwnerBusy("lock expired".to_string()),
            gasless_relayer::Error::InvalidNonce(e) => Self::InvalidNonce(e),
            gasless_relayer::Error::Chain(e) => e.into(),
            gasless_relayer::Error::Bundler(e) => e.into(),
            gasless_relayer::Error::Sponsoring(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;

    use crate::{Error, ErrorClass, ErrorKind};

    #[test]
    fn stale_nonce_is_a_retryable_rejection() {
        let error = Error::from(gasless_relayer::Error::InvalidNonce("AA25 invalid account nonce".to_string()));

        assert_eq!(error.kind(), ErrorKind::SubmissionRejected);
        assert_eq!(error.class(), ErrorClass::Transient);
        assert!(error.is_retryable());
    }

    #[test]
    fn paymaster_rejection_is_not_retryable() {
        let error = Error::from(gasless_relayer::Error::Bundler(gasless_bundler::Error::Rejected {
            code: -32501,
            message: "AA33 reverted".to_string(),
        }));

        assert_eq!(error.kind(), ErrorKind::SubmissionRejected);
        assert_eq!(error.class(), ErrorClass::Client);
        assert!(!error.is_retryable());
    }

    #[test]
    fn simulation_revert_is_an_execution_revert() {
        let error = Error::from(gasless_bundler::Error::Rejected {
            code: -32521,
            message: "execution reverted".to_string(),
        });

        assert_eq!(error.kind(), ErrorKind::ExecutionReverted);
        assert_eq!(error.class(), ErrorClass::Client);
    }

    #[test]
    fn confirmation_timeout_is_transient_but_ambiguous() {
        let error = Error::ConfirmationTimeout(B256::ZERO);

        assert_eq!(error.class(), ErrorClass::Transient);
        assert!(!error.is_retryable());
    }

    #[test]
    fn chain_errors_are_classified() {
        assert_eq!(Error::from(gasless_evm::Error::InvalidKey("zero".to_string())).class(), ErrorClass::Configuration);
        assert_eq!(Error::from(gasless_evm::Error::InvalidAmount("0".to_string())).kind(), ErrorKind::InvalidInput);
        assert!(Error::from(gasless_evm::Error::RpcUnavailable("timeout".to_string())).is_retryable());
    }
}
