use async_trait::async_trait;
use thiserror::Error;

pub mod failover;
pub mod monitoring;

mod runner;
pub use runner::ServiceManager;
pub use tracing;

/// Log the error carried by a `Result` and hand the result back untouched
#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {
        match $e {
            Ok(v) => Ok(v),
            Err(e) => {
                $crate::service::tracing::error!("{}", e);
                Err(e)
            },
        }
    };
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct Error(String);

impl Error {
    pub fn new(s: &str) -> Error {
        Error(s.to_string())
    }

    pub fn from<E: std::error::Error>(e: E) -> Self {
        Self(e.to_string())
    }
}

/// A long running unit of the process (the RPC server for instance). Services are spawned on a
/// [`ServiceManager`] which restarts them whenever [`Service::run`] returns an error.
#[async_trait]
pub trait Service {
    const NAME: &'static str;
    type Context: Clone + Send;

    async fn new(context: Self::Context) -> Self;

    /// Should only return on unrecoverable errors
    async fn run(self) -> Result<(), Error>;
}
