use alloy::primitives::Address;
use gasless_common::log_if_error;
use gasless_evm::account::SmartAccount;
use thiserror::Error;
use tracing::{debug, instrument};

pub mod lock;
use crate::lock::{LockLayer, LockLayerConfiguration};

mod relayer;
pub use relayer::{LockedRelayer, Relayer, SubmissionRequest, SubmittedOperation};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Lock(#[from] lock::Error),

    #[error("invalid nonce {0}")]
    InvalidNonce(String),

    #[error("Relayer's lock has expired")]
    RelayerLockExpired,

    #[error(transparent)]
    Chain(#[from] gasless_evm::Error),

    #[error(transparent)]
    Bundler(gasless_bundler::Error),

    #[error(transparent)]
    Sponsoring(#[from] gasless_sponsoring::Error),
}

impl From<gasless_bundler::Error> for Error {
    fn from(value: gasless_bundler::Error) -> Self {
        if value.is_stale_nonce() {
            return Error::InvalidNonce(value.to_string());
        }

        Error::Bundler(value)
    }
}

/// Hands out relayers for owning keys. A key is owned by at most one relayer at a time so that its
/// nonces are read and consumed by one operation after the other.
#[derive(Clone)]
pub struct RelayerManager {
    entry_point: Address,

    chain: gasless_evm::Client,
    bundler: gasless_bundler::Client,
    sponsoring: gasless_sponsoring::Client,
    locks: LockLayer,
}

impl RelayerManager {
    pub fn new(
        configuration: &LockLayerConfiguration,
        entry_point: Address,
        chain: gasless_evm::Client,
        bundler: gasless_bundler::Client,
        sponsoring: gasless_sponsoring::Client,
    ) -> Self {
        Self {
            entry_point,
            chain,
            bundler,
            sponsoring,
            locks: LockLayer::new(configuration),
        }
    }

    #[instrument(name = "lock_relayer", skip(self, account), fields(owner = %account.address()))]
    pub async fn lock_relayer(&self, account: &SmartAccount) -> Result<LockedRelayer, Error> {
        let lock = log_if_error!(self.locks.lock_key(account.address()).await)?;
        debug!(target: "Relayers", "lock relayer {}", account.address());

        let relayer = Relayer::new(
            account.clone(),
            self.entry_point,
            self.chain.clone(),
            self.bundler.clone(),
            self.sponsoring.clone(),
        );
        Ok(relayer.lock(lock))
    }

    pub fn release_relayer(&self, relayer: LockedRelayer) {
        let (relayer, lock) = relayer.unlock();
        debug!(target: "Relayers", "release relayer {}", relayer.address());

        drop(lock);
    }
}
