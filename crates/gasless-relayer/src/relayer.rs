use std::ops::Deref;

use alloy::primitives::{Address, B256};
use gasless_common::metric;
use gasless_evm::account::SmartAccount;
use gasless_evm::operation::{encode_calls, Call, GasFees, UserOperation};
use gasless_evm::signature::AuthorizationSigner;
use gasless_sponsoring::Sponsorship;
use tracing::{debug, instrument, warn};

use crate::lock::KeyLock;
use crate::Error;

/// Everything that was prepared outside of the critical section
pub struct SubmissionRequest<'a> {
    pub calls: &'a [Call],
    pub fees: GasFees,
    pub sponsorship: &'a Sponsorship,
}

/// Operation accepted by the bundler, identified by its user operation hash
#[derive(Debug, Clone)]
pub struct SubmittedOperation {
    pub hash: B256,
    pub operation: UserOperation,
}

#[derive(Clone)]
pub struct Relayer {
    account: SmartAccount,
    entry_point: Address,

    chain: gasless_evm::Client,
    bundler: gasless_bundler::Client,
    sponsoring: gasless_sponsoring::Client,
    authorizations: AuthorizationSigner,
}

impl Deref for Relayer {
    type Target = SmartAccount;

    fn deref(&self) -> &Self::Target {
        &self.account
    }
}

impl Relayer {
    pub fn new(account: SmartAccount, entry_point: Address, chain: gasless_evm::Client, bundler: gasless_bundler::Client, sponsoring: gasless_sponsoring::Client) -> Self {
        Self {
            account,
            entry_point,
            authorizations: AuthorizationSigner::new(chain.clone()),
            chain,
            bundler,
            sponsoring,
        }
    }

    pub fn lock(self, lock: KeyLock) -> LockedRelayer {
        LockedRelayer { lock, relayer: self }
    }
}

/// Relayer owning the lock of its key. Only a locked relayer can read the nonces and submit.
pub struct LockedRelayer {
    lock: KeyLock,
    relayer: Relayer,
}

impl LockedRelayer {
    pub fn address(&self) -> Address {
        self.relayer.address()
    }

    pub fn unlock(self) -> (Relayer, KeyLock) {
        (self.relayer, self.lock)
    }

    /// Read the nonces, sign the authorization and the operation, then hand it to the bundler.
    /// Each call builds a brand new operation. The permit of the sponsorship is signed again only when
    /// its nonce was consumed since it was produced.
    #[instrument(name = "submit_operation", skip(self, request), fields(owner = %self.address()))]
    pub async fn submit(&mut self, request: &SubmissionRequest<'_>) -> Result<SubmittedOperation, Error> {
        metric!(counter[relayer_request] = 1, method = "submit");

        if self.lock.is_expired() {
            metric!(counter[relayer_request_error] = 1, method = "submit", error = "is_expired");

            return Err(Error::RelayerLockExpired);
        }

        let account = &self.relayer.account;
        let entry_point = self.relayer.entry_point;

        let sponsorship = self.relayer.sponsoring.refresh(account, request.sponsorship).await?;
        let authorization = self.relayer.authorizations.sign(account).await?;
        let nonce = self.relayer.chain.fetch_account_nonce(entry_point, account.address()).await?;
        debug!(authorization_nonce = authorization.nonce, account_nonce = %nonce, "nonces read");

        let mut operation = UserOperation::new(
            account.address(),
            nonce,
            encode_calls(request.calls),
            request.fees,
            sponsorship.paymaster_data(),
            authorization,
        );

        operation.gas = self
            .relayer
            .bundler
            .estimate_user_operation_gas(&operation, entry_point)
            .await
            .map_err(|e| self.on_bundler_error(e))?;

        operation.paymaster = sponsorship.paymaster_data();
        let operation = operation.sign(account, entry_point)?;

        let hash = self
            .relayer
            .bundler
            .send_user_operation(&operation, entry_point)
            .await
            .map_err(|e| self.on_bundler_error(e))?;

        Ok(SubmittedOperation { hash, operation })
    }

    fn on_bundler_error(&self, error: gasless_bundler::Error) -> Error {
        let error = Error::from(error);
        match &error {
            Error::InvalidNonce(message) => {
                warn!("stale nonce for {}: {}", self.address(), message);
                metric!(counter[relayer_request_error] = 1, method = "submit", error = "invalid_nonce");
            },
            e => metric!(counter[relayer_request_error] = 1, method = "submit", error = e.to_string()),
        }

        error
    }
}
