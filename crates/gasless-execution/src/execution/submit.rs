use alloy::primitives::B256;
use gasless_bundler::UserOperationReceipt;
use gasless_common::{measure_duration, metric};
use gasless_evm::account::SmartAccount;
use gasless_evm::operation::{Call, GasFees};
use gasless_relayer::{LockedRelayer, SubmissionRequest, SubmittedOperation};
use gasless_sponsoring::Sponsorship;
use tokio::time;
use tracing::{debug, warn};

use crate::execution::ExecutionResult;
use crate::{Client, Error};

impl Client {
    /// Critical section of an owner. The key stays locked until the receipt is known since the
    /// authorization nonce only moves once the operation is included.
    pub(crate) async fn submit_and_confirm(&self, account: &SmartAccount, calls: &[Call], fees: GasFees, sponsorship: &Sponsorship) -> Result<ExecutionResult, Error> {
        let mut relayer = self.relayers.lock_relayer(account).await?;

        let request = SubmissionRequest { calls, fees, sponsorship };
        let result = self.submit_and_confirm_locked(&mut relayer, &request).await;
        self.relayers.release_relayer(relayer);

        result
    }

    async fn submit_and_confirm_locked(&self, relayer: &mut LockedRelayer, request: &SubmissionRequest<'_>) -> Result<ExecutionResult, Error> {
        let (submitted, duration) = measure_duration!(self.submit_with_retries(relayer, request, self.max_attempts).await);
        metric!(histogram[execution_submission_duration_milliseconds] = duration.as_millis(), method = "submit");
        metric!(on error submitted => counter [ execution_submission_error ] = 1, method = "submit");

        let submitted = submitted?;
        debug!(user_operation_hash = %submitted.hash, "operation submitted");

        let receipt = self.await_receipt(submitted.hash).await?;
        if !receipt.success {
            return Err(Error::ExecutionReverted(
                receipt.reason.unwrap_or_else(|| "execution reverted".to_string()),
            ));
        }

        Ok(ExecutionResult {
            transaction_hash: receipt.receipt.transaction_hash,
            user_operation_hash: submitted.hash,
        })
    }

    // Submit at most n times while the bundler reports a stale nonce. Every attempt reads the nonces
    // again and builds a new operation. Any other failure is returned right away.
    async fn submit_with_retries(&self, relayer: &mut LockedRelayer, request: &SubmissionRequest<'_>, n_attempts: usize) -> Result<SubmittedOperation, Error> {
        let mut last = String::new();
        for attempt in 0..n_attempts {
            match relayer.submit(request).await {
                Ok(submitted) => return Ok(submitted),
                Err(gasless_relayer::Error::InvalidNonce(message)) => {
                    debug!(attempt, "stale nonce for {}, submitting again", relayer.address());
                    last = message;
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::InvalidNonce(last))
    }

    /// Poll the bundler until the operation has a receipt. Failed polls are only logged, the
    /// confirmation window alone bounds the wait.
    async fn await_receipt(&self, hash: B256) -> Result<UserOperationReceipt, Error> {
        let polling = async {
            loop {
                match self.bundler.fetch_user_operation_receipt(hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {},
                    Err(e) => warn!(user_operation_hash = %hash, "could not fetch receipt {}", e),
                }

                time::sleep(self.confirmation.polling_interval).await;
            }
        };

        time::timeout(self.confirmation.timeout, polling)
            .await
            .map_err(|_| Error::ConfirmationTimeout(hash))
    }
}
