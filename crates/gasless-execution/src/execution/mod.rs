use alloy::primitives::B256;
use gasless_common::{measure_duration, metric};
use gasless_evm::account::{EvmAccountConfiguration, SmartAccount};
use gasless_evm::constants::Token;
use gasless_evm::math::format_base_units;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::intent::{Owner, Precondition, Targets};
use crate::{Client, Error, Intent};

mod submit;

/// Outcome of a confirmed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub transaction_hash: B256,
    pub user_operation_hash: B256,
}

impl Client {
    pub async fn donate(&self, intent: crate::DonateIntent) -> Result<ExecutionResult, Error> {
        self.run_gasless_operation(&Intent::Donate(intent)).await
    }

    pub async fn mint(&self, intent: crate::MintIntent) -> Result<ExecutionResult, Error> {
        self.run_gasless_operation(&Intent::Mint(intent)).await
    }

    pub async fn mark_completed(&self, intent: crate::MarkCompletedIntent) -> Result<ExecutionResult, Error> {
        self.run_gasless_operation(&Intent::MarkCompleted(intent)).await
    }

    pub async fn redeem(&self, intent: crate::RedeemIntent) -> Result<ExecutionResult, Error> {
        self.run_gasless_operation(&Intent::Redeem(intent)).await
    }

    /// Single pipeline shared by every intent. The intent only decides the calls, the signing key and
    /// an optional precondition.
    #[instrument(name = "run_gasless_operation", skip(self, intent), fields(intent = intent.name(), run = %Uuid::new_v4()))]
    pub async fn run_gasless_operation(&self, intent: &Intent) -> Result<ExecutionResult, Error> {
        let (result, duration) = measure_duration!(self.run(intent).await);

        metric!(counter[execution_request] = 1, method = intent.name());
        metric!(histogram[execution_request_duration_milliseconds] = duration.as_millis(), method = intent.name());
        if let Err(e) = &result {
            warn!(kind = ?e.kind(), "{}", e);
            metric!(counter[execution_request_error] = 1, method = intent.name(), error = format!("{:?}", e.kind()));
        }

        result
    }

    async fn run(&self, intent: &Intent) -> Result<ExecutionResult, Error> {
        let plan = intent.plan(&self.targets())?;
        let owner = self.owner(plan.owner)?;

        let account = self.chain.initialize_account(owner)?;
        if let Some(precondition) = &plan.precondition {
            self.check_precondition(&account, precondition).await?;
        }

        let sponsorship = self.sponsoring.sponsor(&account).await?;
        let fees = self
            .bundler
            .fetch_gas_price()
            .await
            .map_err(|e| Error::FeeEstimationUnavailable(e.to_string()))?;

        let result = self.submit_and_confirm(&account, &plan.calls, fees, &sponsorship).await?;
        info!(transaction_hash = %result.transaction_hash, "operation confirmed");

        Ok(result)
    }

    fn targets(&self) -> Targets {
        Targets {
            token: self.sponsoring.token(),
            badge: self.badge,
            donation_recipient: self.donation_recipient,
        }
    }

    fn owner(&self, owner: Owner) -> Result<&EvmAccountConfiguration, Error> {
        match owner {
            Owner::Donor => self.owners.donor.as_ref().ok_or_else(|| Error::ConfigurationMissing("donor key".to_string())),
            Owner::BadgeAdmin => self
                .owners
                .badge_admin
                .as_ref()
                .ok_or_else(|| Error::ConfigurationMissing("badge admin key".to_string())),
        }
    }

    async fn check_precondition(&self, account: &SmartAccount, precondition: &Precondition) -> Result<(), Error> {
        match precondition {
            Precondition::Balance { token, amount } => {
                let balance = self.chain.fetch_token_balance(*token, account.address()).await?;
                if balance < *amount {
                    return Err(Error::PreconditionFailed(format!(
                        "balance of {} is {}, below the requested {}",
                        account.address(),
                        format_base_units(balance, Token::USDC_DECIMALS),
                        format_base_units(*amount, Token::USDC_DECIMALS)
                    )));
                }

                Ok(())
            },
        }
    }
}
