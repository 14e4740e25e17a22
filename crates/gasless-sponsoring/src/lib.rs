use alloy::primitives::{Address, U256};
use gasless_common::{measure_duration, metric};
use gasless_evm::account::SmartAccount;
use gasless_evm::constants::{Contract, Permit, Token};
use gasless_evm::operation::PaymasterFields;
use gasless_evm::signature::{PermitAuthorization, PermitSigner};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

mod encoder;
pub use encoder::{encode_paymaster_data, encode_sponsorship, PaymasterGasLimits, PERMIT_MODE};

#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {{
        let result = $e;
        match &result {
            Err(e @ Error::Chain(gasless_evm::Error::RpcUnavailable(_))) => error!(message = %e),
            Err(e @ Error::Chain(gasless_evm::Error::Signing(_))) => error!(message = %e),
            Err(e) => warn!(message = %e),
            _ => (),
        };
        result
    }};
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing configuration {0}")]
    MissingConfiguration(String),

    #[error(transparent)]
    Chain(#[from] gasless_evm::Error),
}

fn default_permit_amount() -> U256 {
    Permit::AMOUNT
}

fn default_verification_gas_limit() -> u64 {
    0x200000
}

fn default_post_op_gas_limit() -> u64 {
    0x15000
}

/// Sponsorship through a token paymaster. Addresses left empty fall back to the deployment of the
/// configured chain.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    #[serde(default)]
    pub paymaster: Option<Address>,

    #[serde(default)]
    pub token: Option<Address>,

    #[serde(default = "default_permit_amount")]
    pub permit_amount: U256,

    #[serde(default = "default_verification_gas_limit")]
    pub verification_gas_limit: u64,

    #[serde(default = "default_post_op_gas_limit")]
    pub post_op_gas_limit: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            paymaster: None,
            token: None,
            permit_amount: default_permit_amount(),
            verification_gas_limit: default_verification_gas_limit(),
            post_op_gas_limit: default_post_op_gas_limit(),
        }
    }
}

/// Signs the permits paying the paymaster of an operation
#[derive(Clone)]
pub struct Client {
    paymaster: Address,
    token: Address,
    permit_amount: U256,
    gas: PaymasterGasLimits,

    chain: gasless_evm::Client,
    signer: PermitSigner,
}

impl Client {
    pub fn new(configuration: &Configuration, chain: gasless_evm::Client) -> Result<Self, Error> {
        let chain_id = *chain.chain_id();
        let paymaster = configuration
            .paymaster
            .or_else(|| Contract::paymaster(&chain_id))
            .ok_or_else(|| Error::MissingConfiguration(format!("no paymaster for chain {:?}", chain_id)))?;

        if configuration.permit_amount.is_zero() || configuration.permit_amount == U256::MAX {
            return Err(Error::MissingConfiguration("permit amount must be bounded and positive".to_string()));
        }

        Ok(Self {
            paymaster,
            token: configuration.token.unwrap_or_else(|| Token::usdc(&chain_id)),
            permit_amount: configuration.permit_amount,
            gas: PaymasterGasLimits {
                verification: configuration.verification_gas_limit as u128,
                post_op: configuration.post_op_gas_limit as u128,
            },
            signer: PermitSigner::new(chain.clone()),
            chain,
        })
    }

    pub fn paymaster(&self) -> Address {
        self.paymaster
    }

    /// Token in which the paymaster is paid
    pub fn token(&self) -> Address {
        self.token
    }

    /// Sign the permit letting the paymaster pull its fee from `account`
    #[instrument(name = "sign_sponsorship_permit", skip(self, account), fields(account = %account.address()))]
    pub async fn sign_permit(&self, account: &SmartAccount) -> Result<PermitAuthorization, Error> {
        let (result, duration) = measure_duration!(log_if_error!(self
            .signer
            .sign(account, self.token, self.paymaster, self.permit_amount, Permit::DEADLINE)
            .await
            .map_err(Error::from)));

        metric!(histogram[sponsoring_duration_milliseconds] = duration.as_millis(), method = "sign_permit");
        metric!(on error result => counter [ sponsoring_error ] = 1, method = "sign_permit");
        result
    }

    /// Sign the permit and bind it to this paymaster
    pub async fn sponsor(&self, account: &SmartAccount) -> Result<Sponsorship, Error> {
        let permit = self.sign_permit(account).await?;

        Ok(Sponsorship {
            paymaster: self.paymaster,
            gas: self.gas,
            permit,
        })
    }

    /// Keep `sponsorship` while its permit nonce is still the one of the token, sign a new permit
    /// otherwise. Another operation of the same owner may have consumed the permit in between.
    pub async fn refresh(&self, account: &SmartAccount, sponsorship: &Sponsorship) -> Result<Sponsorship, Error> {
        let nonce = log_if_error!(self
            .chain
            .fetch_permit_nonce(self.token, account.address())
            .await
            .map_err(Error::from))?;

        if nonce == sponsorship.permit.nonce {
            return Ok(sponsorship.clone());
        }

        debug!("permit nonce of {} moved to {}, signing a new permit", account.address(), nonce);
        self.sponsor(account).await
    }
}

/// A signed permit ready to be turned into paymaster data. The data is rebuilt on every call to
/// [`Sponsorship::paymaster_data`] without any I/O, so the submission side can request it for the
/// gas estimation and again for the final operation.
#[derive(Clone, Debug)]
pub struct Sponsorship {
    paymaster: Address,
    gas: PaymasterGasLimits,
    permit: PermitAuthorization,
}

impl Sponsorship {
    pub fn permit(&self) -> &PermitAuthorization {
        &self.permit
    }

    pub fn paymaster_data(&self) -> PaymasterFields {
        encode_sponsorship(self.paymaster, &self.gas, &self.permit)
    }
}
