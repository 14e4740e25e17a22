use std::time::Duration;

use alloy::primitives::Address;
use gasless_evm::account::EvmAccountConfiguration;
use gasless_evm::constants::Contract;
use gasless_evm::contract::FRAMINO_BADGE_ABI;
use gasless_relayer::lock::LockLayerConfiguration;
use gasless_relayer::RelayerManager;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

mod error;
pub use error::{Error, ErrorClass, ErrorKind};

pub mod intent;
pub use intent::{DonateIntent, Intent, MarkCompletedIntent, MintIntent, RedeemIntent};

mod execution;
pub use execution::ExecutionResult;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Owning keys of the deployment. A missing key only disables the intents it signs for.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OwnersConfiguration {
    /// Signs donations
    #[serde(default)]
    pub donor: Option<EvmAccountConfiguration>,

    /// Owner of the badge collection, signs mint, mark completed and redeem
    #[serde(default)]
    pub badge_admin: Option<EvmAccountConfiguration>,
}

fn default_entry_point() -> Address {
    Contract::ENTRY_POINT_V08
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractsConfiguration {
    /// Badge collection, defaults to the deployment of the configured chain
    #[serde(default)]
    pub badge: Option<Address>,

    #[serde(default)]
    pub donation_recipient: Option<Address>,

    #[serde(default = "default_entry_point")]
    pub entry_point: Address,
}

impl Default for ContractsConfiguration {
    fn default() -> Self {
        Self {
            badge: None,
            donation_recipient: None,
            entry_point: default_entry_point(),
        }
    }
}

fn default_polling_interval() -> Duration {
    Duration::from_millis(1000)
}

fn default_confirmation_timeout() -> Duration {
    Duration::from_secs(60)
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfirmationConfiguration {
    #[serde_as(as = "serde_with::DurationMilliSeconds")]
    #[serde(default = "default_polling_interval")]
    pub polling_interval: Duration,

    #[serde_as(as = "serde_with::DurationSeconds")]
    #[serde(default = "default_confirmation_timeout")]
    pub timeout: Duration,
}

impl Default for ConfirmationConfiguration {
    fn default() -> Self {
        Self {
            polling_interval: default_polling_interval(),
            timeout: default_confirmation_timeout(),
        }
    }
}

fn default_max_attempts() -> usize {
    3
}

/// Execution client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Configuration {
    pub chain: gasless_evm::Configuration,
    pub bundler: gasless_bundler::Configuration,

    #[serde(default)]
    pub sponsoring: gasless_sponsoring::Configuration,

    #[serde(default)]
    pub lock: LockLayerConfiguration,

    #[serde(default)]
    pub owners: OwnersConfiguration,

    #[serde(default)]
    pub contracts: ContractsConfiguration,

    #[serde(default)]
    pub confirmation: ConfirmationConfiguration,

    /// Number of times the critical section is run when the bundler reports a stale nonce
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

/// Address and ABI of the badge collection
#[derive(Debug, Clone, Serialize)]
pub struct ContractInfo {
    pub address: Address,
    pub abi: serde_json::Value,
}

/// Execution client running the gasless pipeline of every intent
#[derive(Clone)]
pub struct Client {
    pub chain: gasless_evm::Client,
    pub bundler: gasless_bundler::Client,
    pub sponsoring: gasless_sponsoring::Client,

    relayers: RelayerManager,

    owners: OwnersConfiguration,
    badge: Option<Address>,
    donation_recipient: Option<Address>,
    confirmation: ConfirmationConfiguration,
    max_attempts: usize,
}

impl Client {
    /// Creates a new client given a configuration
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        let chain = gasless_evm::Client::new(&configuration.chain)?;
        let bundler = gasless_bundler::Client::new(&configuration.bundler, chain.chain_id()).map_err(|e| Error::ConfigurationMissing(e.to_string()))?;
        let sponsoring = gasless_sponsoring::Client::new(&configuration.sponsoring, chain.clone())?;

        Ok(Self {
            relayers: RelayerManager::new(
                &configuration.lock,
                configuration.contracts.entry_point,
                chain.clone(),
                bundler.clone(),
                sponsoring.clone(),
            ),
            badge: configuration.contracts.badge.or_else(|| Contract::badge(chain.chain_id())),
            donation_recipient: configuration.contracts.donation_recipient,
            owners: configuration.owners.clone(),
            confirmation: configuration.confirmation.clone(),
            max_attempts: configuration.max_attempts.max(1),

            chain,
            bundler,
            sponsoring,
        })
    }

    /// Badge contract address along with its ABI
    pub fn get_contract_info(&self) -> Result<ContractInfo, Error> {
        let address = self.badge.ok_or_else(|| Error::ConfigurationMissing("badge contract".to_string()))?;
        let abi = serde_json::from_str(FRAMINO_BADGE_ABI).map_err(|e| Error::ConfigurationMissing(format!("badge abi {}", e)))?;

        Ok(ContractInfo { address, abi })
    }

    /// Whether the chain endpoint answers and is bound to the configured chain
    pub async fn is_healthy(&self) -> bool {
        matches!(self.chain.fetch_chain_id().await, Ok(chain_id) if chain_id == self.chain.chain_id().as_u64())
    }
}
