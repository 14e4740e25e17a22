use gasless_execution::{ConfirmationConfiguration, ContractsConfiguration, OwnersConfiguration};
use gasless_relayer::lock::LockLayerConfiguration;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Configuration {
    pub rpc: RPCConfiguration,

    pub chain: gasless_evm::Configuration,
    pub bundler: gasless_bundler::Configuration,
    pub sponsoring: gasless_sponsoring::Configuration,

    pub lock: LockLayerConfiguration,
    pub owners: OwnersConfiguration,
    pub contracts: ContractsConfiguration,
    pub confirmation: ConfirmationConfiguration,
    pub max_attempts: usize,
}

impl From<Configuration> for gasless_execution::Configuration {
    fn from(value: Configuration) -> Self {
        Self {
            chain: value.chain,
            bundler: value.bundler,
            sponsoring: value.sponsoring,

            lock: value.lock,
            owners: value.owners,
            contracts: value.contracts,
            confirmation: value.confirmation,
            max_attempts: value.max_attempts,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RPCConfiguration {
    pub port: u64,
}
