use std::sync::Arc;

use gasless_execution::testing::{SimulatedNetwork, TestEnvironment as ExecutionTestEnvironment};

use crate::context::{Context, RPCConfiguration};
use crate::Configuration;

pub struct TestEnvironment {
    context: Context,
    network: Arc<SimulatedNetwork>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_network(SimulatedNetwork::default())
    }

    pub fn with_network(network: SimulatedNetwork) -> Self {
        Self::with_port(network, 12777)
    }

    pub fn with_port(network: SimulatedNetwork, port: u64) -> Self {
        let execution = ExecutionTestEnvironment::new(network);

        let configuration = Configuration {
            rpc: RPCConfiguration { port },

            chain: execution.configuration.chain,
            bundler: execution.configuration.bundler,
            sponsoring: execution.configuration.sponsoring,

            lock: execution.configuration.lock,
            owners: execution.configuration.owners,
            contracts: execution.configuration.contracts,
            confirmation: execution.configuration.confirmation,
            max_attempts: execution.configuration.max_attempts,
        };

        Self {
            context: Context::new(configuration).expect("invalid test configuration"),
            network: execution.network,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn configuration(&self) -> &Configuration {
        &self.context.configuration
    }

    pub fn network(&self) -> &SimulatedNetwork {
        &self.network
    }
}
