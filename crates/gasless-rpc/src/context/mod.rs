mod configuration;
pub use configuration::{Configuration, RPCConfiguration};
use gasless_execution::Client as ExecutionClient;

use crate::Error;

#[derive(Clone)]
pub struct Context {
    pub configuration: Configuration,

    pub execution: ExecutionClient,
}

impl Context {
    pub fn new(configuration: Configuration) -> Result<Self, Error> {
        Ok(Self {
            execution: ExecutionClient::new(&configuration.clone().into())?,

            configuration,
        })
    }
}
