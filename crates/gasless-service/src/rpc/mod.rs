use async_trait::async_trait;
use gasless_common::service::{Error, Service};
use gasless_rpc::server::GaslessServer;

use crate::core::context::Context;

pub struct RPCService {
    context: Context,
}

#[async_trait]
impl Service for RPCService {
    type Context = Context;

    const NAME: &'static str = "RPC";

    async fn new(context: Context) -> Self {
        Self { context }
    }

    async fn run(self) -> Result<(), Error> {
        let server = GaslessServer::new(&self.context.into()).map_err(Error::from)?;
        let handle = server.start().await?;

        handle.stopped().await;

        Err(Error::new("rpc server stopped unexpectedly"))
    }
}
