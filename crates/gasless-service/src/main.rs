use gasless_common::service::monitoring::{Metric, Tracer};
use gasless_common::service::{Error, ServiceManager};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use crate::core::context::Context;
use crate::core::Fmt;
use crate::rpc::RPCService;

mod core;
mod rpc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let context = Context::load()?;

    let fmt_layer = Fmt::layer(&context.configuration.verbosity);
    let metric_layer = context.configuration.prometheus.as_ref().map(|x| Metric::layer(x)).transpose()?;
    let trace_layer = context.configuration.tracing.as_ref().map(|x| Tracer::layer(x)).transpose()?;

    let subscriber = Registry::default().with(fmt_layer).with(metric_layer).with(trace_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(Error::from)?;

    let mut services = ServiceManager::new(context);
    info!("starting services...");
    services.spawn::<RPCService>();

    info!("all services started");
    services.wait()
}
