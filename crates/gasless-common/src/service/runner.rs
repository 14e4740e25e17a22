use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{error, info};
use tokio::time;

use crate::service::{Error, Service};

const RESTART_DELAY: Duration = Duration::from_secs(5);

/// Spawns each [`Service`] on a dedicated OS thread owning its own multi-threaded Tokio runtime, so that
/// the tasks spawned by one service never compete with another service's tasks.
pub struct ServiceManager<C> {
    context: C,

    services: Vec<JoinHandle<Result<(), Error>>>,
}

impl<C> ServiceManager<C>
where
    C: 'static + Clone + Send,
{
    pub fn new(context: C) -> Self {
        Self { context, services: vec![] }
    }

    /// Spawn `T` with a clone of the bound context. The service is restarted after a short delay each
    /// time it fails.
    pub fn spawn<T: Service<Context = C>>(&mut self) {
        let context = self.context.clone();

        self.services.push(thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(Error::from)?;

            runtime.block_on(Self::supervise::<T>(context));
            Ok(())
        }))
    }

    async fn supervise<T: Service<Context = C>>(context: C) {
        loop {
            let service = T::new(context.clone()).await;

            info!(target: T::NAME, "starting service");
            if let Err(err) = service.run().await {
                error!(target: T::NAME, "service terminated with error {} - restarting in {}s", err, RESTART_DELAY.as_secs());
                time::sleep(RESTART_DELAY).await;
            }
        }
    }

    /// Block the current thread until one of the services stops. Services are not expected to stop,
    /// hence this always reports an error when it returns.
    pub fn wait(&mut self) -> Result<(), Error> {
        let Some(service) = self.services.pop() else {
            return Ok(());
        };

        match service.join() {
            Ok(Err(e)) => Err(e),
            _ => Err(Error::new("service manager error")),
        }
    }
}
