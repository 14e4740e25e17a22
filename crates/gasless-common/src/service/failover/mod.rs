use std::sync::Arc;
use std::time::Duration;

use failsafe::backoff::Exponential;
use failsafe::failure_policy::{consecutive_failures, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker;
pub use failsafe::FailurePredicate;
use failsafe::{backoff, Config, StateMachine};
use futures_core::TryFuture;

pub type Error<E> = failsafe::Error<E>;
type FailurePolicy = ConsecutiveFailures<Exponential>;

/// One endpoint guarded by its own circuit breaker. Three consecutive failures open the breaker for 10s,
/// doubling up to 60s while the endpoint keeps failing.
struct Endpoint<T> {
    value: Arc<T>,
    breaker: StateMachine<FailurePolicy, ()>,
}

impl<T> Clone for Endpoint<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            breaker: self.breaker.clone(),
        }
    }
}

impl<E, T: FailurePredicate<E>> FailurePredicate<E> for &Endpoint<T> {
    fn is_err(&self, err: &E) -> bool {
        self.value.is_err(err)
    }
}

impl<T> Endpoint<T> {
    fn new(value: T) -> Self {
        Self {
            value: Arc::new(value),
            breaker: Config::new()
                .failure_policy(consecutive_failures(3, backoff::exponential(Duration::from_secs(10), Duration::from_secs(60))))
                .build(),
        }
    }

    fn is_available(&self) -> bool {
        self.breaker.is_call_permitted()
    }

    async fn call<F>(&self, f: impl FnOnce(Arc<T>) -> F) -> Result<F::Ok, Error<F::Error>>
    where
        F: TryFuture,
        T: FailurePredicate<F::Error>,
    {
        self.breaker.call_with(self, f(self.value.clone())).await
    }
}

/// Ordered list of interchangeable endpoints (the primary first, then the fallbacks). Calls go to the
/// first endpoint whose circuit breaker is closed. Only errors for which `T` reports
/// [`FailurePredicate::is_err`] count against an endpoint, so business errors such as a reverted call
/// never trip the breaker.
pub struct Failover<T> {
    endpoints: Vec<Endpoint<T>>,
}

impl<T> Clone for Failover<T> {
    fn clone(&self) -> Self {
        Self {
            endpoints: self.endpoints.clone(),
        }
    }
}

impl<T> Default for Failover<T> {
    fn default() -> Self {
        Self { endpoints: vec![] }
    }
}

impl<T> Failover<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, endpoint: T) -> Self {
        self.endpoints.push(Endpoint::new(endpoint));
        self
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Run `f` once against the first available endpoint and return its outcome, whatever it is.
    /// Returns [`Error::Rejected`] when every breaker is open.
    pub async fn call<F>(&self, f: impl FnOnce(Arc<T>) -> F) -> Result<F::Ok, Error<F::Error>>
    where
        F: TryFuture,
        T: FailurePredicate<F::Error>,
    {
        match self.endpoints.iter().find(|x| x.is_available()) {
            Some(endpoint) => endpoint.call(f).await,
            None => Err(Error::Rejected),
        }
    }

    /// Run `f` against every available endpoint in order until one succeeds. The last error is
    /// returned when they all fail.
    pub async fn call_all<F>(&self, f: impl Fn(Arc<T>) -> F) -> Result<F::Ok, Error<F::Error>>
    where
        F: TryFuture,
        T: FailurePredicate<F::Error>,
    {
        let mut last_error = Error::Rejected;
        for endpoint in self.endpoints.iter().filter(|x| x.is_available()) {
            match endpoint.call(&f).await {
                Ok(value) => return Ok(value),
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }
}
