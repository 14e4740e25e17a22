use std::time::{Duration, Instant};

use alloy::primitives::Address;
use gasless_common::{measure_duration, metric};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

use crate::lock::seggregated::SeggregatedLockLayer;

pub mod seggregated;

/// Maximum time a key may stay locked before the holder must give it back
pub const LOCK_VALIDITY: Duration = Duration::from_secs(180);

#[derive(Error, Debug)]
pub enum Error {
    #[error("lock on {0} is unavailable")]
    LockUnavailable(Address),
}

fn default_retry_timeout() -> Duration {
    Duration::from_secs(30)
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockLayerConfiguration {
    /// How long a pipeline waits for the key before giving up
    #[serde_as(as = "serde_with::DurationSeconds")]
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout: Duration,
}

impl Default for LockLayerConfiguration {
    fn default() -> Self {
        Self {
            retry_timeout: default_retry_timeout(),
        }
    }
}

/// Exclusive ownership of an owning key. The key is released when the lock is dropped.
#[derive(Debug)]
pub struct KeyLock {
    expiry: Instant,

    pub address: Address,
    _guard: OwnedMutexGuard<()>,
}

impl KeyLock {
    pub fn new(address: Address, guard: OwnedMutexGuard<()>, validity: Duration) -> Self {
        Self {
            expiry: Instant::now() + validity,
            address,
            _guard: guard,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expiry
    }
}

#[derive(Clone)]
pub struct LockLayer {
    retry_timeout: Duration,
    layer: SeggregatedLockLayer,
}

impl LockLayer {
    pub fn new(configuration: &LockLayerConfiguration) -> Self {
        Self {
            retry_timeout: configuration.retry_timeout,
            layer: SeggregatedLockLayer::default(),
        }
    }

    pub async fn lock_key(&self, address: Address) -> Result<KeyLock, Error> {
        let (result, duration) = measure_duration!(self.layer.lock_key(address, self.retry_timeout).await);

        metric!(counter[relayer_request] = 1, method = "lock_key");
        metric!(histogram[relayer_request_duration_milliseconds] = duration.as_millis(), method = "lock_key");
        metric!(on error result => counter [ relayer_request_error ] = 1, method = "lock_key");

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy::primitives::address;

    use crate::lock::{LockLayer, LockLayerConfiguration};

    #[test]
    fn retry_timeout_is_read_in_seconds() {
        let configuration: LockLayerConfiguration = serde_json::from_value(serde_json::json!({ "retry_timeout": 7 })).unwrap();

        assert_eq!(configuration.retry_timeout, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn lock_is_released_when_dropped() {
        let layer = LockLayer::new(&LockLayerConfiguration {
            retry_timeout: Duration::from_millis(50),
        });
        let owner = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

        // Given
        let lock = layer.lock_key(owner).await.unwrap();
        assert!(!lock.is_expired());

        // When
        drop(lock);

        // Then
        assert!(layer.lock_key(owner).await.is_ok());
    }
}
