use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::Mutex;
use tokio::time;

use crate::lock::{Error, KeyLock, LOCK_VALIDITY};

/// In-process lock layer holding one mutex per owning key. Waiters on the same key are served in
/// the order they arrived, different keys never contend.
#[derive(Clone, Default)]
pub struct SeggregatedLockLayer {
    keys: Arc<Mutex<HashMap<Address, Arc<Mutex<()>>>>>,
}

impl SeggregatedLockLayer {
    pub async fn lock_key(&self, address: Address, retry_timeout: Duration) -> Result<KeyLock, Error> {
        let key = {
            let mut keys = self.keys.lock().await;
            keys.entry(address).or_default().clone()
        };

        let guard = time::timeout(retry_timeout, key.lock_owned())
            .await
            .map_err(|_| Error::LockUnavailable(address))?;

        Ok(KeyLock::new(address, guard, LOCK_VALIDITY))
    }

    pub async fn count_keys(&self) -> usize {
        self.keys.lock().await.len()
    }
}
