use crate::error::{Result, TreasuryError};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed mutex registry used for per-safe, per-payment, and per-fee
/// serialization.
///
/// Acquisition is bounded: a caller that cannot take the lock within the
/// timeout gets `Busy` and may retry, since every operation is all-or-nothing.
/// Callers that need several keys must acquire them in ascending key order.
///
/// Entries whose mutex is neither held nor waited on are evicted on the next
/// acquisition, so the map tracks the keys currently in use rather than every
/// key ever touched.
pub struct LockRegistry<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl<K: Eq + Hash + Copy> LockRegistry<K> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub async fn acquire(&self, key: K) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // A strong count of 1 means no guard is held and no task is
            // waiting, so the entry can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key).or_default())
        };
        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| TreasuryError::Busy(self.timeout))
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Acquires the given keys in ascending order, the fixed global order
    /// that keeps multi-key holders deadlock free.
    pub async fn acquire_ordered(&self, mut keys: Vec<K>) -> Result<Vec<OwnedMutexGuard<()>>>
    where
        K: Ord,
    {
        keys.sort_unstable();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key).await?);
        }
        Ok(guards)
    }
}
