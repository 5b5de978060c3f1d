//! Per-claim serialization.
//!
//! Concurrent votes on the same claim, or a vote racing a resolution
//! sweep, must not interleave their read-modify-write cycles. Updates to
//! different claims proceed independently, so the discipline is a lock
//! per run id rather than a global lock. Entries are never removed:
//! claims are never deleted and the map grows with the claim count.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a key, creating it on first use.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
