//! Per-name mutual exclusion for artifact writes.
//!
//! Concurrent requests share one store. Two merges racing on `merged.txt`, or
//! a reset sweeping a file while a conversion rewrites it, would otherwise
//! interleave freely. [`NameLocks`] hands out one async mutex per artifact
//! name; a writer holds the [`NameGuard`] for the whole write (or
//! write-then-open) sequence and releases it on drop, on every exit path.
//!
//! Sequential callers keep last-writer-wins semantics: the lock orders
//! writers, it does not reject them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-name async mutexes.
#[derive(Debug, Default)]
pub struct NameLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Exclusive access to one artifact name. Released on drop.
#[derive(Debug)]
pub struct NameGuard {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

impl NameGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`.
    pub async fn lock(&self, name: &str) -> NameGuard {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on are only referenced by the map.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(name.to_string()).or_default())
        };
        NameGuard {
            name: name.to_string(),
            _guard: mutex.lock_owned().await,
        }
    }

    /// Number of names currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_name_is_exclusive() {
        let locks = Arc::new(NameLocks::new());
        let guard = locks.lock("merged.txt").await;
        assert_eq!(guard.name(), "merged.txt");

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.lock("merged.txt").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished(), "second lock must wait");

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_names_do_not_block() {
        let locks = NameLocks::new();
        let _a = locks.lock("a.txt").await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.lock("b.txt")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn released_names_are_pruned() {
        let locks = NameLocks::new();
        for i in 0..10 {
            let _g = locks.lock(&format!("{i}.txt")).await;
        }
        let _last = locks.lock("last.txt").await;
        assert_eq!(locks.tracked(), 1);
    }
}
