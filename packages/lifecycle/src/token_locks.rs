//! Serializing locks keyed by token number.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

/// Registry of per-token mutation locks.
///
/// Every mutation entry point for a token's jobs acquires the token's lock
/// for the whole read-jobs / delete-files / commit-status critical section,
/// so at most one mutation per token is in flight. Guards release on drop,
/// including every error path.
pub struct TokenLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TokenLocks {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for a token, waiting behind any in-flight mutation.
    pub async fn acquire(&self, token: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            // prune entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(token.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tokens currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TokenLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_token_serializes() {
        let locks = Arc::new(TokenLocks::new());
        let active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("T7K2M9").await;
                let inside = active.fetch_add(1, Ordering::SeqCst);
                assert_eq!(inside, 0, "two critical sections overlapped");
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_tokens_run_concurrently() {
        let locks = TokenLocks::new();
        let guard_a = locks.acquire("AAA111").await;
        // acquiring a different token's lock must not block
        let _guard_b = tokio::time::timeout(Duration::from_secs(1), locks.acquire("BBB222"))
            .await
            .expect("distinct tokens should not contend");
        drop(guard_a);
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = TokenLocks::new();
        {
            let _guard = locks.acquire("AAA111").await;
            assert_eq!(locks.len(), 1);
        }
        let _guard = locks.acquire("BBB222").await;
        assert_eq!(locks.len(), 1);
    }
}
