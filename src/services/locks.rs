use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-entity serialization points for read-modify-write on shared documents.
///
/// One async mutex per key, created on demand and forgotten once nobody holds
/// or waits on it. Callers that need both a meeting and its community take
/// the meeting lock first.
#[derive(Default)]
pub struct EntityLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn community(&self, community_id: &str) -> OwnedMutexGuard<()> {
        self.acquire(format!("community:{}", community_id)).await
    }

    pub async fn meeting(&self, meeting_id: &str) -> OwnedMutexGuard<()> {
        self.acquire(format!("meeting:{}", meeting_id)).await
    }

    async fn acquire(&self, key: String) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(&key).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(key, Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Number of keys currently held or awaited
    pub fn active(&self) -> usize {
        match self.locks.lock() {
            Ok(locks) => locks.values().filter(|w| w.strong_count() > 0).count(),
            Err(poisoned) => poisoned.into_inner().values().filter(|w| w.strong_count() > 0).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(EntityLocks::new());
        let guard = locks.meeting("m1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.meeting("m1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_independent() {
        let locks = EntityLocks::new();
        let _meeting = locks.meeting("x").await;
        let _community = locks.community("x").await;

        assert_eq!(locks.active(), 2);
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = EntityLocks::new();
        drop(locks.community("club").await);

        assert_eq!(locks.active(), 0);
    }
}
