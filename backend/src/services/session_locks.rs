//! Per-session mutual exclusion for ingestion and stop.
//!
//! Two batches for the same session must not both read the same lap window and
//! then both claim the next lap number. Batches for different sessions never
//! contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::SessionId;

pub type SessionGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SessionId, Arc<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Waits for exclusive access to `session_id`. Held until the guard drops.
    pub async fn acquire(&self, session_id: SessionId) -> SessionGuard {
        let lock = self
            .registry()
            .entry(session_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drops registry entries nobody holds or waits on.
    pub fn release_idle(&self) {
        self.registry().retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_is_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let session = SessionId::new();

        let guard = locks.acquire(session).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(session).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquires after release")
            .expect("task");
    }

    #[tokio::test]
    async fn different_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let _first = locks.acquire(SessionId::new()).await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.acquire(SessionId::new())).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_released() {
        let locks = SessionLocks::new();
        let held = SessionId::new();

        let guard = locks.acquire(held).await;
        drop(locks.acquire(SessionId::new()).await);
        assert_eq!(locks.len(), 2);

        locks.release_idle();
        assert_eq!(locks.len(), 1);

        drop(guard);
        locks.release_idle();
        assert!(locks.is_empty());
    }
}
