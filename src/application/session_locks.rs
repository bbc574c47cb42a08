//! Per-session mutual exclusion.
//!
//! Messages for one session are processed one at a time; messages for
//! different sessions never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;

type LockMap = HashMap<SessionId, Arc<AsyncMutex<()>>>;

/// Registry handing out one async lock per session id.
///
/// Entries are dropped again once no caller holds or waits for them, so the
/// registry only grows with the number of sessions in flight.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds the lock for `session_id`.
    ///
    /// Cancelling the returned future while it waits still prunes the
    /// entry if nobody else references it.
    pub async fn acquire(&self, session_id: SessionId) -> SessionGuard {
        let lock = {
            let mut locks = self.map();
            Arc::clone(locks.entry(session_id).or_default())
        };
        let registration = Registration {
            session_id,
            locks: Arc::clone(&self.locks),
        };
        let guard = lock.lock_owned().await;

        SessionGuard {
            guard,
            registration,
        }
    }

    /// Number of sessions with a held or awaited lock.
    pub fn in_flight(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        lock_map(&self.locks)
    }
}

fn lock_map(locks: &Mutex<LockMap>) -> MutexGuard<'_, LockMap> {
    // The map stays consistent even if a holder panicked.
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes the registry entry on drop once only the registry references it.
///
/// Lives from the start of the wait until the guard is released, so both a
/// released guard and a cancelled wait clean up after themselves.
#[derive(Debug)]
struct Registration {
    session_id: SessionId,
    locks: Arc<Mutex<LockMap>>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut locks = lock_map(&self.locks);
        if let Some(lock) = locks.get(&self.session_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.session_id);
            }
        }
    }
}

/// Exclusive access to one session until dropped.
#[derive(Debug)]
pub struct SessionGuard {
    // Field order matters: the session lock is released before the
    // registration prunes.
    guard: OwnedMutexGuard<()>,
    registration: Registration,
}

impl SessionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.registration.session_id
    }
}
