//! Fixed-size session pool with pinned slot assignment
//!
//! Each session lives in its own slot behind an async mutex. Callers acquire a
//! slot by index (`index % size`); the returned lease is exclusive, so a slot
//! shared by several identifiers in one batch is used by them one at a time.

use crate::session::Session;
use crate::{HarvestError, SessionError, SessionResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Exclusive access to one pooled session
pub type SessionLease<S> = OwnedMutexGuard<S>;

/// Owns the run's sessions for their whole lifetime
pub struct SessionPool<S: Session> {
    slots: Vec<Arc<Mutex<S>>>,
    released: bool,
}

impl<S: Session> SessionPool<S> {
    /// Starts `size` sessions, failing fast if any of them cannot be started
    ///
    /// The factory receives the slot index. If starting slot `i` fails, the
    /// sessions already started for slots `0..i` are closed before the error is
    /// returned.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionPool)` - All sessions started
    /// * `Err(HarvestError::SessionInit)` - A session failed to start
    pub async fn launch<F, Fut>(size: usize, mut factory: F) -> Result<Self, HarvestError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = SessionResult<S>>,
    {
        if size == 0 {
            return Err(HarvestError::SessionInit {
                index: 0,
                source: SessionError::Launch("pool size must be at least 1".to_string()),
            });
        }

        let mut sessions = Vec::with_capacity(size);

        for index in 0..size {
            match factory(index).await {
                Ok(session) => {
                    tracing::debug!("Session {} started", index);
                    sessions.push(session);
                }
                Err(source) => {
                    tracing::error!("Session {} failed to start: {}", index, source);
                    for (started, mut session) in sessions.into_iter().enumerate() {
                        if let Err(e) = session.close().await {
                            tracing::warn!("Failed to close session {}: {}", started, e);
                        }
                    }
                    return Err(HarvestError::SessionInit { index, source });
                }
            }
        }

        tracing::info!("Session pool ready with {} sessions", size);
        Ok(Self::from_sessions(sessions))
    }

    /// Wraps already started sessions
    pub fn from_sessions(sessions: Vec<S>) -> Self {
        Self {
            slots: sessions
                .into_iter()
                .map(|session| Arc::new(Mutex::new(session)))
                .collect(),
            released: false,
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Slot pinned to the given position
    pub fn slot_for(&self, position: usize) -> usize {
        position % self.slots.len()
    }

    /// Waits for exclusive use of the session pinned to `index`
    pub async fn acquire(&self, index: usize) -> SessionLease<S> {
        let slot = self.slot_for(index);
        self.slots[slot].clone().lock_owned().await
    }

    /// Closes every session exactly once
    ///
    /// Consumes the pool. Close failures are logged and counted but never
    /// stop the remaining sessions from being closed.
    ///
    /// # Returns
    ///
    /// The number of sessions that closed cleanly
    pub async fn release_all(mut self) -> usize {
        let mut closed = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            let mut session = slot.lock().await;
            match session.close().await {
                Ok(()) => closed += 1,
                Err(e) => tracing::warn!("Failed to close session {}: {}", index, e),
            }
        }

        self.released = true;
        tracing::info!("Released {}/{} sessions", closed, self.slots.len());
        closed
    }
}

impl<S: Session> Drop for SessionPool<S> {
    fn drop(&mut self) {
        if !self.released && !self.slots.is_empty() {
            tracing::warn!(
                "Session pool dropped without release_all; {} sessions were not closed",
                self.slots.len()
            );
        }
    }
}
