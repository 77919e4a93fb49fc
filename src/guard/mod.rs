//! Per-state turn guard.
//!
//! At most one turn runs per state. The guard is advisory: callers acquire
//! before they touch state-scoped data and release when done, on success and
//! failure alike. A turn that never releases (a crashed request, a hung
//! generator call) is reclaimed by the sweeper once its lock is older than
//! the staleness threshold.
//!
//! ```text
//!   acquire ──▶ held ──▶ release ──▶ cleared
//!                 │
//!                 └── sweep (held longer than stale_after) ──▶ cleared
//! ```
//!
//! The [`TurnGuard`] trait is the seam for stricter implementations, such
//! as leases stored next to the snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::errors::GuardError;

/// Lock state of one state, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnLock {
    pub entity_id: String,
    pub held: bool,
    pub held_since: Option<DateTime<Utc>>,
}

/// Acquire/release/sweep contract for per-state turn locks.
pub trait TurnGuard: Send + Sync {
    /// Take the lock, or fail fast if a turn is already running.
    fn acquire(&self, entity_id: &str) -> Result<(), GuardError>;

    /// Clear the lock. Clearing a lock that is not held is a no-op.
    fn release(&self, entity_id: &str);

    /// Clear every lock held longer than `stale_after`; returns the reclaimed ids.
    fn sweep(&self, stale_after: Duration) -> Vec<String>;

    fn status(&self, entity_id: &str) -> TurnLock;
}

#[derive(Debug, Clone, Copy)]
struct Held {
    since: Instant,
    since_wall: DateTime<Utc>,
}

/// In-process advisory guard.
#[derive(Debug, Default)]
pub struct AdvisoryTurnGuard {
    locks: Mutex<HashMap<String, Held>>,
}

impl AdvisoryTurnGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn locks(&self) -> std::sync::MutexGuard<'_, HashMap<String, Held>> {
        // The map stays consistent even if a holder panicked mid-update
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TurnGuard for AdvisoryTurnGuard {
    fn acquire(&self, entity_id: &str) -> Result<(), GuardError> {
        let mut locks = self.locks();
        if locks.contains_key(entity_id) {
            return Err(GuardError::TurnInProgress {
                entity_id: entity_id.to_string(),
            });
        }
        locks.insert(
            entity_id.to_string(),
            Held {
                since: Instant::now(),
                since_wall: Utc::now(),
            },
        );
        tracing::debug!(entity_id, "turn lock acquired");
        Ok(())
    }

    fn release(&self, entity_id: &str) {
        if self.locks().remove(entity_id).is_some() {
            tracing::debug!(entity_id, "turn lock released");
        }
    }

    fn sweep(&self, stale_after: Duration) -> Vec<String> {
        let now = Instant::now();
        let mut locks = self.locks();
        let stale: Vec<String> = locks
            .iter()
            .filter(|(_, held)| now.duration_since(held.since) >= stale_after)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            locks.remove(id);
        }
        stale
    }

    fn status(&self, entity_id: &str) -> TurnLock {
        let held = self.locks().get(entity_id).copied();
        TurnLock {
            entity_id: entity_id.to_string(),
            held: held.is_some(),
            held_since: held.map(|h| h.since_wall),
        }
    }
}

/// A held turn lock that releases itself when dropped.
///
/// Moving the lease into the task that runs the turn ties the release to the
/// end of that task, whatever way it ends.
pub struct TurnLease {
    guard: Arc<dyn TurnGuard>,
    entity_id: String,
}

impl TurnLease {
    pub fn acquire(guard: Arc<dyn TurnGuard>, entity_id: &str) -> Result<Self, GuardError> {
        guard.acquire(entity_id)?;
        Ok(Self {
            guard,
            entity_id: entity_id.to_string(),
        })
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

impl Drop for TurnLease {
    fn drop(&mut self) {
        self.guard.release(&self.entity_id);
    }
}

impl std::fmt::Debug for TurnLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnLease")
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

/// Spawn the background sweeper. Runs until the returned handle is aborted.
pub fn spawn_sweeper(
    guard: Arc<dyn TurnGuard>,
    interval: Duration,
    stale_after: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reclaimed = guard.sweep(stale_after);
            if !reclaimed.is_empty() {
                tracing::warn!(
                    count = reclaimed.len(),
                    states = ?reclaimed,
                    "reclaimed stale turn locks"
                );
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> Arc<dyn TurnGuard> {
        Arc::new(AdvisoryTurnGuard::new())
    }

    // =========================================
    // acquire / release tests
    // =========================================

    #[test]
    fn test_second_acquire_conflicts() {
        let guard = AdvisoryTurnGuard::new();
        guard.acquire("e1").unwrap();
        let err = guard.acquire("e1").unwrap_err();
        assert_eq!(
            err,
            GuardError::TurnInProgress {
                entity_id: "e1".into()
            }
        );
        // Other states are independent
        guard.acquire("e2").unwrap();
    }

    #[test]
    fn test_release_allows_reacquire() {
        let guard = AdvisoryTurnGuard::new();
        guard.acquire("e1").unwrap();
        guard.release("e1");
        guard.acquire("e1").unwrap();
    }

    #[test]
    fn test_release_without_acquire_is_noop() {
        let guard = AdvisoryTurnGuard::new();
        guard.release("never");
        assert!(!guard.status("never").held);
    }

    #[test]
    fn test_status() {
        let guard = AdvisoryTurnGuard::new();
        let status = guard.status("e1");
        assert_eq!(
            status,
            TurnLock {
                entity_id: "e1".into(),
                held: false,
                held_since: None
            }
        );
        guard.acquire("e1").unwrap();
        let status = guard.status("e1");
        assert!(status.held);
        assert!(status.held_since.is_some());
    }

    // =========================================
    // lease tests
    // =========================================

    #[test]
    fn test_lease_releases_on_drop() {
        let guard = shared();
        {
            let lease = TurnLease::acquire(guard.clone(), "e1").unwrap();
            assert_eq!(lease.entity_id(), "e1");
            assert!(TurnLease::acquire(guard.clone(), "e1").is_err());
        }
        assert!(!guard.status("e1").held);
        assert!(TurnLease::acquire(guard, "e1").is_ok());
    }

    #[tokio::test]
    async fn test_lease_releases_when_task_panics() {
        let guard = shared();
        let lease = TurnLease::acquire(guard.clone(), "e1").unwrap();
        let handle = tokio::spawn(async move {
            let _lease = lease;
            panic!("stage blew up");
        });
        assert!(handle.await.is_err());
        assert!(!guard.status("e1").held);
    }

    // =========================================
    // sweep tests
    // =========================================

    #[tokio::test(start_paused = true)]
    async fn test_sweep_clears_only_stale_locks() {
        let guard = AdvisoryTurnGuard::new();
        guard.acquire("old").unwrap();
        tokio::time::advance(Duration::from_secs(601)).await;
        guard.acquire("fresh").unwrap();

        let reclaimed = guard.sweep(Duration::from_secs(600));
        assert_eq!(reclaimed, vec!["old".to_string()]);
        assert!(!guard.status("old").held);
        assert!(guard.status("fresh").held);

        // Reclaimed locks can be taken again
        guard.acquire("old").unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_reclaims_abandoned_lock() {
        let guard = shared();
        guard.acquire("e1").unwrap();

        let handle = spawn_sweeper(
            guard.clone(),
            Duration::from_secs(600),
            Duration::from_secs(600),
        );

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(guard.status("e1").held);

        tokio::time::sleep(Duration::from_secs(301)).await;
        // Let the sweeper task run after its tick
        tokio::task::yield_now().await;
        assert!(!guard.status("e1").held);
        assert!(guard.acquire("e1").is_ok());

        handle.abort();
    }
}
