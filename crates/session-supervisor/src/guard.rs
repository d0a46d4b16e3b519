//! Reconnection guard.
//!
//! At most one automatic reconnect may be in flight. The guard stores the id
//! of the attempt that holds it (0 when free). Acquiring is a single
//! compare-and-swap, so it happens before the supervisor yields. Releasing
//! only succeeds for the attempt that still owns the guard: after `Opened`
//! or a logged-out closure clears it, the superseded permit's drop is a no-op
//! and cannot free a newer attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const FREE: u64 = 0;

/// Shared reconnect guard.
#[derive(Debug, Clone, Default)]
pub struct ReconnectGuard {
    holder: Arc<AtomicU64>,
    next_attempt: Arc<AtomicU64>,
}

impl ReconnectGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard for a new attempt, or `None` if an attempt is in flight.
    pub fn try_acquire(&self) -> Option<ReconnectPermit> {
        let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed) + 1;
        self.holder
            .compare_exchange(FREE, attempt, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ReconnectPermit {
                holder: Arc::clone(&self.holder),
                attempt,
            })
    }

    /// Whether an attempt currently holds the guard.
    pub fn is_held(&self) -> bool {
        self.holder.load(Ordering::Acquire) != FREE
    }

    /// Release the guard regardless of which attempt holds it.
    pub fn clear(&self) {
        self.holder.store(FREE, Ordering::Release);
    }
}

/// Proof that one attempt owns the guard. Releases it on drop if still current.
#[derive(Debug)]
pub struct ReconnectPermit {
    holder: Arc<AtomicU64>,
    attempt: u64,
}

impl ReconnectPermit {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// False once the guard was cleared or handed to another attempt.
    pub fn is_current(&self) -> bool {
        self.holder.load(Ordering::Acquire) == self.attempt
    }
}

impl Drop for ReconnectPermit {
    fn drop(&mut self) {
        let _ = self.holder.compare_exchange(
            self.attempt,
            FREE,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_holder() {
        let guard = ReconnectGuard::new();
        let permit = guard.try_acquire().expect("free guard");
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());
        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_clear_supersedes_permit() {
        let guard = ReconnectGuard::new();
        let stale = guard.try_acquire().expect("free guard");
        guard.clear();
        assert!(!stale.is_current());

        let fresh = guard.try_acquire().expect("cleared guard");
        drop(stale);
        assert!(guard.is_held(), "stale permit must not release a newer attempt");
        assert!(fresh.is_current());
        drop(fresh);
        assert!(!guard.is_held());
    }

    #[test]
    fn test_attempt_ids_are_unique() {
        let guard = ReconnectGuard::new();
        let first = guard.try_acquire().expect("free guard").attempt();
        let second = guard.try_acquire().expect("released guard").attempt();
        assert_ne!(first, second);
    }

    #[test]
    fn test_clones_share_state() {
        let guard = ReconnectGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire().expect("free guard");
        assert!(other.is_held());
        other.clear();
        assert!(!guard.is_held());
    }
}
