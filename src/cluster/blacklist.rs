//! Time-bounded exclusion of failed endpoints.
//!
//! # Responsibilities
//! - Remember which endpoints failed and until when they stay excluded
//! - Answer "is this endpoint excluded right now?" without mutating
//! - Drop expired entries lazily on the next write
//!
//! # Design Decisions
//! - One entry per endpoint; a new failure overwrites the old expiry
//! - DashMap shards give per-key atomic replace without a global lock
//! - Monotonic `Instant` expiries, immune to wall-clock jumps
//! - Every query has an `_at` form taking `now` so expiry is testable
//! - An expiry past what `Instant` can represent is clamped, never a panic

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cluster::HostEndpoint;
use crate::observability::metrics;

/// Longest exclusion actually stored; larger timeouts are clamped to it.
pub const MAX_EXCLUSION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Shared blacklist of endpoints that recently failed.
///
/// Cloning is cheap and every clone observes the same entries.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    /// endpoint -> instant the exclusion ends.
    entries: Arc<DashMap<HostEndpoint, Instant>>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude `endpoint` for `timeout` starting now.
    pub fn record_failure(&self, endpoint: &HostEndpoint, timeout: Duration) -> Instant {
        self.record_failure_at(endpoint, timeout, Instant::now())
    }

    /// Exclude `endpoint` for `timeout` starting at `now`.
    ///
    /// Returns the expiry that was stored.
    pub fn record_failure_at(&self, endpoint: &HostEndpoint, timeout: Duration, now: Instant) -> Instant {
        self.prune_expired_at(now);

        let expiry = now
            .checked_add(timeout.min(MAX_EXCLUSION))
            .or_else(|| now.checked_add(Duration::from_secs(24 * 60 * 60)))
            .unwrap_or(now);
        self.entries.insert(endpoint.clone(), expiry);
        metrics::record_blacklist_size(self.entries.len());

        tracing::warn!(
            endpoint = %endpoint,
            blacklist_secs = timeout.as_secs(),
            "Endpoint blacklisted"
        );
        expiry
    }

    pub fn is_blacklisted(&self, endpoint: &HostEndpoint) -> bool {
        self.is_blacklisted_at(endpoint, Instant::now())
    }

    /// True while the endpoint's exclusion has not yet ended at `now`.
    pub fn is_blacklisted_at(&self, endpoint: &HostEndpoint, now: Instant) -> bool {
        self.entries
            .get(endpoint)
            .map(|expiry| *expiry > now)
            .unwrap_or(false)
    }

    /// Remove entries whose exclusion has ended.
    pub fn prune_expired_at(&self, now: Instant) {
        self.entries.retain(|_, expiry| *expiry > now);
    }

    /// Number of endpoints still excluded at `now`.
    pub fn active_count_at(&self, now: Instant) -> usize {
        self.entries.iter().filter(|e| *e.value() > now).count()
    }

    pub fn active_count(&self) -> usize {
        self.active_count_at(Instant::now())
    }

    /// Endpoints with an entry (expired ones included until pruned).
    pub fn endpoints(&self) -> Vec<HostEndpoint> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_after_timeout() {
        let blacklist = Blacklist::new();
        let ep = HostEndpoint::new("10.0.0.1", 8888);
        let t0 = Instant::now();

        blacklist.record_failure_at(&ep, Duration::from_secs(60), t0);

        assert!(blacklist.is_blacklisted_at(&ep, t0));
        assert!(blacklist.is_blacklisted_at(&ep, t0 + Duration::from_secs(59)));
        assert!(!blacklist.is_blacklisted_at(&ep, t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_new_failure_overwrites_expiry() {
        let blacklist = Blacklist::new();
        let ep = HostEndpoint::new("10.0.0.1", 8888);
        let t0 = Instant::now();

        blacklist.record_failure_at(&ep, Duration::from_secs(10), t0);
        let later = t0 + Duration::from_secs(5);
        let expiry = blacklist.record_failure_at(&ep, Duration::from_secs(10), later);

        assert_eq!(expiry, later + Duration::from_secs(10));
        assert_eq!(blacklist.endpoints().len(), 1);
        assert!(blacklist.is_blacklisted_at(&ep, t0 + Duration::from_secs(12)));
    }

    #[test]
    fn test_zero_timeout_never_excludes() {
        let blacklist = Blacklist::new();
        let ep = HostEndpoint::new("10.0.0.1", 8888);
        let t0 = Instant::now();

        blacklist.record_failure_at(&ep, Duration::ZERO, t0);
        assert!(!blacklist.is_blacklisted_at(&ep, t0));
    }

    #[test]
    fn test_huge_timeout_is_clamped() {
        let blacklist = Blacklist::new();
        let ep = HostEndpoint::new("10.0.0.1", 8888);
        let t0 = Instant::now();

        let expiry = blacklist.record_failure_at(&ep, Duration::from_secs(u64::MAX), t0);
        assert_eq!(expiry, t0 + MAX_EXCLUSION);
        assert!(blacklist.is_blacklisted_at(&ep, t0 + Duration::from_secs(365 * 24 * 60 * 60)));

        blacklist.record_failure_at(&ep, Duration::MAX, t0);
        assert!(blacklist.is_blacklisted_at(&ep, t0));
    }

    #[test]
    fn test_expired_entries_pruned_on_write() {
        let blacklist = Blacklist::new();
        let a = HostEndpoint::new("10.0.0.1", 8888);
        let b = HostEndpoint::new("10.0.0.2", 8888);
        let t0 = Instant::now();

        blacklist.record_failure_at(&a, Duration::from_secs(1), t0);
        blacklist.record_failure_at(&b, Duration::from_secs(1), t0 + Duration::from_secs(5));

        assert_eq!(blacklist.endpoints(), vec![b]);
    }

    #[test]
    fn test_clones_share_state() {
        let blacklist = Blacklist::new();
        let other = blacklist.clone();
        let ep = HostEndpoint::new("10.0.0.1", 8888);

        other.record_failure(&ep, Duration::from_secs(60));
        assert!(blacklist.is_blacklisted(&ep));
        assert_eq!(blacklist.active_count(), 1);
    }

    #[test]
    fn test_concurrent_writers() {
        let blacklist = Blacklist::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let bl = blacklist.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let ep = HostEndpoint::new("10.0.0.1", 8000 + (i % 2) as u16);
                        bl.record_failure(&ep, Duration::from_secs(60));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(blacklist.active_count(), 2);
    }
}
