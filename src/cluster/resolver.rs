//! Host pool resolution.
//!
//! # Responsibilities
//! - Hold the configured primary and failover pools in priority order
//! - Pick the first endpoint that is not currently blacklisted
//!
//! # Design Decisions
//! - Order is fixed: every primary entry before any failover entry
//! - Selection is a pure read; only the dispatcher writes the blacklist
//! - An endpoint listed twice is tried once, at its first position

use std::time::Instant;

use crate::cluster::{Blacklist, HostEndpoint};

/// Ordered candidate list: primary pool, then failover pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPool {
    endpoints: Vec<HostEndpoint>,
    primary_len: usize,
}

impl HostPool {
    pub fn new(primary: &[HostEndpoint], failover: &[HostEndpoint]) -> Self {
        let mut endpoints: Vec<HostEndpoint> = Vec::with_capacity(primary.len() + failover.len());
        let mut primary_len = 0;

        for (i, ep) in primary.iter().chain(failover.iter()).enumerate() {
            if endpoints.contains(ep) {
                continue;
            }
            endpoints.push(ep.clone());
            if i < primary.len() {
                primary_len += 1;
            }
        }

        Self {
            endpoints,
            primary_len,
        }
    }

    /// All distinct endpoints in selection order.
    pub fn endpoints(&self) -> &[HostEndpoint] {
        &self.endpoints
    }

    pub fn is_primary(&self, endpoint: &HostEndpoint) -> bool {
        self.endpoints[..self.primary_len].contains(endpoint)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// First endpoint of `pool` not blacklisted at `now`, or `None` when every
/// endpoint is excluded.
pub fn next_candidate(pool: &[HostEndpoint], blacklist: &Blacklist, now: Instant) -> Option<HostEndpoint> {
    pool.iter()
        .find(|ep| !blacklist.is_blacklisted_at(ep, now))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ep(port: u16) -> HostEndpoint {
        HostEndpoint::new("127.0.0.1", port)
    }

    #[test]
    fn test_primary_preferred() {
        let pool = HostPool::new(&[ep(1), ep(2)], &[ep(3)]);
        let blacklist = Blacklist::new();
        let now = Instant::now();

        assert_eq!(next_candidate(pool.endpoints(), &blacklist, now), Some(ep(1)));
    }

    #[test]
    fn test_skips_blacklisted_in_order() {
        let pool = HostPool::new(&[ep(1), ep(2)], &[ep(3)]);
        let blacklist = Blacklist::new();
        let now = Instant::now();

        blacklist.record_failure_at(&ep(1), Duration::from_secs(60), now);
        assert_eq!(next_candidate(pool.endpoints(), &blacklist, now), Some(ep(2)));

        blacklist.record_failure_at(&ep(2), Duration::from_secs(60), now);
        assert_eq!(next_candidate(pool.endpoints(), &blacklist, now), Some(ep(3)));
    }

    #[test]
    fn test_primary_back_after_expiry() {
        let pool = HostPool::new(&[ep(1)], &[ep(2)]);
        let blacklist = Blacklist::new();
        let now = Instant::now();

        // primary failed earlier than failover, but is eligible again first
        blacklist.record_failure_at(&ep(1), Duration::from_secs(10), now);
        blacklist.record_failure_at(&ep(2), Duration::from_secs(60), now + Duration::from_secs(5));

        let later = now + Duration::from_secs(11);
        assert_eq!(next_candidate(pool.endpoints(), &blacklist, later), Some(ep(1)));
    }

    #[test]
    fn test_none_when_all_blacklisted() {
        let pool = HostPool::new(&[ep(1)], &[ep(2)]);
        let blacklist = Blacklist::new();
        let now = Instant::now();

        for e in pool.endpoints() {
            blacklist.record_failure_at(e, Duration::from_secs(60), now);
        }
        assert_eq!(next_candidate(pool.endpoints(), &blacklist, now), None);
    }

    #[test]
    fn test_duplicates_collapse() {
        let pool = HostPool::new(&[ep(8888)], &[ep(8888), ep(9999)]);
        assert_eq!(pool.endpoints(), &[ep(8888), ep(9999)]);
        assert!(pool.is_primary(&ep(8888)));
        assert!(!pool.is_primary(&ep(9999)));
    }

    #[test]
    fn test_empty_pool() {
        let pool = HostPool::new(&[], &[]);
        assert!(pool.is_empty());
        assert_eq!(next_candidate(pool.endpoints(), &Blacklist::new(), Instant::now()), None);
    }
}
