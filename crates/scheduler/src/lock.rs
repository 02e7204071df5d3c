// vantage-scheduler/src/lock.rs
// ============================================================================
// Module: Driver Lease
// Description: Cheap per-driver-name distributed lock built on the Cache trait.
// Purpose: Ensure two replicas never run the same driver concurrently.
// Dependencies: vantage-cache::Cache
// ============================================================================

//! ## Overview
//! Grounded on spec.md §4.10's closing line: "a cheap distributed lock (per
//! driver name) is used when multiple replicas exist." A lease is acquired
//! with `Cache::incr`: the first caller in the TTL window sees a post-
//! increment count of 1 and holds the lease for that window; every other
//! caller sees `> 1` and skips this tick. This mirrors
//! `vantage-cache::rate_limit::rate_limit_check`'s first-past-the-post
//! idiom rather than inventing a new primitive.

use std::time::Duration;

use vantage_cache::Cache;

const LOCK_KEY_PREFIX: &str = "scheduler:lock:";

/// Attempts to acquire the named driver's lease for `lease_ttl`. Returns
/// `true` when the caller should run this tick; a cache failure fails
/// closed (returns `false`) since running a driver twice concurrently is
/// worse than skipping a tick.
pub async fn try_acquire(cache: &dyn Cache, driver_name: &str, lease_ttl: Duration) -> bool {
    let key = format!("{LOCK_KEY_PREFIX}{driver_name}");
    match cache.incr(&key, lease_ttl).await {
        Ok(count) => count == 1,
        Err(error) => {
            tracing::warn!(driver_name, %error, "lease acquisition failed; skipping this tick");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_cache::memory::InMemoryCache;

    #[tokio::test]
    async fn only_the_first_caller_in_the_window_acquires_the_lease() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(30);
        assert!(try_acquire(&cache, "canary_monitor", ttl).await);
        assert!(!try_acquire(&cache, "canary_monitor", ttl).await);
    }

    #[tokio::test]
    async fn distinct_drivers_have_independent_leases() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(30);
        assert!(try_acquire(&cache, "canary_monitor", ttl).await);
        assert!(try_acquire(&cache, "trust_reevaluator", ttl).await);
    }
}
