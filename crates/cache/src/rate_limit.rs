// vantage-cache/src/rate_limit.rs
// ============================================================================
// Module: Rate Limit
// Description: The single-tenant flow-control primitive built on the Cache trait.
// Purpose: Let the orchestrator gate `(tenant_id, endpoint)` request volume.
// Dependencies: crate::Cache
// ============================================================================

//! ## Overview
//! `rate_limit_check` is a fixed-window counter: the first call in a window
//! creates the counter with the window's TTL, subsequent calls within the
//! window increment it, and the window resets once the TTL lapses. A cache
//! backend failure is treated as "allow" — rate limiting is a convenience,
//! not a correctness boundary, and must never itself become an outage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::Cache;

// ============================================================================
// SECTION: Rate Limit Check
// ============================================================================

/// Checks and records one request against a fixed-window rate limit.
///
/// Returns `true` when the request is allowed. Cache backend errors fail
/// open (`true`), matching the "never block on cache" policy.
pub async fn rate_limit_check(
    cache: &dyn Cache,
    key: &str,
    max_requests: u64,
    window: Duration,
) -> bool {
    match cache.incr(key, window).await {
        Ok(count) => count as u64 <= max_requests,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCache;

    #[tokio::test]
    async fn allows_up_to_the_limit_then_denies() {
        let cache = InMemoryCache::new();
        let window = Duration::from_secs(60);
        for _ in 0..3 {
            assert!(rate_limit_check(&cache, "t1:judgment/execute", 3, window).await);
        }
        assert!(!rate_limit_check(&cache, "t1:judgment/execute", 3, window).await);
    }

    #[tokio::test]
    async fn distinct_keys_have_independent_budgets() {
        let cache = InMemoryCache::new();
        let window = Duration::from_secs(60);
        assert!(rate_limit_check(&cache, "t1:ep", 1, window).await);
        assert!(rate_limit_check(&cache, "t2:ep", 1, window).await);
    }
}
