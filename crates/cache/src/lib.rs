// vantage-cache/src/lib.rs
// ============================================================================
// Module: Cache
// Description: TTL key/value store with judgment-result caching and rate limiting.
// Purpose: Give every other component a pluggable, fail-to-miss cache backend.
// Dependencies: vantage-core, async-trait, tokio
// ============================================================================

//! ## Overview
//! The cache is a TTL key/value store exposing `get/set/delete/delete_by_prefix`
//! plus a rate-limit counter operation. The backing store is pluggable — an
//! in-memory implementation is provided for development and tests; production
//! deployments point at a networked key/value store through the same trait.
//! Cache correctness never depends on persistence: every failure degrades to
//! a miss, never to a stale or incorrect result.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod judgment;
pub mod memory;
pub mod rate_limit;

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Cache-layer errors.
///
/// Per the ordering guarantees, callers must treat every [`CacheError`] as a
/// cache miss; nothing in this crate ever surfaces a stale value.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store is unreachable or returned an unexpected error.
    #[error("cache backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Cache Trait
// ============================================================================

/// A TTL-bounded key/value store.
///
/// Implementations must be safe to call concurrently from many tasks; no
/// suspension point here may exceed the 100ms cache timeout budget declared
/// for the control plane.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetches a value by key, returning `Ok(None)` on miss.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend itself fails; callers should
    /// treat this identically to a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores a value with the given time-to-live.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on backend failure.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Deletes a single key.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on backend failure.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Deletes every key sharing the given prefix.
    ///
    /// Used by the deployment controller to invalidate
    /// `judgment:{tenant_id}:{ruleset_id}:` on promote/rollback.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on backend failure.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Atomically increments a counter key, creating it with the given TTL
    /// if absent, and returns the post-increment value.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] on backend failure.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;
}
