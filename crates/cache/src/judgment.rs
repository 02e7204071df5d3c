// vantage-cache/src/judgment.rs
// ============================================================================
// Module: Judgment Result Cache
// Description: Hash-keyed caching of judgment evaluation results.
// Purpose: Give the judgment engine a TTL cache keyed by canonicalized input.
// Dependencies: crate::Cache, vantage-core::hashing
// ============================================================================

//! ## Overview
//! Judgment cache entries are keyed `judgment:{tenant_id}:{ruleset_id}:{hash}`
//! where `hash` is the first 32 hex characters of `sha256(canonical_json(input))`.
//! On promote or rollback, the deployment controller invalidates every entry
//! under the `judgment:{tenant_id}:{ruleset_id}:` prefix via
//! [`Cache::delete_by_prefix`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use vantage_core::RulesetId;
use vantage_core::TenantId;
use vantage_core::hashing::HashError;
use vantage_core::hashing::judgment_input_hash;

use crate::Cache;

/// Default judgment cache TTL: one hour, per the judgment engine design.
pub const DEFAULT_JUDGMENT_TTL: Duration = Duration::from_secs(3600);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while caching or retrieving a judgment result.
#[derive(Debug, Error)]
pub enum JudgmentCacheError {
    /// The input payload could not be canonicalized into a cache key.
    #[error("failed to compute cache key: {0}")]
    Key(#[from] HashError),
    /// The cached payload could not be serialized or deserialized.
    #[error("failed to (de)serialize cached judgment: {0}")]
    Codec(String),
}

// ============================================================================
// SECTION: Cached Entry
// ============================================================================

/// The payload stored for a cached judgment result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedJudgment<T> {
    /// The cached result value.
    pub result: T,
    /// The confidence recorded at cache time.
    pub confidence: f64,
    /// Unix-epoch seconds the entry was cached at.
    pub cached_at_epoch_secs: i64,
    /// The input hash this entry was stored under (for diagnostics).
    pub input_hash: String,
    /// The ruleset this result was produced for.
    pub ruleset_id: RulesetId,
}

// ============================================================================
// SECTION: Key Construction
// ============================================================================

/// Builds the cache key prefix for every entry belonging to a ruleset.
#[must_use]
pub fn ruleset_prefix(tenant_id: &TenantId, ruleset_id: &RulesetId) -> String {
    format!("judgment:{tenant_id}:{ruleset_id}:")
}

/// Builds the full cache key for a specific input payload.
///
/// # Errors
///
/// Returns [`JudgmentCacheError::Key`] when `input` cannot be canonicalized.
pub fn cache_key<T: Serialize + ?Sized>(
    tenant_id: &TenantId,
    ruleset_id: &RulesetId,
    input: &T,
) -> Result<String, JudgmentCacheError> {
    let hash = judgment_input_hash(input)?;
    Ok(format!("{}{hash}", ruleset_prefix(tenant_id, ruleset_id)))
}

// ============================================================================
// SECTION: Get / Set
// ============================================================================

/// Looks up a cached judgment result for the given input.
///
/// # Errors
///
/// Returns [`JudgmentCacheError`] when the key cannot be computed or the
/// stored payload cannot be decoded. Cache backend failures are swallowed to
/// a miss, per the component's fail-to-miss policy.
pub async fn get<T, I>(
    cache: &dyn Cache,
    tenant_id: &TenantId,
    ruleset_id: &RulesetId,
    input: &I,
) -> Result<Option<CachedJudgment<T>>, JudgmentCacheError>
where
    T: DeserializeOwned,
    I: Serialize + ?Sized,
{
    let key = cache_key(tenant_id, ruleset_id, input)?;
    let Ok(Some(bytes)) = cache.get(&key).await else {
        return Ok(None);
    };
    let decoded = serde_json::from_slice(&bytes).map_err(|err| JudgmentCacheError::Codec(err.to_string()))?;
    Ok(Some(decoded))
}

/// Stores a judgment result under its input-derived key with the given TTL.
///
/// # Errors
///
/// Returns [`JudgmentCacheError`] when the key or payload cannot be encoded.
/// Backend write failures are swallowed: a cache miss next time is
/// acceptable, a wrong result is not.
pub async fn set<T, I>(
    cache: &dyn Cache,
    tenant_id: &TenantId,
    ruleset_id: &RulesetId,
    input: &I,
    entry: &CachedJudgment<T>,
    ttl: Duration,
) -> Result<(), JudgmentCacheError>
where
    T: Serialize,
    I: Serialize + ?Sized,
{
    let key = cache_key(tenant_id, ruleset_id, input)?;
    let bytes = serde_json::to_vec(entry).map_err(|err| JudgmentCacheError::Codec(err.to_string()))?;
    let _ = cache.set(&key, bytes, ttl).await;
    Ok(())
}

/// Invalidates every cached judgment for a ruleset. Called by the deployment
/// controller on promote and rollback, before either returns to its caller.
pub async fn invalidate_ruleset(
    cache: &dyn Cache,
    tenant_id: &TenantId,
    ruleset_id: &RulesetId,
) -> u64 {
    let prefix = ruleset_prefix(tenant_id, ruleset_id);
    cache.delete_by_prefix(&prefix).await.unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCache;

    #[tokio::test]
    async fn cache_round_trips_by_canonical_input() {
        let cache = InMemoryCache::new();
        let tenant = TenantId::new("t1");
        let ruleset = RulesetId::new("r1");
        let input = serde_json::json!({"line": "L1", "value": 1});

        let miss = get::<serde_json::Value, _>(&cache, &tenant, &ruleset, &input)
            .await
            .expect("lookup succeeds");
        assert!(miss.is_none());

        let entry = CachedJudgment {
            result: serde_json::json!({"decision": "auto_execute"}),
            confidence: 0.9,
            cached_at_epoch_secs: 0,
            input_hash: judgment_input_hash(&input).expect("hashing succeeds"),
            ruleset_id: ruleset.clone(),
        };
        set(&cache, &tenant, &ruleset, &input, &entry, DEFAULT_JUDGMENT_TTL)
            .await
            .expect("set succeeds");

        let hit = get::<serde_json::Value, _>(&cache, &tenant, &ruleset, &input)
            .await
            .expect("lookup succeeds")
            .expect("entry present");
        assert_eq!(hit.result, entry.result);
    }

    #[tokio::test]
    async fn invalidate_ruleset_clears_only_that_ruleset() {
        let cache = InMemoryCache::new();
        let tenant = TenantId::new("t1");
        let r1 = RulesetId::new("r1");
        let r2 = RulesetId::new("r2");
        let input = serde_json::json!({"a": 1});

        for ruleset in [&r1, &r2] {
            let entry = CachedJudgment {
                result: serde_json::json!({}),
                confidence: 1.0,
                cached_at_epoch_secs: 0,
                input_hash: judgment_input_hash(&input).expect("hashing succeeds"),
                ruleset_id: ruleset.clone(),
            };
            set(&cache, &tenant, ruleset, &input, &entry, DEFAULT_JUDGMENT_TTL)
                .await
                .expect("set succeeds");
        }

        invalidate_ruleset(&cache, &tenant, &r1).await;

        assert!(
            get::<serde_json::Value, _>(&cache, &tenant, &r1, &input)
                .await
                .expect("lookup succeeds")
                .is_none()
        );
        assert!(
            get::<serde_json::Value, _>(&cache, &tenant, &r2, &input)
                .await
                .expect("lookup succeeds")
                .is_some()
        );
    }
}
