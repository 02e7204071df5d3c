// vantage-flags/src/lib.rs
// ============================================================================
// Module: Feature Flags (C14)
// Description: Tenant-override > global-override > percentage-rollout flag resolution.
// Purpose: Gate V2-style features (auto_execution, progressive_trust) per tenant.
// Dependencies: vantage-cache, vantage-core, md-5
// ============================================================================

//! ## Overview
//! Key hierarchy, per `spec.md` §4.12: explicit per-tenant override > global
//! override > percentage rollout. Percentage rollout buckets a tenant via
//! `md5(tenant_id || feature) mod 100`, matching the rollout bucketing of
//! `original_source/backend/app/services/feature_flag_service.py` exactly, so
//! that an externally-migrated tenant buckets identically. Absent any entry,
//! a feature is **off** — a cache failure must never turn a feature on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use md5::Digest;
use md5::Md5;
use vantage_cache::Cache;
use vantage_core::TenantId;

// ============================================================================
// SECTION: Feature Names
// ============================================================================

/// The flags the judgment and canary paths honor.
pub mod feature {
    /// Gates C8's trust-derived auto-execution path.
    pub const AUTO_EXECUTION: &str = "auto_execution";
    /// Gates C7's progressive trust model end to end.
    pub const PROGRESSIVE_TRUST: &str = "progressive_trust";
}

const PREFIX: &str = "feature_flag";
const DEFAULT_ROLLOUT: u8 = 0;

fn global_key(feature: &str) -> String {
    format!("{PREFIX}:{feature}:global")
}

fn tenant_key(feature: &str, tenant_id: &TenantId) -> String {
    format!("{PREFIX}:{feature}:tenant:{tenant_id}")
}

fn rollout_key(feature: &str) -> String {
    format!("{PREFIX}:{feature}:rollout")
}

// ============================================================================
// SECTION: Bucketing
// ============================================================================

/// Computes the deterministic rollout bucket `[0, 100)` for `(tenant_id, feature)`.
#[must_use]
pub fn rollout_bucket(tenant_id: &TenantId, feature: &str) -> u8 {
    let input = format!("{tenant_id}:{feature}");
    let digest = Md5::digest(input.as_bytes());
    let mut value: u128 = 0;
    for byte in digest {
        value = (value << 8) | u128::from(byte);
    }
    #[allow(clippy::cast_possible_truncation, reason = "value % 100 always fits in u8")]
    {
        (value % 100) as u8
    }
}

fn is_in_rollout(tenant_id: &TenantId, feature: &str, percentage: u8) -> bool {
    match percentage {
        0 => false,
        100 => true,
        percentage => rollout_bucket(tenant_id, feature) < percentage,
    }
}

// ============================================================================
// SECTION: Flag Client
// ============================================================================

/// Resolves feature flag state against a cache-backed store.
pub struct FeatureFlagClient<'a> {
    cache: &'a dyn Cache,
}

impl<'a> FeatureFlagClient<'a> {
    /// Builds a flag client over the given cache backend.
    #[must_use]
    pub fn new(cache: &'a dyn Cache) -> Self {
        Self { cache }
    }

    /// Resolves whether `feature` is enabled for `tenant_id`, following the
    /// tenant-override > global-override > rollout precedence. Any cache
    /// failure resolves to `false`.
    pub async fn is_enabled(&self, feature: &str, tenant_id: &TenantId) -> bool {
        if let Some(value) = self.read_bool(&tenant_key(feature, tenant_id)).await {
            return value;
        }
        if let Some(true) = self.read_bool(&global_key(feature)).await {
            return true;
        }
        let percentage = self.rollout_percentage(feature).await;
        is_in_rollout(tenant_id, feature, percentage)
    }

    /// Reads the current rollout percentage for `feature`, clamped to `[0, 100]`.
    pub async fn rollout_percentage(&self, feature: &str) -> u8 {
        match self.cache.get(&rollout_key(feature)).await {
            Ok(Some(bytes)) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|raw| raw.parse::<u16>().ok())
                .map_or(DEFAULT_ROLLOUT, |value| {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "value is clamped to 100 before the cast"
                    )]
                    {
                        value.min(100) as u8
                    }
                }),
            _ => DEFAULT_ROLLOUT,
        }
    }

    /// Sets the global override for `feature` to `enabled`.
    ///
    /// # Errors
    ///
    /// Returns the cache backend's error on write failure.
    pub async fn set_global(
        &self,
        feature: &str,
        enabled: bool,
    ) -> Result<(), vantage_cache::CacheError> {
        self.write_bool(&global_key(feature), enabled).await
    }

    /// Sets the per-tenant override for `feature` to `enabled`.
    ///
    /// # Errors
    ///
    /// Returns the cache backend's error on write failure.
    pub async fn set_tenant(
        &self,
        feature: &str,
        tenant_id: &TenantId,
        enabled: bool,
    ) -> Result<(), vantage_cache::CacheError> {
        self.write_bool(&tenant_key(feature, tenant_id), enabled).await
    }

    /// Sets the rollout percentage for `feature`, clamped to `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns the cache backend's error on write failure.
    pub async fn set_rollout_percentage(
        &self,
        feature: &str,
        percentage: u8,
    ) -> Result<(), vantage_cache::CacheError> {
        let clamped = percentage.min(100);
        self.cache
            .set(
                &rollout_key(feature),
                clamped.to_string().into_bytes(),
                std::time::Duration::from_secs(u64::MAX / 2),
            )
            .await
    }

    async fn read_bool(&self, key: &str) -> Option<bool> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => Some(bytes == b"1"),
            _ => None,
        }
    }

    async fn write_bool(&self, key: &str, value: bool) -> Result<(), vantage_cache::CacheError> {
        let bytes = if value { b"1".to_vec() } else { b"0".to_vec() };
        self.cache
            .set(key, bytes, std::time::Duration::from_secs(u64::MAX / 2))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_cache::memory::InMemoryCache;

    #[test]
    fn rollout_bucket_is_deterministic() {
        let tenant = TenantId::new("acme");
        let first = rollout_bucket(&tenant, feature::AUTO_EXECUTION);
        let second = rollout_bucket(&tenant, feature::AUTO_EXECUTION);
        assert_eq!(first, second);
        assert!(first < 100);
    }

    #[tokio::test]
    async fn absent_entries_resolve_to_disabled() {
        let cache = InMemoryCache::new();
        let client = FeatureFlagClient::new(&cache);
        let tenant = TenantId::new("acme");
        assert!(!client.is_enabled(feature::PROGRESSIVE_TRUST, &tenant).await);
    }

    #[tokio::test]
    async fn tenant_override_takes_precedence_over_global() {
        let cache = InMemoryCache::new();
        let client = FeatureFlagClient::new(&cache);
        let tenant = TenantId::new("acme");
        client
            .set_global(feature::AUTO_EXECUTION, true)
            .await
            .expect("set succeeds");
        client
            .set_tenant(feature::AUTO_EXECUTION, &tenant, false)
            .await
            .expect("set succeeds");
        assert!(!client.is_enabled(feature::AUTO_EXECUTION, &tenant).await);
    }

    #[tokio::test]
    async fn full_rollout_enables_every_tenant() {
        let cache = InMemoryCache::new();
        let client = FeatureFlagClient::new(&cache);
        client
            .set_rollout_percentage(feature::AUTO_EXECUTION, 100)
            .await
            .expect("set succeeds");
        for name in ["t1", "t2", "t3"] {
            let tenant = TenantId::new(name);
            assert!(client.is_enabled(feature::AUTO_EXECUTION, &tenant).await);
        }
    }
}
