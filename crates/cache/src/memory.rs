// vantage-cache/src/memory.rs
// ============================================================================
// Module: In-Memory Cache
// Description: A development/test-grade implementation of the Cache trait.
// Purpose: Provide correctness without a networked dependency.
// Dependencies: crate::Cache, tokio
// ============================================================================

//! ## Overview
//! Entries are held in a single `tokio::sync::Mutex`-guarded map. Expiry is
//! lazy: a key past its TTL is treated as absent on the next read and swept
//! opportunistically on write. This is sufficient for single-process
//! deployments and for exercising every other component's cache-dependent
//! logic in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::Cache;
use crate::CacheError;

// ============================================================================
// SECTION: Entry
// ============================================================================

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// SECTION: In-Memory Cache
// ============================================================================

/// An in-process `Cache` backed by a mutex-guarded hash map.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    /// Builds an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let hit = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        Ok(hit)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = self.entries.lock().await;
        let matched: Vec<String> = entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        for key in &matched {
            entries.remove(key);
        }
        Ok(matched.len() as u64)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                let current: i64 = String::from_utf8_lossy(&entry.value).parse().unwrap_or(0);
                let next = current + 1;
                entry.value = next.to_string().into_bytes();
                Ok(next)
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: b"1".to_vec(),
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = InMemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .expect("set succeeds");
        let value = cache.get("k").await.expect("get succeeds");
        assert_eq!(value, Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn expired_entry_reads_as_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("k", b"v".to_vec(), Duration::from_millis(1))
            .await
            .expect("set succeeds");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let value = cache.get("k").await.expect("get succeeds");
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn delete_by_prefix_removes_only_matching_keys() {
        let cache = InMemoryCache::new();
        for key in ["judgment:t1:r1:a", "judgment:t1:r1:b", "judgment:t1:r2:a"] {
            cache
                .set(key, b"x".to_vec(), Duration::from_secs(60))
                .await
                .expect("set succeeds");
        }
        let removed = cache
            .delete_by_prefix("judgment:t1:r1:")
            .await
            .expect("delete succeeds");
        assert_eq!(removed, 2);
        assert!(
            cache
                .get("judgment:t1:r2:a")
                .await
                .expect("get succeeds")
                .is_some()
        );
    }

    #[tokio::test]
    async fn incr_accumulates_within_window() {
        let cache = InMemoryCache::new();
        let ttl = Duration::from_secs(60);
        assert_eq!(cache.incr("ctr", ttl).await.expect("incr succeeds"), 1);
        assert_eq!(cache.incr("ctr", ttl).await.expect("incr succeeds"), 2);
    }
}
