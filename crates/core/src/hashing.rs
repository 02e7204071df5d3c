// vantage-core/src/hashing.rs
// ============================================================================
// Module: Canonical Hashing
// Description: RFC 8785 JSON canonicalization and content hashing utilities.
// Purpose: Provide deterministic hashes for cache keys, assignments, and audit trails.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! The control plane hashes all canonical JSON using RFC 8785 (JCS) so that
//! judgment cache keys and feedback sample dedup hashes are stable across
//! process restarts and languages. Binary payloads are hashed directly over
//! raw bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Hash Algorithm
// ============================================================================

/// Supported hash algorithms for control-plane artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing (default).
    Sha256,
}

/// Default hash algorithm.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }

    /// Returns the digest truncated to `len` hex characters.
    ///
    /// Used for cache keys, where a full 64-character SHA-256 digest would be
    /// needlessly long.
    #[must_use]
    pub fn truncated(&self, len: usize) -> &str {
        let end = len.min(self.value.len());
        &self.value[..end]
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes canonical JSON using the provided algorithm.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn hash_canonical_json<T: Serialize + ?Sized>(
    algorithm: HashAlgorithm,
    value: &T,
) -> Result<HashDigest, HashError> {
    let bytes = canonical_json_bytes(value)?;
    Ok(hash_bytes(algorithm, &bytes))
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(bytes);
            let digest = hasher.finalize();
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Computes the 32-character judgment cache input hash: the first 32 hex
/// characters of `sha256(canonical_json(input))`.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when `input` cannot be canonicalized.
pub fn judgment_input_hash<T: Serialize + ?Sized>(input: &T) -> Result<String, HashError> {
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, input)?;
    Ok(digest.truncated(32).to_string())
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_hash_is_stable_across_key_order() {
        let a = serde_json::json!({"b": 1, "a": 2});
        let b = serde_json::json!({"a": 2, "b": 1});
        let ha = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &a).unwrap_or_else(|_| {
            HashDigest::new(DEFAULT_HASH_ALGORITHM, &[])
        });
        let hb = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &b).unwrap_or_else(|_| {
            HashDigest::new(DEFAULT_HASH_ALGORITHM, &[])
        });
        assert_eq!(ha, hb);
    }

    #[test]
    fn judgment_hash_is_32_chars() {
        let input = serde_json::json!({"line": "L1", "value": 42});
        let hash = judgment_input_hash(&input).expect("hashing succeeds");
        assert_eq!(hash.len(), 32);
    }
}
