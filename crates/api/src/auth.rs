// vantage-api/src/auth.rs
// ============================================================================
// Module: Bearer Authentication
// Description: Resolves a bearer credential to (user_id, tenant_id, role).
// Purpose: Give every mutating endpoint a fail-closed caller identity.
// Dependencies: axum, sha2, vantage-access, vantage-core
// ============================================================================

//! ## Overview
//! Generalized from the teacher's `auth.rs` `RequestContext`/`ToolAuthz`
//! split: parsing and fingerprinting the `Authorization` header is kept
//! exactly as the teacher does it (scheme check, sha256 fingerprint for
//! logging, never the raw token), but resolution now maps a token to a
//! control-plane identity `(user_id, tenant_id, role)` per spec.md §6,
//! rather than to a transport-local `AuthMethod`. Every token is
//! provisioned out of band (`VANTAGE_API_TOKENS`); there is no login flow.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sha2::Digest;
use sha2::Sha256;
use vantage_access::Role;
use vantage_core::TenantId;
use vantage_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

/// One provisioned bearer credential.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The caller's user id.
    pub user_id: UserId,
    /// The tenant the caller acts within.
    pub tenant_id: TenantId,
    /// The caller's role, checked against C5's permission matrix.
    pub role: Role,
}

/// The provisioned token table: `sha256(token) -> Principal`. Tokens
/// themselves are never retained once hashed, matching the teacher's
/// fingerprint-not-secret logging discipline.
#[derive(Debug, Clone, Default)]
pub struct TokenTable(BTreeMap<String, Principal>);

impl TokenTable {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Registers `token` (plaintext, hashed immediately) for `principal`.
    pub fn insert(&mut self, token: &str, principal: Principal) {
        self.0.insert(fingerprint(token), principal);
    }

    fn resolve(&self, token: &str) -> Option<&Principal> {
        self.0.get(&fingerprint(token))
    }
}

fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{digest:x}")
}

fn parse_bearer_token(header: Option<&str>) -> Result<&str, ApiError> {
    let header = header.ok_or_else(|| unauthenticated("missing authorization header"))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(unauthenticated("authorization header too large"));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(unauthenticated("invalid authorization header"));
    }
    Ok(token)
}

fn unauthenticated(message: &str) -> ApiError {
    ApiError::new(vantage_core::error::ErrorCategory::Auth, message.to_string())
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
        let token = parse_bearer_token(header)?;
        state.tokens.resolve(token).cloned().ok_or_else(|| unauthenticated("invalid bearer token"))
    }
}

/// Extracts `Arc<AppState>` directly, for handlers that need store/config
/// access without caring about the caller's identity (health checks).
pub type SharedState = State<Arc<AppState>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_must_use_the_bearer_scheme() {
        let result = parse_bearer_token(Some("Basic abc123"));
        assert!(result.is_err());
    }

    #[test]
    fn bearer_header_rejects_empty_token() {
        let result = parse_bearer_token(Some("Bearer "));
        assert!(result.is_err());
    }

    #[test]
    fn bearer_header_accepts_case_insensitive_scheme() {
        let result = parse_bearer_token(Some("bearer sometoken"));
        assert_eq!(result.expect("parses"), "sometoken");
    }

    #[test]
    fn token_table_resolves_an_inserted_token_by_fingerprint_not_plaintext() {
        let mut table = TokenTable::new();
        table.insert(
            "secret-token",
            Principal { user_id: UserId::new("u1"), tenant_id: TenantId::new("acme"), role: Role::Operator },
        );
        assert!(table.resolve("secret-token").is_some());
        assert!(table.resolve("wrong-token").is_none());
    }
}
