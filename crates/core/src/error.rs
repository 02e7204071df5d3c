// vantage-core/src/error.rs
// ============================================================================
// Module: Error Taxonomy
// Description: The closed error category set shared by every HTTP-facing crate.
// Purpose: Give every component a common vocabulary for surfaced vs. retryable errors.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every externally visible error in the control plane is classified into one
//! of a fixed set of categories. The category drives HTTP status mapping at
//! the API boundary and the retry policy described for each component.

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Category
// ============================================================================

/// Closed taxonomy of control-plane error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request shape or field-level validation failure.
    Validation,
    /// Missing or invalid bearer credential.
    Auth,
    /// Authenticated, but the role or tenant scope forbids the action.
    Permission,
    /// The referenced resource does not exist.
    NotFound,
    /// The request conflicts with current state (e.g. start-canary on non-draft).
    Conflict,
    /// The caller has exceeded a rate limit.
    RateLimit,
    /// A database-layer failure.
    Database,
    /// A downstream agent/model/evaluator failure.
    Agent,
    /// An unexpected internal failure.
    Internal,
    /// A downstream network failure.
    Network,
    /// A downstream call exceeded its timeout budget.
    Timeout,
    /// A downstream service reported an error that is not specifically categorized.
    Service,
    /// Semantic (as opposed to shape) validation failure.
    Semantic,
}

impl ErrorCategory {
    /// Returns whether callers may safely retry an error in this category.
    ///
    /// The core itself never retries within a single request; this flag is
    /// surfaced to the caller so external retriers (including schedulers) can
    /// decide.
    #[must_use]
    pub const fn retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Timeout | Self::Service | Self::Network
        )
    }

    /// Maps the category to the canonical HTTP status code for this API.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::Semantic => 400,
            Self::Auth => 401,
            Self::Permission => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::RateLimit => 429,
            Self::Database
            | Self::Agent
            | Self::Internal
            | Self::Network
            | Self::Timeout
            | Self::Service => 500,
        }
    }
}

// ============================================================================
// SECTION: Error Envelope
// ============================================================================

/// The structured error body returned on every failed HTTP call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error category.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
    /// Optional suggestion for how the caller might resolve the error.
    pub suggestion: Option<String>,
    /// Whether the caller may safely retry.
    pub retryable: bool,
    /// Optional machine-readable detail payload.
    pub detail: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// Builds an envelope from a category and message, deriving `retryable`.
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            retryable: category.retryable(),
            message: message.into(),
            suggestion: None,
            detail: None,
        }
    }

    /// Attaches a suggestion string.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches a machine-readable detail payload.
    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

// ============================================================================
// SECTION: CoreError
// ============================================================================

/// Shared error type for core domain operations that are not specific to one
/// component (hashing, identifier parsing, canonicalization).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Canonicalization or hashing failed.
    #[error("hashing error: {0}")]
    Hashing(#[from] crate::hashing::HashError),
    /// A value failed a domain invariant (e.g. score outside `[0,1]`).
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl CoreError {
    /// Classifies this error for the HTTP error envelope.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Hashing(_) => ErrorCategory::Internal,
            Self::Invariant(_) => ErrorCategory::Semantic,
        }
    }
}
