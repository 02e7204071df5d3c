// vantage-api/src/error.rs
// ============================================================================
// Module: API Error
// Description: Converts every handler's fallible result into the error envelope.
// Purpose: Give every endpoint the same {error:{...}} body and status mapping.
// Dependencies: axum, vantage-core::error
// ============================================================================

//! ## Overview
//! `ApiError` is the one error type every handler returns. It wraps a
//! [`vantage_core::error::ErrorEnvelope`] and implements `IntoResponse` by
//! reading `category.http_status()` off it, matching spec.md §6/§7's status
//! mapping without a second lookup table. Every crate's own error type
//! converts into this one at the handler boundary, same as the teacher's
//! per-crate-error-converges-at-the-edge convention.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use vantage_core::error::ErrorCategory;
use vantage_core::error::ErrorEnvelope;

/// The error body every failed call returns.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// The structured envelope.
    pub error: ErrorEnvelope,
}

impl ApiError {
    #[must_use]
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self { error: ErrorEnvelope::new(category, message) }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error = self.error.with_suggestion(suggestion);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[allow(clippy::cast_possible_truncation, reason = "http_status() returns one of a fixed set of 3-digit codes")]
        let status = StatusCode::from_u16(self.error.category.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<vantage_access::PermissionDecision> for ApiError {
    fn from(decision: vantage_access::PermissionDecision) -> Self {
        Self::new(
            ErrorCategory::Permission,
            format!("caller role {:?} does not meet the required role {:?}", decision.caller_role, decision.required_role),
        )
    }
}

impl From<vantage_orchestrator::OrchestratorError> for ApiError {
    fn from(error: vantage_orchestrator::OrchestratorError) -> Self {
        match error {
            vantage_orchestrator::OrchestratorError::PermissionDenied(decision) => decision.into(),
            vantage_orchestrator::OrchestratorError::MissingRulesetId => Self::new(ErrorCategory::Validation, error.to_string())
                .with_suggestion("pass ruleset_id for intents that route to the judgment engine"),
            vantage_orchestrator::OrchestratorError::Gateway(message) => Self::new(ErrorCategory::Agent, message),
            vantage_orchestrator::OrchestratorError::ExecutorUnavailable(target) => {
                Self::new(ErrorCategory::Service, format!("no executor configured for {target:?}"))
            }
            vantage_orchestrator::OrchestratorError::Judgment(judgment_error) => judgment_error.into(),
        }
    }
}

impl From<vantage_judgment::JudgmentError> for ApiError {
    fn from(error: vantage_judgment::JudgmentError) -> Self {
        match error {
            vantage_judgment::JudgmentError::Validation(message) => Self::new(ErrorCategory::Validation, message),
            vantage_judgment::JudgmentError::Evaluation(message) => Self::new(ErrorCategory::Agent, message),
            vantage_judgment::JudgmentError::ModelMerge(message) => Self::new(ErrorCategory::Agent, message),
            vantage_judgment::JudgmentError::Store(store_error) => store_error.into(),
            vantage_judgment::JudgmentError::Hashing(hash_error) => Self::new(ErrorCategory::Internal, hash_error.to_string()),
            vantage_judgment::JudgmentError::Cache(cache_error) => Self::new(ErrorCategory::Internal, cache_error.to_string()),
        }
    }
}

impl From<vantage_judgment::StoreError> for ApiError {
    fn from(error: vantage_judgment::StoreError) -> Self {
        match error {
            vantage_judgment::StoreError::NotFound(what) => Self::new(ErrorCategory::NotFound, what),
            vantage_judgment::StoreError::Backend(message) => Self::new(ErrorCategory::Database, message),
        }
    }
}

impl From<vantage_deployment::StoreError> for ApiError {
    fn from(error: vantage_deployment::StoreError) -> Self {
        match error {
            vantage_deployment::StoreError::NotFound(what) => Self::new(ErrorCategory::NotFound, what),
            vantage_deployment::StoreError::Backend(message) => Self::new(ErrorCategory::Database, message),
        }
    }
}

impl From<vantage_deployment::TransitionError> for ApiError {
    fn from(error: vantage_deployment::TransitionError) -> Self {
        match error {
            vantage_deployment::TransitionError::InvalidState(id) => {
                Self::new(ErrorCategory::Conflict, format!("deployment {id} is not in a state that permits this transition"))
            }
            vantage_deployment::TransitionError::InvalidTrafficPercentage(pct) => {
                Self::new(ErrorCategory::Validation, format!("traffic percentage {pct} is outside 0..=100"))
            }
            vantage_deployment::TransitionError::ConflictingDeployment(id) => {
                Self::new(ErrorCategory::Conflict, format!("ruleset already has an in-flight deployment: {id}"))
            }
            vantage_deployment::TransitionError::Store(store_error) => store_error.into(),
        }
    }
}

impl From<vantage_scheduler::StoreError> for ApiError {
    fn from(error: vantage_scheduler::StoreError) -> Self {
        match error {
            vantage_scheduler::StoreError::NotFound(what) => Self::new(ErrorCategory::NotFound, what),
            vantage_scheduler::StoreError::Backend(message) => Self::new(ErrorCategory::Database, message),
        }
    }
}

impl From<vantage_providers::evaluator::EvaluatorError> for ApiError {
    fn from(error: vantage_providers::evaluator::EvaluatorError) -> Self {
        Self::new(ErrorCategory::Agent, error.to_string())
    }
}

impl From<vantage_store::SqlError> for ApiError {
    fn from(error: vantage_store::SqlError) -> Self {
        match error {
            vantage_store::SqlError::NotFound(what) => Self::new(ErrorCategory::NotFound, what),
            other => Self::new(ErrorCategory::Database, other.to_string()),
        }
    }
}

impl From<vantage_store::StoreInitError> for ApiError {
    fn from(error: vantage_store::StoreInitError) -> Self {
        Self::new(ErrorCategory::Database, error.to_string())
    }
}
