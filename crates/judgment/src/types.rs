// vantage-judgment/src/types.rs
// ============================================================================
// Module: Judgment Request/Result Types
// Description: The public input/output shapes for C8's evaluate() call.
// Purpose: Give callers (C6, tests) one stable contract for the engine.
// Dependencies: vantage-core::domain
// ============================================================================

use thiserror::Error;
use vantage_core::Decision;
use vantage_core::Identifier;
use vantage_core::IdentifierType;
use vantage_core::JudgmentPolicy;
use vantage_core::MethodUsed;
use vantage_core::RiskLevel;
use vantage_core::RulesetId;
use vantage_core::TenantId;

use crate::ports::StoreError;

/// A request to evaluate a ruleset against an input payload.
#[derive(Debug, Clone)]
pub struct JudgmentRequest {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Ruleset to evaluate.
    pub ruleset_id: RulesetId,
    /// Caller-supplied input payload.
    pub input_data: serde_json::Value,
    /// Evaluation policy; `None` defers to the ruleset's configured default.
    pub policy: Option<JudgmentPolicy>,
    /// Whether the caller wants an explanation, gating the model merge step.
    pub need_explanation: bool,
    /// An identifier used for canary routing, when the deployment is in canary.
    pub identifier: Option<(IdentifierType, Identifier)>,
}

/// The result of a successful judgment call.
#[derive(Debug, Clone)]
pub struct JudgmentOutcome {
    /// The resulting output payload.
    pub output: serde_json::Value,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
    /// Which sources contributed to the result.
    pub method_used: MethodUsed,
    /// Assigned risk level.
    pub risk_level: RiskLevel,
    /// The decision matrix's resolved verdict.
    pub decision: Decision,
    /// Whether the result was served from cache.
    pub cache_hit: bool,
    /// Whether an action was staged for automatic execution.
    pub auto_executed: bool,
}

/// Errors the judgment engine can surface to its caller.
#[derive(Debug, Error)]
pub enum JudgmentError {
    /// `input_data` was empty or otherwise failed validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// The external script evaluator (C2) failed.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),
    /// The external model gateway (C3) failed during the hybrid merge step.
    #[error("model merge failed: {0}")]
    ModelMerge(String),
    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// Canonicalizing/hashing the input for the cache key failed.
    #[error("hashing error: {0}")]
    Hashing(#[from] vantage_core::hashing::HashError),
    /// The judgment cache layer failed.
    #[error("cache error: {0}")]
    Cache(#[from] vantage_cache::judgment::JudgmentCacheError),
}
