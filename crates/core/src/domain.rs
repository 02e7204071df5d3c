// vantage-core/src/domain.rs
// ============================================================================
// Module: Domain Model
// Description: Shared entities and enumerations for the decision-and-deployment core.
// Purpose: Give every component one vocabulary for rulesets, deployments, and judgments.
// Dependencies: crate::ids, serde, time
// ============================================================================

//! ## Overview
//! These types mirror the data model in the system specification: rulesets
//! and their versions, deployments and canary state, judgment executions, and
//! the trust/decision tables that gate automation. Persistence crates map
//! these types to rows; nothing here assumes a particular backend.

use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::ids::AssignmentId;
use crate::ids::AutoExecutionLogId;
use crate::ids::CanaryLogId;
use crate::ids::DeploymentId;
use crate::ids::ExecutionId;
use crate::ids::FeedbackId;
use crate::ids::GoldenSampleSetId;
use crate::ids::Identifier;
use crate::ids::MetricsWindowId;
use crate::ids::RulesetId;
use crate::ids::RulesetVersionId;
use crate::ids::SampleId;
use crate::ids::TenantId;
use crate::ids::TrustHistoryId;

// ============================================================================
// SECTION: Trust
// ============================================================================

/// Discrete automation authority granted to a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Level 0: proposed, no automation.
    Proposed,
    /// Level 1: alert only, never auto-executes.
    AlertOnly,
    /// Level 2: low-risk actions may auto-execute.
    LowRiskAuto,
    /// Level 3: full automation authority.
    FullAuto,
}

impl TrustLevel {
    /// Returns the numeric level in `0..=3`.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Proposed => 0,
            Self::AlertOnly => 1,
            Self::LowRiskAuto => 2,
            Self::FullAuto => 3,
        }
    }

    /// Builds a level from its numeric form, clamping to `[0, 3]`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Proposed,
            1 => Self::AlertOnly,
            2 => Self::LowRiskAuto,
            _ => Self::FullAuto,
        }
    }

    /// The level one step above this one, or `None` at the ceiling.
    #[must_use]
    pub const fn promoted(self) -> Option<Self> {
        match self {
            Self::Proposed => Some(Self::AlertOnly),
            Self::AlertOnly => Some(Self::LowRiskAuto),
            Self::LowRiskAuto => Some(Self::FullAuto),
            Self::FullAuto => None,
        }
    }

    /// The level one step below this one, or `None` at the floor.
    #[must_use]
    pub const fn demoted(self) -> Option<Self> {
        match self {
            Self::Proposed => None,
            Self::AlertOnly => Some(Self::Proposed),
            Self::LowRiskAuto => Some(Self::AlertOnly),
            Self::FullAuto => Some(Self::LowRiskAuto),
        }
    }
}

/// Who or what triggered a trust or deployment transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggeredBy {
    /// An automated scheduler driver.
    Auto,
    /// An operator or admin action.
    Manual,
    /// Driven by accumulated feedback.
    Feedback,
}

/// Weighted components of a trust score, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustComponents {
    /// Observed accuracy, or 0.5 absent feedback.
    pub accuracy: f64,
    /// `1 - variance` of results across recent equivalent executions.
    pub consistency: f64,
    /// Saturating function of execution count.
    pub frequency: f64,
    /// `positive / (positive + negative + epsilon)`.
    pub feedback: f64,
    /// Saturating function of ruleset age.
    pub age: f64,
}

/// Weights applied to each [`TrustComponents`] field when composing a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    /// Weight for accuracy.
    pub accuracy: f64,
    /// Weight for consistency.
    pub consistency: f64,
    /// Weight for frequency.
    pub frequency: f64,
    /// Weight for feedback.
    pub feedback: f64,
    /// Weight for age.
    pub age: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.2,
            consistency: 0.2,
            frequency: 0.2,
            feedback: 0.2,
            age: 0.2,
        }
    }
}

/// Append-only trust transition record; the source of truth for
/// `Ruleset::trust_level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustHistory {
    /// Row identifier.
    pub id: TrustHistoryId,
    /// Ruleset this transition applies to.
    pub ruleset_id: RulesetId,
    /// Level before the transition.
    pub previous_level: TrustLevel,
    /// Level after the transition.
    pub new_level: TrustLevel,
    /// Human-readable reason for the transition.
    pub reason: String,
    /// What triggered the transition.
    pub triggered_by: TriggeredBy,
    /// Full metrics snapshot at decision time.
    pub metrics_snapshot: TrustComponents,
    /// When the transition was recorded.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Ruleset
// ============================================================================

/// A named, versioned artifact that classifies an input into a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ruleset {
    /// Ruleset identifier.
    pub id: RulesetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// The currently active version, if any has been activated.
    pub active_version: Option<u32>,
    /// Current automation authority, derived from the latest `TrustHistory` row.
    pub trust_level: TrustLevel,
    /// Current trust score in `[0, 1]`.
    pub trust_score: f64,
    /// Most recent component breakdown behind `trust_score`.
    pub trust_components: TrustComponents,
    /// Total judgment executions observed.
    pub execution_count: u64,
    /// Count of positive feedback events.
    pub positive_feedback_count: u64,
    /// Count of negative feedback events.
    pub negative_feedback_count: u64,
    /// Observed accuracy rate in `[0, 1]`, when feedback exists.
    pub accuracy_rate: Option<f64>,
    /// Timestamp of the last judgment execution.
    pub last_execution_at: Option<OffsetDateTime>,
    /// Timestamp of the last promotion.
    pub last_promoted_at: Option<OffsetDateTime>,
    /// Timestamp of the last demotion.
    pub last_demoted_at: Option<OffsetDateTime>,
    /// Ruleset creation time, used by the age trust component.
    pub created_at: OffsetDateTime,
}

impl Ruleset {
    /// Validates the cross-field invariants declared in the data model:
    /// `trust_score` and `accuracy_rate` must lie in `[0, 1]`.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        let score_ok = (0.0..=1.0).contains(&self.trust_score);
        let accuracy_ok = self.accuracy_rate.is_none_or(|a| (0.0..=1.0).contains(&a));
        score_ok && accuracy_ok
    }
}

/// An immutable revision of a ruleset's script body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetVersion {
    /// Version row identifier.
    pub id: RulesetVersionId,
    /// Owning ruleset.
    pub ruleset_id: RulesetId,
    /// Monotonic version number, starting at 1.
    pub version: u32,
    /// The script body, opaque to the core (consumed by the external evaluator).
    pub script: String,
    /// Free-form changelog entry.
    pub changelog: Option<String>,
    /// Trust level newly created versions start at.
    pub initial_trust_level: TrustLevel,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Deployment
// ============================================================================

/// Lifecycle state of a [`Deployment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Created but not yet routing any traffic.
    Draft,
    /// Routing a percentage of traffic to the target version.
    Canary,
    /// The target version is fully active.
    Active,
    /// Superseded by a later deployment.
    Deprecated,
    /// Rolled back; the previous version was restored.
    RolledBack,
}

/// Compensation applied to canary-produced records upon rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationStrategy {
    /// No row changes; the canary data is treated as valid.
    Ignore,
    /// Mark affected rows `needs_reprocess = true`.
    MarkAndReprocess,
    /// Mark affected rows `rollback_safe = false` / `soft_deleted = true`.
    SoftDelete,
}

/// Per-deployment canary circuit-breaker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanaryConfig {
    /// Minimum canary sample count before any verdict is trusted.
    pub min_samples: u64,
    /// Absolute canary error rate threshold.
    pub error_rate_threshold: f64,
    /// Canary-vs-stable relative error rate threshold.
    pub relative_error_threshold: f64,
    /// Canary-vs-stable relative P95 latency threshold.
    pub latency_p95_threshold: f64,
    /// Consecutive canary failure threshold.
    pub consecutive_failure_threshold: u32,
    /// Whether the scheduler may auto-rollback this deployment.
    pub auto_rollback_enabled: bool,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self {
            min_samples: 100,
            error_rate_threshold: 0.05,
            relative_error_threshold: 2.0,
            latency_p95_threshold: 1.5,
            consecutive_failure_threshold: 5,
            auto_rollback_enabled: true,
        }
    }
}

/// A planned transition from one active ruleset version to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment identifier.
    pub id: DeploymentId,
    /// Owning tenant (denormalized from the ruleset for scope filtering).
    pub tenant_id: TenantId,
    /// Ruleset under deployment.
    pub ruleset_id: RulesetId,
    /// Current lifecycle state.
    pub status: DeploymentStatus,
    /// The version being rolled out.
    pub target_version: u32,
    /// The version active before this deployment started.
    pub previous_version: Option<u32>,
    /// Circuit-breaker configuration.
    pub canary_config: CanaryConfig,
    /// Compensation applied on rollback.
    pub compensation_strategy: CompensationStrategy,
    /// Percentage of new identifiers routed to the target version.
    pub canary_traffic_percentage: u8,
    /// When the canary phase started.
    pub started_at: Option<OffsetDateTime>,
    /// When the deployment was promoted to active.
    pub promoted_at: Option<OffsetDateTime>,
    /// When the deployment was rolled back.
    pub rolled_back_at: Option<OffsetDateTime>,
    /// Human-readable rollback reason.
    pub rollback_reason: Option<String>,
    /// The version restored to active upon rollback, if any.
    pub rollback_to_version: Option<u32>,
    /// Free-form deployment metadata, including rollback detail.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// The two versions a deployment routes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanaryVersion {
    /// The currently stable (pre-deployment) version.
    V1,
    /// The deployment's target version.
    V2,
}

/// The identifier kind used for sticky canary assignment, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    /// Lowest priority: end-user identifier.
    User,
    /// Middle priority: session identifier.
    Session,
    /// Highest priority: workflow instance identifier.
    WorkflowInstance,
}

/// A sticky mapping of `(deployment_id, identifier)` to a canary version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanaryAssignment {
    /// Assignment row identifier.
    pub id: AssignmentId,
    /// Deployment this assignment belongs to.
    pub deployment_id: DeploymentId,
    /// The sticky-routed identifier.
    pub identifier: Identifier,
    /// Kind of identifier.
    pub identifier_type: IdentifierType,
    /// Assigned version.
    pub version: CanaryVersion,
    /// When the assignment was created.
    pub created_at: OffsetDateTime,
    /// Optional expiry, after which the assignment sweep deletes the row.
    pub expires_at: Option<OffsetDateTime>,
}

// ============================================================================
// SECTION: Metrics
// ============================================================================

/// Which population a [`DeploymentMetricsWindow`] summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionType {
    /// The canary (target) version's traffic.
    Canary,
    /// The stable (previous) version's traffic.
    Stable,
}

/// A time-bucketed aggregate of canary execution outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentMetricsWindow {
    /// Window identifier.
    pub id: MetricsWindowId,
    /// Deployment this window belongs to.
    pub deployment_id: DeploymentId,
    /// Which population this window summarizes.
    pub version_type: VersionType,
    /// Total samples observed in the window.
    pub sample_count: u64,
    /// Successful samples.
    pub success_count: u64,
    /// Failed samples.
    pub error_count: u64,
    /// `error_count / sample_count`, or 0 when `sample_count == 0`.
    pub error_rate: f64,
    /// 50th percentile latency in milliseconds.
    pub latency_p50_ms: Option<f64>,
    /// 95th percentile latency in milliseconds.
    pub latency_p95_ms: Option<f64>,
    /// 99th percentile latency in milliseconds.
    pub latency_p99_ms: Option<f64>,
    /// Average latency in milliseconds.
    pub latency_avg_ms: Option<f64>,
    /// Longest trailing run of failures up to `window_end`.
    pub consecutive_failures: u32,
    /// Window start (inclusive).
    pub window_start: OffsetDateTime,
    /// Window end (exclusive).
    pub window_end: OffsetDateTime,
}

/// One record per judgment observed while a deployment is in canary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanaryExecutionLog {
    /// Log row identifier.
    pub id: CanaryLogId,
    /// Deployment this log belongs to.
    pub deployment_id: DeploymentId,
    /// Linked judgment execution.
    pub execution_id: ExecutionId,
    /// Which version served the request.
    pub canary_version: CanaryVersion,
    /// Whether the judgment succeeded.
    pub success: bool,
    /// Observed latency in milliseconds.
    pub latency_ms: f64,
    /// Error message, when `success == false`.
    pub error_message: Option<String>,
    /// Whether this row is still valid for downstream analytics after a rollback.
    pub rollback_safe: bool,
    /// Whether this row's judgment needs re-execution against the restored version.
    pub needs_reprocess: bool,
    /// When re-execution completed, if it has.
    pub reprocessed_at: Option<OffsetDateTime>,
    /// When the log was recorded.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Judgment
// ============================================================================

/// Which sources contributed to a judgment's final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodUsed {
    /// Only the rule script ran.
    RuleOnly,
    /// Only the model ran (rule evaluation was skipped or unused).
    LlmOnly,
    /// Rule and model outputs were blended.
    HybridWeighted,
}

/// Evaluation policy requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentPolicy {
    /// Never consult the model.
    RuleOnly,
    /// Only consult the model (bypass the rule script).
    LlmOnly,
    /// Blend rule and model outputs by configured weight.
    HybridWeighted,
}

/// Risk classification assigned to an action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
    /// Critical risk.
    Critical,
}

/// The decision matrix's resolved verdict for a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Stage the action for automatic execution.
    AutoExecute,
    /// Emit an approval request instead of executing.
    RequireApproval,
    /// Reject the action outright.
    Reject,
}

/// One record per judgment call. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentExecution {
    /// Execution identifier.
    pub id: ExecutionId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Ruleset evaluated.
    pub ruleset_id: RulesetId,
    /// The caller-supplied input payload.
    pub input_data: serde_json::Value,
    /// The resulting output payload.
    pub output: serde_json::Value,
    /// Final confidence in `[0, 1]`.
    pub confidence: f64,
    /// Which sources contributed to the result.
    pub method_used: MethodUsed,
    /// The ruleset's trust level at the moment of this judgment.
    pub trust_level_at_time: TrustLevel,
    /// Assigned risk level.
    pub risk_level: RiskLevel,
    /// Whether an action was automatically executed.
    pub auto_executed: bool,
    /// Whether this result was served from cache.
    pub cache_hit: bool,
    /// Whether the evaluation succeeded end to end.
    pub success: bool,
    /// Free-form execution metadata (canary linkage, reprocess/soft-delete flags).
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Per-tenant `(trust_level, risk_level) -> decision` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionMatrixEntry {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Trust level key.
    pub trust_level: TrustLevel,
    /// Risk level key.
    pub risk_level: RiskLevel,
    /// Resolved decision absent guard failures.
    pub decision: Decision,
    /// Minimum trust score required, if any.
    pub min_trust_score: Option<f64>,
    /// Maximum allowed consecutive failures, if any.
    pub max_consecutive_failures: Option<u32>,
    /// Cooldown seconds since the last auto-execution, if any.
    pub cooldown_seconds: Option<u64>,
}

/// Per-tenant `action_type -> risk_level` mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRiskDefinition {
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The action type this definition describes.
    pub action_type: String,
    /// Assigned risk level.
    pub risk_level: RiskLevel,
    /// Whether the action can be undone.
    pub reversible: bool,
    /// Whether the action touches production systems.
    pub affects_production: bool,
    /// Whether the action has financial impact.
    pub affects_finance: bool,
    /// Whether the action has compliance impact.
    pub affects_compliance: bool,
    /// Priority used when resolving by pattern match (higher wins).
    pub priority: i32,
}

/// Append-only record of a `(judgment, decision, execution_status)` triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoExecutionLog {
    /// Log row identifier.
    pub id: AutoExecutionLogId,
    /// Linked judgment execution.
    pub execution_id: ExecutionId,
    /// The decision that was applied.
    pub decision: Decision,
    /// Execution status label (e.g. `staged`, `approved`, `rejected`).
    pub execution_status: String,
    /// Approval reference, present only when `decision == RequireApproval`.
    pub approval_reference: Option<String>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

// ============================================================================
// SECTION: Feedback
// ============================================================================

/// Classification assigned to a feedback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// The judgment's outcome was correct.
    Positive,
    /// The judgment's outcome was incorrect.
    Negative,
    /// The judgment was incorrect but a corrected outcome was supplied.
    Correction,
}

/// Raw feedback attached to a judgment execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackLog {
    /// Feedback row identifier.
    pub id: FeedbackId,
    /// Judgment this feedback concerns.
    pub execution_id: ExecutionId,
    /// Feedback classification.
    pub kind: FeedbackKind,
    /// Free-form reviewer comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// A feedback event promoted to a reusable sample, deduplicated by content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Sample row identifier.
    pub id: SampleId,
    /// Source feedback event.
    pub feedback_id: FeedbackId,
    /// Content hash used for deduplication.
    pub content_hash: String,
    /// The input payload this sample captures.
    pub input_data: serde_json::Value,
    /// The corrected or confirmed output.
    pub output_data: serde_json::Value,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// A curated set of [`Sample`] rows used for few-shot model prompting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenSampleSet {
    /// Set identifier.
    pub id: GoldenSampleSetId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Member sample identifiers.
    pub sample_ids: Vec<SampleId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trust_level_promotes_and_demotes_symmetrically() {
        assert_eq!(TrustLevel::Proposed.promoted(), Some(TrustLevel::AlertOnly));
        assert_eq!(TrustLevel::FullAuto.promoted(), None);
        assert_eq!(TrustLevel::Proposed.demoted(), None);
        assert_eq!(
            TrustLevel::LowRiskAuto.demoted(),
            Some(TrustLevel::AlertOnly)
        );
    }

    #[test]
    fn risk_level_orders_low_to_critical() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn identifier_type_priority_orders_workflow_highest() {
        assert!(IdentifierType::WorkflowInstance > IdentifierType::Session);
        assert!(IdentifierType::Session > IdentifierType::User);
    }
}
