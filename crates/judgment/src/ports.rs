// vantage-judgment/src/ports.rs
// ============================================================================
// Module: Judgment Store Port
// Description: Repository trait the engine reads/writes through.
// Purpose: Keep C8's procedure independent of the concrete persistence layer.
// Dependencies: vantage-core::domain
// ============================================================================

//! ## Overview
//! `vantage-judgment` never talks to a database directly — it depends on
//! this trait, implemented by `vantage-store`. This mirrors the teacher's
//! own separation of pure decision logic from its storage crate.

use async_trait::async_trait;
use thiserror::Error;
use vantage_core::ActionRiskDefinition;
use vantage_core::CanaryAssignment;
use vantage_core::CanaryExecutionLog;
use vantage_core::Deployment;
use vantage_core::DecisionMatrixEntry;
use vantage_core::Identifier;
use vantage_core::JudgmentExecution;
use vantage_core::RiskLevel;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::RulesetVersion;
use vantage_core::TenantId;
use vantage_core::TrustLevel;

/// Errors surfaced by a [`JudgmentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backing store failed for reasons opaque to the caller.
    #[error("store error: {0}")]
    Backend(String),
}

/// Guard-relevant state used to evaluate a `DecisionMatrixEntry`'s guards.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardState {
    /// Consecutive recent auto-execution failures for this ruleset.
    pub consecutive_failures: u32,
    /// Seconds since the ruleset's last auto-execution, if any has happened.
    pub seconds_since_last_auto_execute: Option<u64>,
}

/// The read/write surface C8 needs from persistence.
#[async_trait]
pub trait JudgmentStore: Send + Sync {
    /// Fetches the ruleset's current state (trust level, score, etc).
    async fn ruleset(&self, ruleset_id: &RulesetId) -> Result<Ruleset, StoreError>;

    /// Fetches one immutable ruleset version (the script body).
    async fn ruleset_version(&self, ruleset_id: &RulesetId, version: u32) -> Result<RulesetVersion, StoreError>;

    /// Returns the deployment currently in `status = canary` for this
    /// ruleset, if any.
    async fn active_canary_deployment(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError>;

    /// Looks up an existing sticky canary assignment.
    async fn canary_assignment(
        &self,
        deployment_id: &vantage_core::DeploymentId,
        identifier: &Identifier,
    ) -> Result<Option<CanaryAssignment>, StoreError>;

    /// Persists a newly-computed canary assignment.
    async fn save_canary_assignment(&self, assignment: &CanaryAssignment) -> Result<(), StoreError>;

    /// Looks up the risk definition for `action_type`, falling back to
    /// priority-ordered pattern match when no exact match exists.
    async fn action_risk(
        &self,
        tenant_id: &TenantId,
        action_type: Option<&str>,
    ) -> Result<Option<ActionRiskDefinition>, StoreError>;

    /// Looks up the decision matrix entry for `(trust_level, risk_level)`.
    async fn decision_matrix_entry(
        &self,
        tenant_id: &TenantId,
        trust_level: TrustLevel,
        risk_level: RiskLevel,
    ) -> Result<Option<DecisionMatrixEntry>, StoreError>;

    /// Reads the guard-relevant state (consecutive failures, cooldown) for
    /// a ruleset's auto-execution history.
    async fn guard_state(&self, ruleset_id: &RulesetId) -> Result<GuardState, StoreError>;

    /// Appends a `JudgmentExecution` row. Atomic: either this succeeds and
    /// the execution is recorded, or it fails and nothing is recorded.
    async fn append_execution(&self, execution: &JudgmentExecution) -> Result<(), StoreError>;

    /// Appends a `CanaryExecutionLog` row linked to `execution`.
    async fn append_canary_log(&self, log: &CanaryExecutionLog) -> Result<(), StoreError>;

    /// Increments the ruleset's execution counter and last-execution
    /// timestamp. Trust level re-evaluation happens separately, in C13.
    async fn record_execution_counters(&self, ruleset_id: &RulesetId) -> Result<(), StoreError>;
}
