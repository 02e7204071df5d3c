// vantage-deployment/src/ports.rs
// ============================================================================
// Module: Deployment Store Port
// Description: Repository trait the controller reads/writes through.
// Purpose: Keep C12's state machine independent of the concrete persistence layer.
// Dependencies: vantage-core::domain
// ============================================================================

//! ## Overview
//! Mirrors `vantage-judgment::ports::JudgmentStore`: the controller never
//! talks to a database directly, only to this trait, implemented by
//! `vantage-store`.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use vantage_core::CanaryExecutionLog;
use vantage_core::CanaryLogId;
use vantage_core::Deployment;
use vantage_core::DeploymentId;
use vantage_core::ExecutionId;
use vantage_core::RulesetId;
use vantage_core::TrustHistory;

/// Errors surfaced by a [`DeploymentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backing store failed for reasons opaque to the caller.
    #[error("store error: {0}")]
    Backend(String),
}

/// An operator-facing record of one deployment transition, for the audit
/// trail and for any notification channel.
#[derive(Debug, Clone)]
pub struct DeploymentNotification {
    /// Deployment the transition applies to.
    pub deployment_id: DeploymentId,
    /// Short event name (`start_canary`, `set_traffic`, `promote`, `rollback`, `reprocess_batch`).
    pub event: &'static str,
    /// Human-readable detail, including the compensation outcome for rollback.
    pub detail: String,
}

/// The read/write surface C12 needs from persistence.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Fetches one deployment by id.
    async fn deployment(&self, deployment_id: &DeploymentId) -> Result<Deployment, StoreError>;

    /// Returns the deployment currently `canary` or `active` for `ruleset_id`,
    /// if any, used to enforce the single-in-flight-deployment invariant.
    async fn active_or_canary_deployment(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError>;

    /// Returns the most recently deprecated deployment for `ruleset_id`, the
    /// one restored to `active` on rollback.
    async fn most_recent_deprecated(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError>;

    /// Persists a deployment's full current state.
    async fn save_deployment(&self, deployment: &Deployment) -> Result<(), StoreError>;

    /// Deletes every sticky `CanaryAssignment` for a deployment.
    async fn delete_assignments(&self, deployment_id: &DeploymentId) -> Result<u64, StoreError>;

    /// Fetches every `CanaryExecutionLog` with `canary_version = v2` for a
    /// deployment, the compensation target set.
    async fn v2_execution_logs(&self, deployment_id: &DeploymentId) -> Result<Vec<CanaryExecutionLog>, StoreError>;

    /// Persists a single canary log row's updated compensation flags.
    async fn save_execution_log(&self, log: &CanaryExecutionLog) -> Result<(), StoreError>;

    /// Sets a key on the `JudgmentExecution` row linked to `execution_id`'s
    /// free-form metadata map (`needs_reprocess` / `soft_deleted`).
    async fn set_execution_metadata(
        &self,
        execution_id: &ExecutionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Fetches up to `limit` logs with `needs_reprocess = true AND
    /// reprocessed_at IS NULL` for a deployment.
    async fn reprocessable_logs(
        &self,
        deployment_id: &DeploymentId,
        limit: u32,
    ) -> Result<Vec<CanaryExecutionLog>, StoreError>;

    /// Marks a log row reprocessed at the given timestamp.
    async fn mark_reprocessed(&self, log_id: &CanaryLogId, reprocessed_at: OffsetDateTime) -> Result<(), StoreError>;

    /// Appends a `TrustHistory` row, when a transition changes the
    /// ruleset's trust level as a side effect of this deployment event.
    async fn append_trust_history(&self, history: &TrustHistory) -> Result<(), StoreError>;

    /// Emits an operator notification and audit trail entry for a
    /// completed transition. Best-effort: failures here must never unwind
    /// an already-committed state transition.
    async fn notify(&self, notification: DeploymentNotification) -> Result<(), StoreError>;
}
