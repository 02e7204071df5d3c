// vantage-scheduler/src/ports.rs
// ============================================================================
// Module: Scheduler Store Port
// Description: Repository trait the three drivers read/write through.
// Purpose: Keep C13's periodic logic independent of the concrete persistence layer.
// Dependencies: vantage-core::domain
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use vantage_core::CanaryExecutionLog;
use vantage_core::Deployment;
use vantage_core::DeploymentMetricsWindow;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::TrustHistory;
use vantage_core::VersionType;
use vantage_trust::ScoreInputs;

/// Errors surfaced by a [`SchedulerStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The backing store failed for reasons opaque to the caller.
    #[error("store error: {0}")]
    Backend(String),
}

/// The read/write surface the three C13 drivers need from persistence.
#[async_trait]
pub trait SchedulerStore: Send + Sync {
    /// Every deployment currently `canary` with `canary_config.auto_rollback_enabled`.
    async fn canary_monitored_deployments(&self) -> Result<Vec<Deployment>, StoreError>;

    /// Execution logs for `deployment_id`/`version_type` observed since the
    /// deployment's last monitored window, the raw input to `vantage-canary::aggregate`.
    async fn recent_execution_logs(
        &self,
        deployment_id: &vantage_core::DeploymentId,
        version_type: VersionType,
    ) -> Result<Vec<CanaryExecutionLog>, StoreError>;

    /// The most recent stable-population metrics window, the circuit
    /// breaker's relative-comparison baseline.
    async fn stable_metrics_window(
        &self,
        deployment_id: &vantage_core::DeploymentId,
    ) -> Result<Option<DeploymentMetricsWindow>, StoreError>;

    /// Persists a freshly-aggregated metrics window.
    async fn save_metrics_window(&self, window: &DeploymentMetricsWindow) -> Result<(), StoreError>;

    /// Every ruleset whose `execution_count` or feedback counters changed
    /// since its last trust evaluation.
    async fn rulesets_due_for_reevaluation(&self) -> Result<Vec<Ruleset>, StoreError>;

    /// Builds the raw score inputs for one ruleset (recent variance,
    /// feedback counts, age), the input to `vantage-trust::score::components`.
    async fn score_inputs(&self, ruleset_id: &RulesetId) -> Result<ScoreInputs, StoreError>;

    /// Persists a ruleset's freshly computed trust score/components, and
    /// its level if [`TrustHistory`] is `Some`.
    async fn save_trust_evaluation(
        &self,
        ruleset_id: &RulesetId,
        components: vantage_core::TrustComponents,
        score: f64,
        history: Option<TrustHistory>,
    ) -> Result<(), StoreError>;

    /// Deletes every `CanaryAssignment` whose `expires_at` is before `now`,
    /// returning the count removed.
    async fn delete_expired_assignments(&self, now: OffsetDateTime) -> Result<u64, StoreError>;
}
