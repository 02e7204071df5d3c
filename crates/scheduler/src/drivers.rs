// vantage-scheduler/src/drivers.rs
// ============================================================================
// Module: Periodic Drivers
// Description: One tick each of canary_monitor, trust_reevaluator, assignment_sweeper.
// Purpose: Drive C9-C12 and C7 without a human in the loop.
// Dependencies: vantage-canary, vantage-deployment, vantage-trust, crate::ports
// ============================================================================

//! ## Overview
//! Grounded on spec.md §4.10's three drivers. Each `run_*_once` function is
//! one tick's worth of work and is what tests exercise directly; [`lock`]
//! governs whether a given replica is the one allowed to call it this
//! cycle. A long-running process wires these into `tokio::time::interval`
//! loops (see [`drive_forever`]) at the cadences spec.md names (~30s, ~15min,
//! ~1h).

use std::time::Duration;

use time::OffsetDateTime;
use vantage_cache::Cache;
use vantage_canary::breaker;
use vantage_canary::metrics;
use vantage_core::CompensationStrategy;
use vantage_core::DeploymentStatus;
use vantage_core::TriggeredBy;
use vantage_core::VersionType;
use vantage_deployment::DeploymentStore;
use vantage_trust::TrustThresholds;
use vantage_trust::TransitionInputs;

use crate::lock;
use crate::ports::SchedulerStore;
use crate::ports::StoreError;

/// Approximate tick cadence for `canary_monitor`.
pub const CANARY_MONITOR_INTERVAL: Duration = Duration::from_secs(30);
/// Approximate tick cadence for `trust_reevaluator`.
pub const TRUST_REEVALUATOR_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// Approximate tick cadence for `assignment_sweeper`.
pub const ASSIGNMENT_SWEEPER_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// One deployment's outcome from a `canary_monitor` tick, for logging/tests.
#[derive(Debug, Clone)]
pub enum MonitorOutcome {
    /// No action: below `min_samples` or the circuit is healthy.
    Healthy,
    /// A warning was observed but the deployment was left running.
    Warning(String),
    /// The deployment was rolled back.
    RolledBack(String),
}

/// Runs one `canary_monitor` tick: refreshes each monitored deployment's
/// metrics window, evaluates the circuit breaker, and rolls back on
/// `CRITICAL`.
///
/// # Errors
///
/// Returns a store error if the store itself fails; a single deployment's
/// monitoring failure does not abort the rest of the batch (logged and
/// skipped instead).
pub async fn run_canary_monitor_once(
    store: &dyn SchedulerStore,
    deployment_store: &dyn DeploymentStore,
    cache: &dyn Cache,
) -> Result<Vec<(vantage_core::DeploymentId, MonitorOutcome)>, StoreError> {
    let mut results = Vec::new();
    for deployment in store.canary_monitored_deployments().await? {
        let outcome = monitor_one_deployment(store, deployment_store, cache, &deployment).await;
        match outcome {
            Ok(outcome) => results.push((deployment.id.clone(), outcome)),
            Err(error) => {
                tracing::warn!(deployment_id = %deployment.id, %error, "canary monitor tick failed for this deployment");
            }
        }
    }
    Ok(results)
}

async fn monitor_one_deployment(
    store: &dyn SchedulerStore,
    deployment_store: &dyn DeploymentStore,
    cache: &dyn Cache,
    deployment: &vantage_core::Deployment,
) -> Result<MonitorOutcome, StoreError> {
    let now = OffsetDateTime::now_utc();
    let canary_logs = store.recent_execution_logs(&deployment.id, VersionType::Canary).await?;
    let window_start = canary_logs.iter().map(|log| log.created_at).min().unwrap_or(now);
    let canary_window = metrics::aggregate(deployment.id.clone(), VersionType::Canary, &canary_logs, window_start, now);
    store.save_metrics_window(&canary_window).await?;

    let stable_window = store.stable_metrics_window(&deployment.id).await?;
    let status = breaker::evaluate(&canary_window, stable_window.as_ref(), &deployment.canary_config);

    if status.should_halt {
        let reason = status.halt_reason.unwrap_or_else(|| "circuit breaker reported CRITICAL".to_owned());
        let mut deployment = deployment.clone();
        vantage_deployment::rollback(deployment_store, cache, &mut deployment, reason.clone(), TriggeredBy::Auto, None)
            .await
            .map_err(|error| StoreError::Backend(error.to_string()))?;
        return Ok(MonitorOutcome::RolledBack(reason));
    }

    if let Some(warning) = status.warnings.first() {
        tracing::warn!(deployment_id = %deployment.id, warning, "canary deployment in WARNING state");
        return Ok(MonitorOutcome::Warning(warning.clone()));
    }

    Ok(MonitorOutcome::Healthy)
}

/// One ruleset's outcome from a `trust_reevaluator` tick.
#[derive(Debug, Clone)]
pub enum ReevaluationOutcome {
    /// The score was recomputed but the level did not change.
    Unchanged,
    /// The level transitioned.
    Transitioned(vantage_core::TrustLevel),
}

/// Runs one `trust_reevaluator` tick: recomputes score and evaluates
/// transition thresholds for every ruleset whose counters changed.
///
/// # Errors
///
/// Returns a store error if the store itself fails.
pub async fn run_trust_reevaluator_once(
    store: &dyn SchedulerStore,
    thresholds: &TrustThresholds,
) -> Result<Vec<(vantage_core::RulesetId, ReevaluationOutcome)>, StoreError> {
    let mut results = Vec::new();
    for ruleset in store.rulesets_due_for_reevaluation().await? {
        let inputs = store.score_inputs(&ruleset.id).await?;
        let components = vantage_trust::components(inputs);
        let score = vantage_trust::compose(&components, &vantage_core::TrustWeights::default());

        let transition_inputs = TransitionInputs {
            current_level: ruleset.trust_level,
            score,
            execution_count: ruleset.execution_count,
            accuracy_rate: ruleset.accuracy_rate,
            recent_negative_feedback: ruleset.negative_feedback_count,
            last_demoted_at: ruleset.last_demoted_at,
            now: OffsetDateTime::now_utc(),
        };
        let decision = vantage_trust::evaluate(transition_inputs, thresholds);

        let history = decision.as_ref().map(|decision| vantage_core::TrustHistory {
            id: vantage_core::TrustHistoryId::new(format!("{}-{}", ruleset.id, OffsetDateTime::now_utc().unix_timestamp())),
            ruleset_id: ruleset.id.clone(),
            previous_level: ruleset.trust_level,
            new_level: decision.new_level,
            reason: decision.reason.clone(),
            triggered_by: decision.triggered_by,
            metrics_snapshot: components,
            created_at: OffsetDateTime::now_utc(),
        });

        let outcome = match &history {
            Some(history) => ReevaluationOutcome::Transitioned(history.new_level),
            None => ReevaluationOutcome::Unchanged,
        };
        store.save_trust_evaluation(&ruleset.id, components, score, history).await?;
        results.push((ruleset.id, outcome));
    }
    Ok(results)
}

/// Runs one `assignment_sweeper` tick: deletes every expired sticky canary
/// assignment, returning the count removed.
///
/// # Errors
///
/// Returns a store error if the delete itself fails.
pub async fn run_assignment_sweeper_once(store: &dyn SchedulerStore) -> Result<u64, StoreError> {
    store.delete_expired_assignments(OffsetDateTime::now_utc()).await
}

/// Default compensation strategy assumed when a rollback has none declared
/// in its deployment metadata. Kept here rather than in `vantage-deployment`
/// since only the scheduler's auto-rollback path needs a default at all —
/// a human-triggered rollback always supplies one explicitly.
pub const DEFAULT_AUTO_ROLLBACK_COMPENSATION: CompensationStrategy = CompensationStrategy::MarkAndReprocess;

/// Runs `run_*_once` on a fixed interval for as long as the lease holds,
/// stopping only when `shutdown` resolves. Intended for the production
/// binary's main loop, not exercised directly in unit tests.
pub async fn drive_forever<F, Fut>(driver_name: &'static str, cache: &dyn Cache, interval: Duration, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if lock::try_acquire(cache, driver_name, interval).await {
            tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vantage_core::Ruleset;
    use vantage_core::RulesetId;
    use vantage_core::TenantId;
    use vantage_core::TrustComponents;
    use vantage_core::TrustLevel;
    use vantage_trust::ScoreInputs;

    use super::*;
    use crate::ports::SchedulerStore;

    #[derive(Default)]
    struct FakeStore {
        rulesets: Mutex<Vec<Ruleset>>,
        expired_removed: Mutex<u64>,
    }

    #[async_trait]
    impl SchedulerStore for FakeStore {
        async fn canary_monitored_deployments(&self) -> Result<Vec<vantage_core::Deployment>, StoreError> {
            Ok(Vec::new())
        }

        async fn recent_execution_logs(
            &self,
            _deployment_id: &vantage_core::DeploymentId,
            _version_type: VersionType,
        ) -> Result<Vec<vantage_core::CanaryExecutionLog>, StoreError> {
            Ok(Vec::new())
        }

        async fn stable_metrics_window(
            &self,
            _deployment_id: &vantage_core::DeploymentId,
        ) -> Result<Option<vantage_core::DeploymentMetricsWindow>, StoreError> {
            Ok(None)
        }

        async fn save_metrics_window(&self, _window: &vantage_core::DeploymentMetricsWindow) -> Result<(), StoreError> {
            Ok(())
        }

        async fn rulesets_due_for_reevaluation(&self) -> Result<Vec<Ruleset>, StoreError> {
            Ok(self.rulesets.lock().expect("mutex poisoned").clone())
        }

        async fn score_inputs(&self, _ruleset_id: &RulesetId) -> Result<ScoreInputs, StoreError> {
            Ok(ScoreInputs {
                accuracy_rate: Some(0.97),
                recent_result_variance: 0.02,
                execution_count: 1000,
                frequency_target: 200,
                positive_feedback: 90,
                negative_feedback: 2,
                age_days: 120.0,
                age_target_days: 30.0,
            })
        }

        async fn save_trust_evaluation(
            &self,
            _ruleset_id: &RulesetId,
            _components: TrustComponents,
            _score: f64,
            _history: Option<vantage_core::TrustHistory>,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete_expired_assignments(&self, _now: OffsetDateTime) -> Result<u64, StoreError> {
            Ok(*self.expired_removed.lock().expect("mutex poisoned"))
        }
    }

    fn base_ruleset() -> Ruleset {
        Ruleset {
            id: RulesetId::new("r1"),
            tenant_id: TenantId::new("t1"),
            name: "example".to_owned(),
            active_version: Some(3),
            trust_level: TrustLevel::AlertOnly,
            trust_score: 0.5,
            trust_components: TrustComponents { accuracy: 0.5, consistency: 0.5, frequency: 0.5, feedback: 0.5, age: 0.5 },
            execution_count: 500,
            positive_feedback_count: 40,
            negative_feedback_count: 1,
            accuracy_rate: Some(0.9),
            last_execution_at: None,
            last_promoted_at: None,
            last_demoted_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn reevaluator_promotes_a_ruleset_that_clears_all_thresholds() {
        let store = FakeStore { rulesets: Mutex::new(vec![base_ruleset()]), ..FakeStore::default() };
        let thresholds = TrustThresholds::default();
        let results = run_trust_reevaluator_once(&store, &thresholds).await.expect("tick should succeed");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, ReevaluationOutcome::Transitioned(TrustLevel::LowRiskAuto)));
    }

    #[tokio::test]
    async fn assignment_sweeper_reports_the_store_supplied_count() {
        let store = FakeStore { expired_removed: Mutex::new(7), ..FakeStore::default() };
        let removed = run_assignment_sweeper_once(&store).await.expect("sweep should succeed");
        assert_eq!(removed, 7);
    }

    #[test]
    fn default_auto_rollback_compensation_marks_for_reprocess() {
        assert_eq!(DEFAULT_AUTO_ROLLBACK_COMPENSATION, CompensationStrategy::MarkAndReprocess);
    }
}
