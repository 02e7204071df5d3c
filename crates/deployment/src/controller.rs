// vantage-deployment/src/controller.rs
// ============================================================================
// Module: Deployment State Machine
// Description: start_canary / set_traffic / promote / rollback / reprocess_batch.
// Purpose: Own the one legal lifecycle a deployment can take, including compensation.
// Dependencies: vantage-core::domain, vantage-cache::judgment
// ============================================================================

//! ## Overview
//! Grounded on spec.md §4.9's transition table:
//!
//! ```text
//! draft ──start_canary──▶ canary ──promote──▶ active ──(next deployment)──▶ deprecated
//!                         canary ──rollback─▶ rolled_back
//! ```
//!
//! Every transition here is a single logical write (persist the deployment's
//! new state) followed by best-effort side effects (assignment cleanup,
//! cache invalidation, compensation, notification) — a side-effect failure
//! is logged, never allowed to un-commit the transition itself.

use time::OffsetDateTime;
use vantage_cache::Cache;
use vantage_core::CanaryVersion;
use vantage_core::Deployment;
use vantage_core::DeploymentId;
use vantage_core::DeploymentStatus;
use vantage_core::TriggeredBy;
use vantage_core::TrustHistory;

use crate::ports::DeploymentNotification;
use crate::ports::DeploymentStore;
use crate::ports::StoreError;

/// Errors a deployment transition can fail with.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// The deployment isn't in a state that permits the requested transition.
    #[error("deployment {0} is not in a state that permits this transition")]
    InvalidState(DeploymentId),
    /// `set_traffic` was called with a percentage outside `[0, 100]`.
    #[error("traffic percentage {0} is outside 0..=100")]
    InvalidTrafficPercentage(u8),
    /// A conflicting deployment already owns this ruleset's canary/active slot.
    #[error("ruleset already has an in-flight deployment: {0}")]
    ConflictingDeployment(DeploymentId),
    /// The persistence layer failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of a rollback, carrying the restored deployment and the
/// compensation summary for the audit/notification trail.
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    /// The deployment that was rolled back.
    pub rolled_back: Deployment,
    /// The deployment restored to `active`, if a prior deprecated one existed.
    pub restored: Option<Deployment>,
    /// Number of execution logs touched by compensation.
    pub compensated_rows: usize,
}

/// Starts a deployment's canary phase.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidState`] if `deployment` isn't `draft`,
/// [`TransitionError::ConflictingDeployment`] if the ruleset already has a
/// canary or active deployment, or a store error.
pub async fn start_canary(
    store: &dyn DeploymentStore,
    deployment: &mut Deployment,
    initial_pct: u8,
) -> Result<(), TransitionError> {
    if deployment.status != DeploymentStatus::Draft {
        return Err(TransitionError::InvalidState(deployment.id.clone()));
    }
    if let Some(conflict) = store.active_or_canary_deployment(&deployment.ruleset_id).await? {
        return Err(TransitionError::ConflictingDeployment(conflict.id));
    }

    deployment.status = DeploymentStatus::Canary;
    deployment.canary_traffic_percentage = initial_pct.min(100);
    deployment.started_at = Some(OffsetDateTime::now_utc());
    store.save_deployment(deployment).await?;

    notify_best_effort(
        store,
        deployment.id.clone(),
        "start_canary",
        format!("canary started at {initial_pct}% traffic"),
    )
    .await;
    Ok(())
}

/// Adjusts a canary deployment's traffic percentage. Existing sticky
/// assignments are unaffected; only newly-seen identifiers see the new split.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidState`] if `deployment` isn't `canary`,
/// [`TransitionError::InvalidTrafficPercentage`] if `pct > 100`, or a store
/// error.
pub async fn set_traffic(
    store: &dyn DeploymentStore,
    deployment: &mut Deployment,
    pct: u8,
) -> Result<(), TransitionError> {
    if deployment.status != DeploymentStatus::Canary {
        return Err(TransitionError::InvalidState(deployment.id.clone()));
    }
    if pct > 100 {
        return Err(TransitionError::InvalidTrafficPercentage(pct));
    }

    deployment.canary_traffic_percentage = pct;
    store.save_deployment(deployment).await?;

    notify_best_effort(store, deployment.id.clone(), "set_traffic", format!("traffic set to {pct}%")).await;
    Ok(())
}

/// Promotes a canary deployment to `active`, deprecating whatever was
/// previously active and clearing the canary's sticky assignments and cache.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidState`] if `deployment` isn't `canary`,
/// or a store error.
pub async fn promote(
    store: &dyn DeploymentStore,
    cache: &dyn Cache,
    deployment: &mut Deployment,
) -> Result<(), TransitionError> {
    if deployment.status != DeploymentStatus::Canary {
        return Err(TransitionError::InvalidState(deployment.id.clone()));
    }

    if let Some(mut previous) = store.active_or_canary_deployment(&deployment.ruleset_id).await? {
        if previous.id != deployment.id && previous.status == DeploymentStatus::Active {
            previous.status = DeploymentStatus::Deprecated;
            store.save_deployment(&previous).await?;
        }
    }

    deployment.status = DeploymentStatus::Active;
    deployment.promoted_at = Some(OffsetDateTime::now_utc());
    store.save_deployment(deployment).await?;

    let deleted = store.delete_assignments(&deployment.id).await.unwrap_or(0);
    invalidate_ruleset_cache(cache, &deployment.tenant_id, &deployment.ruleset_id).await;

    notify_best_effort(
        store,
        deployment.id.clone(),
        "promote",
        format!("promoted to active; {deleted} sticky assignment(s) cleared"),
    )
    .await;
    Ok(())
}

/// Rolls back a canary or active deployment, restoring the most recent
/// deprecated deployment (if any) to `active` and applying the declared
/// compensation strategy to its canary-served rows.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidState`] if `deployment` is in neither
/// `canary` nor `active`, or a store error.
pub async fn rollback(
    store: &dyn DeploymentStore,
    cache: &dyn Cache,
    deployment: &mut Deployment,
    reason: String,
    triggered_by: TriggeredBy,
    demotion: Option<TrustHistory>,
) -> Result<RollbackOutcome, TransitionError> {
    if deployment.status != DeploymentStatus::Canary && deployment.status != DeploymentStatus::Active {
        return Err(TransitionError::InvalidState(deployment.id.clone()));
    }

    deployment.status = DeploymentStatus::RolledBack;
    deployment.rolled_back_at = Some(OffsetDateTime::now_utc());
    deployment.rollback_reason = Some(reason.clone());

    let restored = store.most_recent_deprecated(&deployment.ruleset_id).await?;
    let restored = if let Some(mut previous) = restored {
        previous.status = DeploymentStatus::Active;
        store.save_deployment(&previous).await?;
        deployment.rollback_to_version = Some(previous.target_version);
        Some(previous)
    } else {
        None
    };

    store.save_deployment(deployment).await?;
    let deleted = store.delete_assignments(&deployment.id).await.unwrap_or(0);
    invalidate_ruleset_cache(cache, &deployment.tenant_id, &deployment.ruleset_id).await;

    let compensated_rows = apply_compensation(store, deployment).await?;

    if let Some(history) = demotion {
        if let Err(error) = store.append_trust_history(&history).await {
            tracing::warn!(deployment_id = %deployment.id, %error, "failed to persist trust history for rollback");
        }
    }

    notify_best_effort(
        store,
        deployment.id.clone(),
        "rollback",
        format!(
            "rolled back ({triggered_by:?}): {reason}; {deleted} assignment(s) cleared, \
             {compensated_rows} row(s) compensated via {:?}",
            deployment.compensation_strategy
        ),
    )
    .await;

    Ok(RollbackOutcome { rolled_back: deployment.clone(), restored, compensated_rows })
}

/// Fetches up to `limit` logs awaiting reprocessing after a rollback. The
/// caller re-executes each against the restored version and is responsible
/// for calling [`mark_reprocessed`] once done.
///
/// # Errors
///
/// Returns a store error if the fetch fails.
pub async fn reprocess_batch(
    store: &dyn DeploymentStore,
    deployment_id: &DeploymentId,
    limit: u32,
) -> Result<Vec<vantage_core::CanaryExecutionLog>, TransitionError> {
    Ok(store.reprocessable_logs(deployment_id, limit).await?)
}

/// Marks one previously-fetched log as reprocessed.
///
/// # Errors
///
/// Returns a store error if the write fails.
pub async fn mark_reprocessed(
    store: &dyn DeploymentStore,
    log_id: &vantage_core::CanaryLogId,
) -> Result<(), TransitionError> {
    store.mark_reprocessed(log_id, OffsetDateTime::now_utc()).await?;
    Ok(())
}

async fn apply_compensation(store: &dyn DeploymentStore, deployment: &Deployment) -> Result<usize, StoreError> {
    use vantage_core::CompensationStrategy;

    if deployment.compensation_strategy == CompensationStrategy::Ignore {
        return Ok(0);
    }

    let logs = store.v2_execution_logs(&deployment.id).await?;
    let mut touched = 0usize;
    for mut log in logs {
        if log.canary_version != CanaryVersion::V2 {
            continue;
        }
        if deployment.compensation_strategy == CompensationStrategy::MarkAndReprocess {
            log.needs_reprocess = true;
            store.set_execution_metadata(&log.execution_id, "needs_reprocess", serde_json::json!(true)).await?;
        } else {
            log.rollback_safe = false;
            store.set_execution_metadata(&log.execution_id, "soft_deleted", serde_json::json!(true)).await?;
        }
        store.save_execution_log(&log).await?;
        touched += 1;
    }
    Ok(touched)
}

async fn invalidate_ruleset_cache(cache: &dyn Cache, tenant_id: &vantage_core::TenantId, ruleset_id: &vantage_core::RulesetId) {
    let prefix = format!("judgment:{tenant_id}:{ruleset_id}:");
    if let Err(error) = cache.delete_by_prefix(&prefix).await {
        tracing::warn!(%ruleset_id, %error, "cache invalidation failed; stale entries will expire via TTL");
    }
}

async fn notify_best_effort(
    store: &dyn DeploymentStore,
    deployment_id: DeploymentId,
    event: &'static str,
    detail: String,
) {
    let notification = DeploymentNotification { deployment_id: deployment_id.clone(), event, detail };
    if let Err(error) = store.notify(notification).await {
        tracing::warn!(%deployment_id, %event, %error, "deployment notification failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use vantage_core::CanaryConfig;
    use vantage_core::RulesetId;
    use vantage_core::TenantId;

    use super::*;
    use crate::ports::DeploymentNotification;

    #[derive(Default)]
    struct FakeStore {
        deployments: Mutex<Vec<Deployment>>,
    }

    #[async_trait]
    impl DeploymentStore for FakeStore {
        async fn deployment(&self, deployment_id: &DeploymentId) -> Result<Deployment, StoreError> {
            self.deployments
                .lock()
                .expect("mutex poisoned")
                .iter()
                .find(|deployment| &deployment.id == deployment_id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(deployment_id.to_string()))
        }

        async fn active_or_canary_deployment(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError> {
            Ok(self
                .deployments
                .lock()
                .expect("mutex poisoned")
                .iter()
                .find(|deployment| {
                    &deployment.ruleset_id == ruleset_id
                        && matches!(deployment.status, DeploymentStatus::Canary | DeploymentStatus::Active)
                })
                .cloned())
        }

        async fn most_recent_deprecated(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError> {
            Ok(self
                .deployments
                .lock()
                .expect("mutex poisoned")
                .iter()
                .find(|deployment| &deployment.ruleset_id == ruleset_id && deployment.status == DeploymentStatus::Deprecated)
                .cloned())
        }

        async fn save_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
            let mut deployments = self.deployments.lock().expect("mutex poisoned");
            if let Some(existing) = deployments.iter_mut().find(|existing| existing.id == deployment.id) {
                *existing = deployment.clone();
            } else {
                deployments.push(deployment.clone());
            }
            Ok(())
        }

        async fn delete_assignments(&self, _deployment_id: &DeploymentId) -> Result<u64, StoreError> {
            Ok(0)
        }

        async fn v2_execution_logs(
            &self,
            _deployment_id: &DeploymentId,
        ) -> Result<Vec<vantage_core::CanaryExecutionLog>, StoreError> {
            Ok(Vec::new())
        }

        async fn save_execution_log(&self, _log: &vantage_core::CanaryExecutionLog) -> Result<(), StoreError> {
            Ok(())
        }

        async fn set_execution_metadata(
            &self,
            _execution_id: &vantage_core::ExecutionId,
            _key: &str,
            _value: serde_json::Value,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn reprocessable_logs(
            &self,
            _deployment_id: &DeploymentId,
            _limit: u32,
        ) -> Result<Vec<vantage_core::CanaryExecutionLog>, StoreError> {
            Ok(Vec::new())
        }

        async fn mark_reprocessed(
            &self,
            _log_id: &vantage_core::CanaryLogId,
            _reprocessed_at: OffsetDateTime,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn append_trust_history(&self, _history: &TrustHistory) -> Result<(), StoreError> {
            Ok(())
        }

        async fn notify(&self, _notification: DeploymentNotification) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct FakeCache;

    #[async_trait]
    impl Cache for FakeCache {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, vantage_cache::CacheError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: std::time::Duration) -> Result<(), vantage_cache::CacheError> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<(), vantage_cache::CacheError> {
            Ok(())
        }

        async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, vantage_cache::CacheError> {
            Ok(0)
        }

        async fn incr(&self, _key: &str, _ttl: std::time::Duration) -> Result<i64, vantage_cache::CacheError> {
            Ok(1)
        }
    }

    fn draft_deployment() -> Deployment {
        Deployment {
            id: DeploymentId::new("d1"),
            tenant_id: TenantId::new("t1"),
            ruleset_id: RulesetId::new("r1"),
            status: DeploymentStatus::Draft,
            target_version: 2,
            previous_version: Some(1),
            canary_config: CanaryConfig::default(),
            compensation_strategy: vantage_core::CompensationStrategy::Ignore,
            canary_traffic_percentage: 0,
            started_at: None,
            promoted_at: None,
            rolled_back_at: None,
            rollback_reason: None,
            rollback_to_version: None,
            metadata: std::collections::BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn start_canary_requires_draft_status() {
        let store = FakeStore::default();
        let mut deployment = draft_deployment();
        deployment.status = DeploymentStatus::Active;
        let result = start_canary(&store, &mut deployment, 10).await;
        assert!(matches!(result, Err(TransitionError::InvalidState(_))));
    }

    #[tokio::test]
    async fn start_canary_sets_status_and_percentage() {
        let store = FakeStore::default();
        let mut deployment = draft_deployment();
        start_canary(&store, &mut deployment, 15).await.expect("start_canary should succeed");
        assert_eq!(deployment.status, DeploymentStatus::Canary);
        assert_eq!(deployment.canary_traffic_percentage, 15);
        assert!(deployment.started_at.is_some());
    }

    #[tokio::test]
    async fn rollback_requires_canary_or_active_status() {
        let store = FakeStore::default();
        let cache = FakeCache;
        let mut deployment = draft_deployment();
        let result = rollback(&store, &cache, &mut deployment, "boom".to_owned(), TriggeredBy::Auto, None).await;
        assert!(matches!(result, Err(TransitionError::InvalidState(_))));
    }

    #[tokio::test]
    async fn rollback_restores_most_recent_deprecated_deployment() {
        let store = FakeStore::default();
        let cache = FakeCache;
        let mut previous = draft_deployment();
        previous.id = DeploymentId::new("d0");
        previous.status = DeploymentStatus::Deprecated;
        previous.target_version = 1;
        store.save_deployment(&previous).await.expect("seed save should succeed");

        let mut deployment = draft_deployment();
        deployment.status = DeploymentStatus::Canary;
        let outcome = rollback(&store, &cache, &mut deployment, "error spike".to_owned(), TriggeredBy::Auto, None)
            .await
            .expect("rollback should succeed");

        assert_eq!(deployment.status, DeploymentStatus::RolledBack);
        assert_eq!(deployment.rollback_to_version, Some(1));
        let restored = outcome.restored.expect("a deprecated deployment should have been restored");
        assert_eq!(restored.status, DeploymentStatus::Active);
    }
}
