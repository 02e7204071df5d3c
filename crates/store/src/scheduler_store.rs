// vantage-store/src/scheduler_store.rs
// ============================================================================
// Module: SchedulerStore Implementation
// Description: Postgres-backed persistence for C13's three periodic drivers.
// Purpose: Give vantage-scheduler a concrete store without it depending on sqlx.
// Dependencies: sqlx, vantage-scheduler::ports, vantage-core, vantage-trust
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use vantage_core::CanaryExecutionLog;
use vantage_core::Deployment;
use vantage_core::DeploymentId;
use vantage_core::DeploymentMetricsWindow;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::TrustHistory;
use vantage_core::VersionType;
use vantage_scheduler::SchedulerStore;
use vantage_scheduler::ports::StoreError;
use vantage_trust::ScoreInputs;

use crate::error::decode_json;
use crate::pg_store::PgStore;

/// Execution-count target at which the `frequency` trust component
/// saturates to 1.0. Per spec.md §4.4 this is a configured per-tenant
/// value; until `vantage-config` exposes one, every tenant shares this
/// default.
const FREQUENCY_TARGET_EXECUTIONS: u64 = 100;
/// Age target (days) at which the `age` trust component saturates to 1.0.
const AGE_TARGET_DAYS: f64 = 30.0;
/// How many recent executions feed the `recent_result_variance` input.
const VARIANCE_LOOKBACK: i64 = 20;

fn version_type_column(version_type: VersionType) -> &'static str {
    match version_type {
        VersionType::Canary => "canary",
        VersionType::Stable => "stable",
    }
}

fn variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss, reason = "sample counts are small and never approach f64's precision limit")]
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    #[allow(clippy::cast_precision_loss, reason = "sample counts are small and never approach f64's precision limit")]
    let variance = samples.iter().map(|sample| (sample - mean).powi(2)).sum::<f64>() / samples.len() as f64;
    variance
}

#[async_trait]
impl SchedulerStore for PgStore {
    async fn canary_monitored_deployments(&self) -> Result<Vec<Deployment>, StoreError> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM deployments WHERE status = 'canary' AND (data->'canary_config'->>'auto_rollback_enabled')::boolean = TRUE",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        rows.into_iter().map(|(data,)| decode_json::<Deployment>("deployments", data).map_err(Into::into)).collect()
    }

    async fn recent_execution_logs(&self, deployment_id: &DeploymentId, version_type: VersionType) -> Result<Vec<CanaryExecutionLog>, StoreError> {
        let canary_version = match version_type {
            VersionType::Canary => "v2",
            VersionType::Stable => "v1",
        };
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM canary_execution_logs
             WHERE deployment_id = $1 AND canary_version = $2
             ORDER BY created_at DESC
             LIMIT 1000",
        )
        .bind(deployment_id.as_str())
        .bind(canary_version)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        rows.into_iter().map(|(data,)| decode_json::<CanaryExecutionLog>("canary_execution_logs", data).map_err(Into::into)).collect()
    }

    async fn stable_metrics_window(&self, deployment_id: &DeploymentId) -> Result<Option<DeploymentMetricsWindow>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT data FROM deployment_metrics WHERE deployment_id = $1 AND version_type = 'stable' ORDER BY window_end DESC LIMIT 1",
        )
        .bind(deployment_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<DeploymentMetricsWindow>("deployment_metrics", data)).transpose().map_err(Into::into)
    }

    async fn save_metrics_window(&self, window: &DeploymentMetricsWindow) -> Result<(), StoreError> {
        let data = serde_json::to_value(window).map_err(|source| crate::error::SqlError::Decode { table: "deployment_metrics", source })?;
        sqlx::query("INSERT INTO deployment_metrics (id, deployment_id, version_type, window_end, data) VALUES ($1, $2, $3, $4, $5)")
            .bind(window.id.as_str())
            .bind(window.deployment_id.as_str())
            .bind(version_type_column(window.version_type))
            .bind(window.window_end)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn rulesets_due_for_reevaluation(&self) -> Result<Vec<Ruleset>, StoreError> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM rulesets
             WHERE (data->>'execution_count')::bigint != last_trust_eval_execution_count
                OR COALESCE((data->>'positive_feedback_count')::bigint, 0) + COALESCE((data->>'negative_feedback_count')::bigint, 0)
                   != last_trust_eval_feedback_count",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        rows.into_iter().map(|(data,)| decode_json::<Ruleset>("rulesets", data).map_err(Into::into)).collect()
    }

    async fn score_inputs(&self, ruleset_id: &RulesetId) -> Result<ScoreInputs, StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM rulesets WHERE id = $1")
            .bind(ruleset_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("ruleset {ruleset_id}")))?;
        let ruleset: Ruleset = decode_json("rulesets", row.0)?;

        let confidence_rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM judgment_executions WHERE ruleset_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(ruleset_id.as_str())
        .bind(VARIANCE_LOOKBACK)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        let mut confidences = Vec::with_capacity(confidence_rows.len());
        for (data,) in confidence_rows {
            let execution: vantage_core::JudgmentExecution = decode_json("judgment_executions", data)?;
            confidences.push(execution.confidence);
        }

        let age_days = (OffsetDateTime::now_utc() - ruleset.created_at).whole_seconds().max(0) as f64 / 86_400.0;

        Ok(ScoreInputs {
            accuracy_rate: ruleset.accuracy_rate,
            recent_result_variance: variance(&confidences),
            execution_count: ruleset.execution_count,
            frequency_target: FREQUENCY_TARGET_EXECUTIONS,
            positive_feedback: ruleset.positive_feedback_count,
            negative_feedback: ruleset.negative_feedback_count,
            age_days,
            age_target_days: AGE_TARGET_DAYS,
        })
    }

    async fn save_trust_evaluation(
        &self,
        ruleset_id: &RulesetId,
        components: vantage_core::TrustComponents,
        score: f64,
        history: Option<TrustHistory>,
    ) -> Result<(), StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM rulesets WHERE id = $1")
            .bind(ruleset_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("ruleset {ruleset_id}")))?;
        let mut ruleset: Ruleset = decode_json("rulesets", row.0)?;
        ruleset.trust_components = components;
        ruleset.trust_score = score;

        if let Some(history) = &history {
            ruleset.trust_level = history.new_level;
            if history.new_level.as_u8() > history.previous_level.as_u8() {
                ruleset.last_promoted_at = Some(history.created_at);
            } else if history.new_level.as_u8() < history.previous_level.as_u8() {
                ruleset.last_demoted_at = Some(history.created_at);
            }
        }

        let data = serde_json::to_value(&ruleset).map_err(|source| crate::error::SqlError::Decode { table: "rulesets", source })?;
        sqlx::query(
            "UPDATE rulesets
             SET data = $1, last_trust_eval_execution_count = $2, last_trust_eval_feedback_count = $3
             WHERE id = $4",
        )
        .bind(data)
        .bind(i64::try_from(ruleset.execution_count).unwrap_or(i64::MAX))
        .bind(i64::try_from(ruleset.positive_feedback_count + ruleset.negative_feedback_count).unwrap_or(i64::MAX))
        .bind(ruleset_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;

        if let Some(history) = history {
            let history_data = serde_json::to_value(&history).map_err(|source| crate::error::SqlError::Decode { table: "trust_level_history", source })?;
            sqlx::query("INSERT INTO trust_level_history (id, ruleset_id, created_at, data) VALUES ($1, $2, $3, $4)")
                .bind(history.id.as_str())
                .bind(history.ruleset_id.as_str())
                .bind(history.created_at)
                .bind(history_data)
                .execute(&self.pool)
                .await
                .map_err(crate::error::SqlError::from)?;
        }
        Ok(())
    }

    async fn delete_expired_assignments(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM canary_assignments WHERE expires_at IS NOT NULL AND expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(result.rows_affected())
    }
}
