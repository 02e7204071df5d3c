// vantage-store/src/admin.rs
// ============================================================================
// Module: Admin Queries
// Description: Ruleset/version/trust-history reads and writes no engine port
//              needs, only the HTTP admin surface (`/rulesets`, `/trust`).
// Purpose: Give vantage-api the CRUD vantage.md §6 names without widening
//          JudgmentStore/DeploymentStore/SchedulerStore for one-off callers.
// Dependencies: sqlx, vantage-core
// ============================================================================

//! ## Overview
//! Same precedent as [`crate::pg_store::PgStore::judgment_execution`]: these
//! are inherent methods, not trait impls, because no engine reads a ruleset
//! list, creates one, or lists trust history — only an operator does, over
//! HTTP. `vantage-api` calls these directly against the concrete store.

use serde_json::Value;
use time::OffsetDateTime;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::RulesetVersion;
use vantage_core::TenantId;
use vantage_core::TrustHistory;

use crate::error::SqlError;
use crate::error::decode_json;
use crate::pg_store::PgStore;

impl PgStore {
    /// Lists every ruleset owned by `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError`] if the query or a row's decode fails.
    pub async fn list_rulesets(&self, tenant_id: &TenantId) -> Result<Vec<Ruleset>, SqlError> {
        let rows: Vec<(Value,)> = sqlx::query_as("SELECT data FROM rulesets WHERE tenant_id = $1 ORDER BY name")
            .bind(tenant_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|(data,)| decode_json("rulesets", data)).collect()
    }

    /// Inserts a newly created ruleset row.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError`] if a ruleset with the same id already exists or
    /// the insert otherwise fails.
    pub async fn create_ruleset(&self, ruleset: &Ruleset) -> Result<(), SqlError> {
        let data = serde_json::to_value(ruleset).map_err(|source| SqlError::Decode { table: "rulesets", source })?;
        sqlx::query("INSERT INTO rulesets (id, tenant_id, name, data) VALUES ($1, $2, $3, $4)")
            .bind(ruleset.id.as_str())
            .bind(ruleset.tenant_id.as_str())
            .bind(&ruleset.name)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrites an existing ruleset row with `ruleset`'s current state.
    /// Used by `PATCH /rulesets/{id}` (name only) and by trust mutations
    /// that need to persist a hand-authored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::NotFound`] if no such ruleset exists.
    pub async fn save_ruleset(&self, ruleset: &Ruleset) -> Result<(), SqlError> {
        let data = serde_json::to_value(ruleset).map_err(|source| SqlError::Decode { table: "rulesets", source })?;
        let result = sqlx::query("UPDATE rulesets SET name = $1, data = $2 WHERE id = $3")
            .bind(&ruleset.name)
            .bind(data)
            .bind(ruleset.id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(SqlError::NotFound(format!("ruleset {}", ruleset.id)));
        }
        Ok(())
    }

    /// Deletes a ruleset row. Does not cascade to versions, deployments, or
    /// history — an operator deleting a ruleset with live deployments is a
    /// misuse this endpoint does not attempt to guard against beyond the
    /// foreign-key-free document-table model already in place.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::NotFound`] if no such ruleset exists.
    pub async fn delete_ruleset(&self, ruleset_id: &RulesetId) -> Result<(), SqlError> {
        let result = sqlx::query("DELETE FROM rulesets WHERE id = $1").bind(ruleset_id.as_str()).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(SqlError::NotFound(format!("ruleset {ruleset_id}")));
        }
        Ok(())
    }

    /// The next monotonic version number for `ruleset_id` (1 if none exist).
    ///
    /// # Errors
    ///
    /// Returns [`SqlError`] if the query fails.
    pub async fn next_ruleset_version(&self, ruleset_id: &RulesetId) -> Result<u32, SqlError> {
        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM ruleset_versions WHERE ruleset_id = $1")
            .bind(ruleset_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(row.0).unwrap_or(0) + 1)
    }

    /// Inserts a new immutable ruleset version row.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError`] if a row for the same `(ruleset_id, version)`
    /// already exists or the insert otherwise fails.
    pub async fn create_ruleset_version(&self, version: &RulesetVersion) -> Result<(), SqlError> {
        let data = serde_json::to_value(version).map_err(|source| SqlError::Decode { table: "ruleset_versions", source })?;
        sqlx::query("INSERT INTO ruleset_versions (ruleset_id, version, data) VALUES ($1, $2, $3)")
            .bind(version.ruleset_id.as_str())
            .bind(i64::from(version.version))
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Lists `ruleset_id`'s trust transitions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError`] if the query or a row's decode fails.
    pub async fn trust_history(&self, ruleset_id: &RulesetId) -> Result<Vec<TrustHistory>, SqlError> {
        let rows: Vec<(Value,)> = sqlx::query_as("SELECT data FROM trust_level_history WHERE ruleset_id = $1 ORDER BY created_at DESC LIMIT 200")
            .bind(ruleset_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|(data,)| decode_json("trust_level_history", data)).collect()
    }
}

/// Builds a brand-new [`Ruleset`] at level `Proposed` with empty trust
/// history, the state a freshly created ruleset starts in before its first
/// version or judgment.
#[must_use]
pub fn new_ruleset(id: RulesetId, tenant_id: TenantId, name: String, now: OffsetDateTime) -> Ruleset {
    Ruleset {
        id,
        tenant_id,
        name,
        active_version: None,
        trust_level: vantage_core::TrustLevel::Proposed,
        trust_score: 0.0,
        trust_components: vantage_core::TrustComponents { accuracy: 0.5, consistency: 0.5, frequency: 0.0, feedback: 0.5, age: 0.0 },
        execution_count: 0,
        positive_feedback_count: 0,
        negative_feedback_count: 0,
        accuracy_rate: None,
        last_execution_at: None,
        last_promoted_at: None,
        last_demoted_at: None,
        created_at: now,
    }
}
