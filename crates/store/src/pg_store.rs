// vantage-store/src/pg_store.rs
// ============================================================================
// Module: Postgres Store
// Description: The connection pool + schema bootstrap shared by all four
//              port implementations.
// Purpose: One `PgStore::connect` per process; everything else borrows it.
// Dependencies: sqlx, vantage-config
// ============================================================================

//! ## Overview
//! Mirrors the teacher's `SqliteRunStateStore::new` — validate configured
//! limits, open the connection (here: a pool), bring the schema current,
//! and return a ready-to-use handle. Unlike the teacher, there is no
//! dedicated single-writer thread: `sqlx::PgPool` already serializes per
//! connection and Postgres handles concurrent writers natively, so the
//! mpsc writer-batching the teacher needed purely to tame `SQLite`'s
//! single-writer constraint has no counterpart here.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use vantage_config::DatabaseConfig;

use crate::error::SqlError;
use crate::schema::ensure_schema;

/// Errors that can occur while establishing a [`PgStore`].
#[derive(Debug, Error)]
pub enum StoreInitError {
    /// The pool could not be established.
    #[error("failed to connect to the store database: {0}")]
    Connect(#[source] sqlx::Error),
    /// Schema bootstrap failed.
    #[error("failed to initialize the store schema: {0}")]
    Schema(#[source] SqlError),
}

/// The shared Postgres-backed handle implementing `JudgmentStore`,
/// `DeploymentStore`, `SchedulerStore`, and `AuditSink`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    /// Opens a pool against `config.url`, applies the bootstrap DDL, and
    /// returns a ready handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreInitError`] when the pool cannot be established or
    /// schema bootstrap fails.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreInitError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.query_timeout)
            .connect(&config.url)
            .await
            .map_err(StoreInitError::Connect)?;
        ensure_schema(&pool).await.map_err(StoreInitError::Schema)?;
        Ok(Self { pool })
    }

    /// Wraps an already-open pool, skipping schema bootstrap. Used by tests
    /// that manage their own ephemeral database lifecycle.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Confirms the pool can still reach the database, for a readiness probe.
    ///
    /// # Errors
    ///
    /// Returns [`sqlx::Error`] when the connectivity check fails.
    pub async fn readiness(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }

    /// Fetches one stored execution by id.
    ///
    /// Not part of any engine port (no engine needs a single execution by
    /// id, only the lookups the ports already expose); `vantage-api`'s
    /// replay/what-if endpoints call this directly against the concrete
    /// store rather than widening `JudgmentStore` for one admin-surface read.
    ///
    /// # Errors
    ///
    /// Returns [`SqlError::NotFound`] if no such execution exists.
    pub async fn judgment_execution(&self, execution_id: &vantage_core::ExecutionId) -> Result<vantage_core::JudgmentExecution, SqlError> {
        let row: (serde_json::Value,) = sqlx::query_as("SELECT data FROM judgment_executions WHERE id = $1")
            .bind(execution_id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| SqlError::NotFound(format!("judgment_execution {execution_id}")))?;
        crate::error::decode_json("judgment_executions", row.0)
    }
}
