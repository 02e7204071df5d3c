// vantage-store/src/error.rs
// ============================================================================
// Module: Store Error
// Description: The one internal error type, converted into each port's own
//              StoreError/SinkError at the trait boundary.
// Purpose: Avoid four parallel error-handling paths for one Postgres pool.
// Dependencies: sqlx
// ============================================================================

//! ## Overview
//! Every `vantage-*` port crate declares its own `StoreError` (NotFound /
//! Backend) rather than depending on this crate, per the ports-own-their-
//! error-type convention established in `vantage-judgment::ports`. This
//! crate has one internal error, [`SqlError`], and a `From` impl into each
//! port's error enum so call sites can still use `?`.

use thiserror::Error;

/// The internal error type every `PgStore` method surfaces before it is
/// converted into the calling port's own error enum.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The query or connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// A JSONB column failed to deserialize into its domain type.
    #[error("corrupt row in {table}: {source}")]
    Decode {
        /// The table the corrupt row came from.
        table: &'static str,
        /// The underlying deserialization failure.
        source: serde_json::Error,
    },
}

impl From<SqlError> for vantage_judgment::StoreError {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<SqlError> for vantage_deployment::StoreError {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<SqlError> for vantage_scheduler::StoreError {
    fn from(error: SqlError) -> Self {
        match error {
            SqlError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<SqlError> for vantage_audit::SinkError {
    fn from(error: SqlError) -> Self {
        Self::Backend(error.to_string())
    }
}

/// Decodes a JSONB column's already-parsed `Value` into `T`, wrapping any
/// failure as [`SqlError::Decode`].
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(table: &'static str, value: serde_json::Value) -> Result<T, SqlError> {
    serde_json::from_value(value).map_err(|source| SqlError::Decode { table, source })
}
