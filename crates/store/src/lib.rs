// vantage-store/src/lib.rs
// ============================================================================
// Module: Vantage Store Library
// Description: The single Postgres-backed adapter satisfying every port the
//              decision-and-deployment core's engines depend on.
// Purpose: Keep sqlx, schema DDL, and SQL text out of every engine crate.
// Dependencies: sqlx, vantage-core, vantage-config, vantage-judgment,
//               vantage-deployment, vantage-scheduler, vantage-audit
// ============================================================================

//! ## Overview
//! [`PgStore`] is the one type in this crate a caller constructs directly;
//! everything else is a trait impl block discovered through the ports each
//! engine crate already defines (`vantage_judgment::JudgmentStore`,
//! `vantage_deployment::DeploymentStore`, `vantage_scheduler::SchedulerStore`,
//! `vantage_audit::AuditSink`). A binary wires one `PgStore` and hands `&dyn`
//! references of each trait to the engines that need them.
//!
//! Every table is a document table: a handful of indexed columns for the
//! predicates queries actually filter or sort on, plus one `data JSONB`
//! column holding the full canonical domain value. See [`schema`] for the
//! rationale and [`error::decode_json`] for the shared decode path.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod admin;
mod audit_sink;
mod deployment_store;
pub mod error;
mod judgment_store;
pub mod pg_store;
mod scheduler_store;
mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use admin::new_ruleset;
pub use error::SqlError;
pub use pg_store::PgStore;
pub use pg_store::StoreInitError;
