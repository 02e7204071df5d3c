// vantage-scheduler/src/lib.rs
// ============================================================================
// Module: Vantage Scheduler Library
// Description: The three periodic drivers that keep canary, trust, and
//              assignment state converged without an operator in the loop (C13).
// Purpose: Wire C9-C12 and C7 together on a cadence.
// Dependencies: vantage-canary, vantage-deployment, vantage-trust, vantage-cache
// ============================================================================

//! ## Overview
//! `vantage-scheduler` owns no state of its own: each driver in [`drivers`]
//! reads through [`ports::SchedulerStore`] and calls into the
//! `vantage-canary`/`vantage-deployment`/`vantage-trust` crates that already
//! implement the pure decision logic. [`lock`] keeps two replicas from
//! running the same driver in the same window.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod drivers;
pub mod lock;
pub mod ports;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use drivers::ASSIGNMENT_SWEEPER_INTERVAL;
pub use drivers::CANARY_MONITOR_INTERVAL;
pub use drivers::TRUST_REEVALUATOR_INTERVAL;
pub use drivers::MonitorOutcome;
pub use drivers::ReevaluationOutcome;
pub use drivers::drive_forever;
pub use drivers::run_assignment_sweeper_once;
pub use drivers::run_canary_monitor_once;
pub use drivers::run_trust_reevaluator_once;
pub use ports::SchedulerStore;
pub use ports::StoreError;
