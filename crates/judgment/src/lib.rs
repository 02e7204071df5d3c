// vantage-judgment/src/lib.rs
// ============================================================================
// Module: Vantage Judgment Library
// Description: The judgment engine (C8) and its replay/what-if variant.
// Purpose: Turn a ruleset + input into a cached, trust-gated decision.
// Dependencies: vantage-core, vantage-cache, vantage-canary, vantage-providers
// ============================================================================

//! ## Overview
//! `vantage-judgment` is the core decision procedure: [`engine`] runs the
//! nine-step evaluate() call against a [`ports::JudgmentStore`], and
//! [`replay`] re-runs a past execution's input against a different version
//! or policy without touching the cache or execution log, per
//! `SPEC_FULL.md`'s replay/what-if supplement.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod engine;
pub mod ports;
pub mod replay;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::DEFAULT_MODEL_WEIGHT;
pub use engine::DEFAULT_RULE_WEIGHT;
pub use engine::MODEL_OVERRIDE_MARGIN;
pub use engine::evaluate;
pub use ports::GuardState;
pub use ports::JudgmentStore;
pub use ports::StoreError;
pub use replay::ReplayComparison;
pub use replay::ReplayResult;
pub use replay::ReplayTarget;
pub use replay::replay_execution;
pub use replay::what_if;
pub use types::JudgmentError;
pub use types::JudgmentOutcome;
pub use types::JudgmentRequest;
