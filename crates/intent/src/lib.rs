// vantage-intent/src/lib.rs
// ============================================================================
// Module: Vantage Intent Library
// Description: Rules-first / model-fallback utterance classification (C4).
// Purpose: Map an utterance to a bounded intent and routing target.
// Dependencies: vantage-core, vantage-providers
// ============================================================================

//! ## Overview
//! `vantage-intent` implements C4 end to end: [`rules`] holds the ordered
//! keyword registry scanned first, [`classifier`] runs the two-stage
//! procedure (rule stage, then C3 on no hit), and [`types`] defines the
//! closed intent/routing vocabularies every other component shares.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classifier;
pub mod rules;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classifier::classify;
pub use classifier::default_routing_target;
pub use rules::Pattern;
pub use rules::PatternRegistry;
pub use types::Classification;
pub use types::ClassificationSource;
pub use types::Intent;
pub use types::RoutingTarget;
