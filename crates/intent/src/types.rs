// vantage-intent/src/types.rs
// ============================================================================
// Module: Intent Taxonomy
// Description: The bounded intent set and routing targets C4 classifies into.
// Purpose: Give every downstream component a closed, versioned vocabulary.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.1, the intent set and routing-target set are both
//! bounded and closed; adding a member is a breaking change to every
//! consumer, not a runtime configuration choice.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The bounded set of intents C4 may classify an utterance into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// A single point-in-time state check.
    Check,
    /// A trend over a time range.
    Trend,
    /// A comparison across entities or periods.
    Compare,
    /// A ranking across entities.
    Rank,
    /// Root-cause analysis.
    FindCause,
    /// Anomaly detection.
    DetectAnomaly,
    /// Forecasting.
    Predict,
    /// Counterfactual / what-if analysis.
    WhatIf,
    /// A structured report.
    Report,
    /// A notification or alert request.
    Notify,
    /// Continuation of a prior multi-turn exchange.
    Continue,
    /// A request for clarification.
    Clarify,
    /// A stop/cancel request.
    Stop,
    /// A system/meta request (e.g. help, capabilities).
    System,
}

/// The executor family an intent routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingTarget {
    /// Routes to the judgment engine (C8) — the only target implemented here.
    Judgment,
    /// Routes to an external workflow planner.
    Workflow,
    /// Routes to an external text-to-SQL / BI planner.
    Bi,
    /// Routes to an external learning agent.
    Learning,
    /// Falls back to a free-form model passthrough.
    General,
}

/// Which stage produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// The rule stage matched.
    Rule,
    /// The model stage (C3) was consulted.
    Model,
}

/// The output of a single classification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// The classified intent.
    pub intent: Intent,
    /// The executor this intent routes to.
    pub target_agent: RoutingTarget,
    /// Extracted slot values.
    pub slots: BTreeMap<String, Value>,
    /// The utterance, possibly rewritten for the downstream executor.
    pub processed_request: String,
    /// Which stage produced this classification.
    pub source: ClassificationSource,
    /// The rule pattern that matched, when `source == Rule`.
    pub rule_pattern: Option<String>,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}
