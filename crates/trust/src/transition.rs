// vantage-trust/src/transition.rs
// ============================================================================
// Module: Trust Level Transitions
// Description: Promote/demote decision logic per `spec.md` §4.4.
// Purpose: Decide whether a ruleset's trust level should change, and why.
// Dependencies: vantage-core::domain, time
// ============================================================================

//! ## Overview
//! Promotion requires score, execution, and accuracy thresholds to all clear
//! simultaneously, plus no demotion within a cooldown window. Demotion is
//! immediate on an accuracy drop or a negative-feedback burst, bypassing the
//! cooldown entirely — safety transitions are never throttled.

use time::Duration as TimeDuration;
use time::OffsetDateTime;
use vantage_core::TriggeredBy;
use vantage_core::TrustLevel;

/// Per-current-level thresholds governing promotion and demotion.
#[derive(Debug, Clone, Copy)]
pub struct LevelThresholds {
    /// Minimum composed score required to promote out of this level.
    pub promote_threshold: Option<f64>,
    /// Minimum execution count required to promote out of this level.
    pub min_executions: u64,
    /// Minimum accuracy rate required to promote out of this level.
    pub min_accuracy: Option<f64>,
    /// Accuracy rate below which this level immediately demotes.
    pub demote_accuracy: Option<f64>,
    /// Negative feedback burst size that immediately demotes this level.
    pub demote_neg_count: Option<u64>,
}

/// The full, per-level threshold table plus the promotion cooldown.
#[derive(Debug, Clone, Copy)]
pub struct TrustThresholds {
    /// Thresholds indexed by current [`TrustLevel::as_u8`].
    pub per_level: [LevelThresholds; 4],
    /// Minimum time since the last demotion before a promotion is considered.
    pub promote_cooldown: TimeDuration,
}

impl Default for TrustThresholds {
    fn default() -> Self {
        Self {
            per_level: [
                LevelThresholds {
                    promote_threshold: Some(0.6),
                    min_executions: 50,
                    min_accuracy: Some(0.85),
                    demote_accuracy: None,
                    demote_neg_count: Some(10),
                },
                LevelThresholds {
                    promote_threshold: Some(0.75),
                    min_executions: 200,
                    min_accuracy: Some(0.9),
                    demote_accuracy: Some(0.6),
                    demote_neg_count: Some(8),
                },
                LevelThresholds {
                    promote_threshold: Some(0.85),
                    min_executions: 500,
                    min_accuracy: Some(0.95),
                    demote_accuracy: Some(0.7),
                    demote_neg_count: Some(6),
                },
                LevelThresholds {
                    promote_threshold: None,
                    min_executions: 0,
                    min_accuracy: None,
                    demote_accuracy: Some(0.8),
                    demote_neg_count: Some(5),
                },
            ],
            promote_cooldown: TimeDuration::minutes(60),
        }
    }
}

/// A decided trust transition, ready to be written as a `TrustHistory` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecision {
    /// The level to transition to.
    pub new_level: TrustLevel,
    /// Human-readable reason.
    pub reason: String,
    /// What triggered the decision.
    pub triggered_by: TriggeredBy,
}

/// The inputs `evaluate` needs to decide a transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionInputs {
    /// Current trust level.
    pub current_level: TrustLevel,
    /// Composed trust score.
    pub score: f64,
    /// Total execution count.
    pub execution_count: u64,
    /// Observed accuracy rate, or `None` absent feedback.
    pub accuracy_rate: Option<f64>,
    /// Count of negative feedback received since the last evaluation.
    pub recent_negative_feedback: u64,
    /// When the ruleset was last demoted, if ever.
    pub last_demoted_at: Option<OffsetDateTime>,
    /// The time to evaluate cooldowns against.
    pub now: OffsetDateTime,
}

/// Evaluates whether `inputs` warrants a promotion or demotion.
///
/// Demotion is checked first and is never subject to the cooldown; promotion
/// is only considered when no demotion fires and the cooldown has elapsed.
#[must_use]
pub fn evaluate(inputs: TransitionInputs, thresholds: &TrustThresholds) -> Option<TransitionDecision> {
    let level_thresholds = thresholds.per_level[inputs.current_level.as_u8() as usize];

    if let Some(demote_accuracy) = level_thresholds.demote_accuracy {
        if let Some(accuracy) = inputs.accuracy_rate {
            if accuracy < demote_accuracy {
                if let Some(new_level) = inputs.current_level.demoted() {
                    return Some(TransitionDecision {
                        new_level,
                        reason: format!("accuracy {accuracy:.3} fell below demotion threshold {demote_accuracy:.3}"),
                        triggered_by: TriggeredBy::Auto,
                    });
                }
            }
        }
    }
    if let Some(demote_neg_count) = level_thresholds.demote_neg_count {
        if inputs.recent_negative_feedback >= demote_neg_count {
            if let Some(new_level) = inputs.current_level.demoted() {
                return Some(TransitionDecision {
                    new_level,
                    reason: format!(
                        "{} negative feedback events exceeded threshold {demote_neg_count}",
                        inputs.recent_negative_feedback
                    ),
                    triggered_by: TriggeredBy::Feedback,
                });
            }
        }
    }

    let cooldown_elapsed = inputs
        .last_demoted_at
        .is_none_or(|last| inputs.now - last >= thresholds.promote_cooldown);
    if !cooldown_elapsed {
        return None;
    }

    let Some(promote_threshold) = level_thresholds.promote_threshold else {
        return None;
    };
    let Some(min_accuracy) = level_thresholds.min_accuracy else {
        return None;
    };
    let accuracy_ok = inputs.accuracy_rate.is_some_and(|accuracy| accuracy >= min_accuracy);
    let score_ok = inputs.score >= promote_threshold;
    let executions_ok = inputs.execution_count >= level_thresholds.min_executions;

    if score_ok && executions_ok && accuracy_ok {
        if let Some(new_level) = inputs.current_level.promoted() {
            return Some(TransitionDecision {
                new_level,
                reason: format!(
                    "score {:.3} >= {promote_threshold:.3}, executions {} >= {}, accuracy >= {min_accuracy:.3}",
                    inputs.score, inputs.execution_count, level_thresholds.min_executions
                ),
                triggered_by: TriggeredBy::Auto,
            });
        }
    }

    None
}

/// Builds a manual transition decision, bypassing all thresholds.
///
/// Callers must still supply `reason`; manual changes are never silent.
#[must_use]
pub fn manual(new_level: TrustLevel, reason: impl Into<String>) -> TransitionDecision {
    TransitionDecision {
        new_level,
        reason: reason.into(),
        triggered_by: TriggeredBy::Manual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn base_inputs(current_level: TrustLevel) -> TransitionInputs {
        TransitionInputs {
            current_level,
            score: 0.0,
            execution_count: 0,
            accuracy_rate: None,
            recent_negative_feedback: 0,
            last_demoted_at: None,
            now: datetime!(2026 - 07 - 27 00:00:00 UTC),
        }
    }

    #[test]
    fn promotes_when_all_thresholds_clear() {
        let thresholds = TrustThresholds::default();
        let inputs = TransitionInputs {
            score: 0.97,
            execution_count: 1000,
            accuracy_rate: Some(0.97),
            ..base_inputs(TrustLevel::AlertOnly)
        };
        let decision = evaluate(inputs, &thresholds).expect("should promote");
        assert_eq!(decision.new_level, TrustLevel::LowRiskAuto);
        assert_eq!(decision.triggered_by, TriggeredBy::Auto);
    }

    #[test]
    fn does_not_promote_below_execution_floor() {
        let thresholds = TrustThresholds::default();
        let inputs = TransitionInputs {
            score: 0.99,
            execution_count: 1,
            accuracy_rate: Some(0.99),
            ..base_inputs(TrustLevel::AlertOnly)
        };
        assert!(evaluate(inputs, &thresholds).is_none());
    }

    #[test]
    fn demotes_immediately_on_accuracy_drop_ignoring_cooldown() {
        let thresholds = TrustThresholds::default();
        let inputs = TransitionInputs {
            accuracy_rate: Some(0.1),
            last_demoted_at: Some(datetime!(2026 - 07 - 27 00:00:00 UTC)),
            now: datetime!(2026 - 07 - 27 00:00:01 UTC),
            ..base_inputs(TrustLevel::LowRiskAuto)
        };
        let decision = evaluate(inputs, &thresholds).expect("should demote");
        assert_eq!(decision.new_level, TrustLevel::AlertOnly);
    }

    #[test]
    fn promotion_blocked_within_cooldown_after_demotion() {
        let thresholds = TrustThresholds::default();
        let inputs = TransitionInputs {
            score: 0.99,
            execution_count: 1000,
            accuracy_rate: Some(0.99),
            last_demoted_at: Some(datetime!(2026 - 07 - 27 00:00:00 UTC)),
            now: datetime!(2026 - 07 - 27 00:01:00 UTC),
            ..base_inputs(TrustLevel::AlertOnly)
        };
        assert!(evaluate(inputs, &thresholds).is_none());
    }

    #[test]
    fn proposed_level_has_no_demotion_floor() {
        let thresholds = TrustThresholds::default();
        let inputs = TransitionInputs {
            accuracy_rate: Some(0.0),
            ..base_inputs(TrustLevel::Proposed)
        };
        assert!(evaluate(inputs, &thresholds).is_none());
    }
}
