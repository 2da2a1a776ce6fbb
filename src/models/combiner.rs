//! Combination of model and heuristic scores into a decision

use crate::rules::heuristic::HeuristicScore;
use crate::types::decision::{Decision, DecisionThresholds, RiskAssessment};

/// Merges the model probability with the heuristic score.
///
/// The two sources are added 1:1 and clamped to 1.0; no weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskCombiner {
    thresholds: DecisionThresholds,
}

impl RiskCombiner {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        &self.thresholds
    }

    /// Bounded total of both sources
    pub fn total_score(model_score: f64, heuristic_score: f64) -> f64 {
        (model_score + heuristic_score).min(1.0)
    }

    /// Combine scores without reasons.
    pub fn combine(&self, model_score: f64, heuristic_score: f64) -> RiskAssessment {
        self.combine_with_reasons(
            model_score,
            HeuristicScore {
                score: heuristic_score,
                reasons: Vec::new(),
            },
        )
    }

    /// Combine scores, carrying the heuristic reasons into the assessment.
    pub fn combine_with_reasons(&self, model_score: f64, heuristic: HeuristicScore) -> RiskAssessment {
        let total_score = Self::total_score(model_score, heuristic.score);

        RiskAssessment {
            model_score,
            heuristic_score: heuristic.score,
            total_score,
            triggered_reasons: heuristic.reasons,
            decision: Decision::from_score(total_score, &self.thresholds),
        }
    }
}
