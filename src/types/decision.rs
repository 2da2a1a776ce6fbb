//! Decision data structures produced by the fraud engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final action for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Review,
    Block,
}

impl Decision {
    /// Map a bounded total score onto a decision.
    ///
    /// Lower bounds are inclusive: a score equal to `review` is reviewed and
    /// a score equal to `block` is blocked.
    pub fn from_score(score: f64, thresholds: &DecisionThresholds) -> Self {
        if score >= thresholds.block {
            Decision::Block
        } else if score >= thresholds.review {
            Decision::Review
        } else {
            Decision::Approve
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Review => "review",
            Decision::Block => "block",
        }
    }
}

/// Configurable decision thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Scores at or above this are sent to manual review
    pub review: f64,
    /// Scores at or above this are blocked
    pub block: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            review: 0.30,
            block: 0.70,
        }
    }
}

/// Scored outcome for a transaction that passed the hard rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Probability of fraud reported by the model (0.0 - 1.0)
    pub model_score: f64,
    /// Unclamped heuristic contribution
    pub heuristic_score: f64,
    /// `min(model_score + heuristic_score, 1.0)`
    pub total_score: f64,
    /// Heuristic reasons in evaluation order
    pub triggered_reasons: Vec<String>,
    pub decision: Decision,
}

/// Result of evaluating one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    /// Failed a hard rule; always blocked, the model never ran
    Rejected { reason: String },
    /// Scored by the model and heuristics
    Assessed(RiskAssessment),
}

impl Evaluation {
    pub fn decision(&self) -> Decision {
        match self {
            Evaluation::Rejected { .. } => Decision::Block,
            Evaluation::Assessed(assessment) => assessment.decision,
        }
    }

    pub fn assessment(&self) -> Option<&RiskAssessment> {
        match self {
            Evaluation::Rejected { .. } => None,
            Evaluation::Assessed(assessment) => Some(assessment),
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Evaluation::Rejected { reason } => Some(reason),
            Evaluation::Assessed(_) => None,
        }
    }
}

/// Decision envelope published for every evaluated transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudDecision {
    /// Unique decision identifier
    pub decision_id: String,

    /// Associated transaction ID
    pub transaction_id: String,

    /// Final action
    pub decision: Decision,

    /// Hard-rule reason when the transaction was rejected outright
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// Score breakdown when the transaction was assessed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<RiskAssessment>,

    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudDecision {
    /// Wrap an evaluation for publishing
    pub fn new(transaction_id: String, evaluation: Evaluation) -> Self {
        let decision = evaluation.decision();
        let (rejection_reason, assessment) = match evaluation {
            Evaluation::Rejected { reason } => (Some(reason), None),
            Evaluation::Assessed(assessment) => (None, Some(assessment)),
        };

        Self {
            decision_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            decision,
            rejection_reason,
            assessment,
            timestamp: Utc::now(),
        }
    }
}
