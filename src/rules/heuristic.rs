//! Additive pattern-based risk scoring.
//!
//! Each check contributes independently; several can fire for the same
//! transaction and their weights stack. The sum is deliberately left
//! unclamped here, the combiner bounds it.

use crate::types::transaction::TransactionType;
use serde::Deserialize;

// The >400k tier reuses the >50k label; kept verbatim so downstream
// consumers matching on reason text see the historical wording.
pub const VERY_HIGH_VALUE: &str = "High-value transaction (>50k)";
pub const HIGH_VALUE: &str = "High-value transaction (>50k)";
pub const DRAINS_BALANCE: &str = "Amount drains >90% of sender balance";
pub const ZERO_BALANCE: &str = "Sender balance becomes zero";
pub const HIGH_RISK_TYPE: &str = "High-risk transaction type (CASH_OUT)";

/// Tiers and weights of the heuristic checks
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeuristicRules {
    pub very_high_amount: f64,
    pub high_amount: f64,
    /// Fraction of the sender balance above which a transfer counts as a drain
    pub drain_ratio: f64,
    pub very_high_amount_weight: f64,
    pub high_amount_weight: f64,
    pub drain_weight: f64,
    pub zero_balance_weight: f64,
    pub high_risk_type_weight: f64,
}

impl Default for HeuristicRules {
    fn default() -> Self {
        Self {
            very_high_amount: 400_000.0,
            high_amount: 40_000.0,
            drain_ratio: 0.9,
            very_high_amount_weight: 0.3,
            high_amount_weight: 0.3,
            drain_weight: 0.3,
            zero_balance_weight: 0.2,
            high_risk_type_weight: 0.2,
        }
    }
}

impl HeuristicRules {
    /// Weights and tiers must be finite and non-negative so the score
    /// never drops below zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        let settings = [
            ("very_high_amount", self.very_high_amount),
            ("high_amount", self.high_amount),
            ("drain_ratio", self.drain_ratio),
            ("very_high_amount_weight", self.very_high_amount_weight),
            ("high_amount_weight", self.high_amount_weight),
            ("drain_weight", self.drain_weight),
            ("zero_balance_weight", self.zero_balance_weight),
            ("high_risk_type_weight", self.high_risk_type_weight),
        ];

        for (name, value) in settings {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Heuristic setting {} must be non-negative, got {}", name, value);
            }
        }
        Ok(())
    }
}

/// Accumulated heuristic score with the reasons that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl HeuristicScore {
    fn add(&mut self, weight: f64, reason: &str) {
        self.score += weight;
        self.reasons.push(reason.to_string());
    }
}

/// Stateless scorer over the raw transaction fields
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    rules: HeuristicRules,
}

impl HeuristicScorer {
    pub fn new(rules: HeuristicRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &HeuristicRules {
        &self.rules
    }

    /// Score a transaction. Reasons keep the fixed check order.
    pub fn score(
        &self,
        amount: f64,
        sender_balance_before: f64,
        transaction_type: TransactionType,
    ) -> HeuristicScore {
        let rules = &self.rules;
        let mut result = HeuristicScore::default();

        if amount > rules.very_high_amount {
            result.add(rules.very_high_amount_weight, VERY_HIGH_VALUE);
        }

        if amount > rules.high_amount {
            result.add(rules.high_amount_weight, HIGH_VALUE);
        }

        if amount > rules.drain_ratio * sender_balance_before {
            result.add(rules.drain_weight, DRAINS_BALANCE);
        }

        // Exact equality, no tolerance.
        if sender_balance_before - amount == 0.0 {
            result.add(rules.zero_balance_weight, ZERO_BALANCE);
        }

        if transaction_type == TransactionType::CashOut || amount > rules.high_amount {
            result.add(rules.high_risk_type_weight, HIGH_RISK_TYPE);
        }

        result
    }
}
