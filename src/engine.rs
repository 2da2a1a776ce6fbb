//! Evaluation of a single transaction end to end.
//!
//! Order is fixed: hard rules first, and only a valid transaction is
//! projected and sent to the model. The heuristic scorer runs on the raw
//! transaction and its result is combined with the model probability.

use crate::config::AppConfig;
use crate::error::OracleError;
use crate::feature_projector::FeatureProjector;
use crate::models::combiner::RiskCombiner;
use crate::models::oracle::ModelOracle;
use crate::rules::hard::{HardRuleValidator, Verdict};
use crate::rules::heuristic::HeuristicScorer;
use crate::types::decision::Evaluation;
use crate::types::transaction::Transaction;
use tracing::{debug, warn};

/// Reason given for transactions carrying NaN or infinite amounts/balances
pub const NON_FINITE_INPUT: &str = "Non-finite monetary value";

/// Fraud decision engine over an injected model oracle
pub struct FraudEngine<O> {
    validator: HardRuleValidator,
    projector: FeatureProjector,
    scorer: HeuristicScorer,
    combiner: RiskCombiner,
    oracle: O,
}

impl<O: ModelOracle> FraudEngine<O> {
    /// Engine with every rule at its default setting
    pub fn new(oracle: O) -> Self {
        Self {
            validator: HardRuleValidator::default(),
            projector: FeatureProjector::new(),
            scorer: HeuristicScorer::default(),
            combiner: RiskCombiner::default(),
            oracle,
        }
    }

    /// Engine configured from the application config
    pub fn from_config(config: &AppConfig, oracle: O) -> Self {
        Self {
            validator: HardRuleValidator::new(config.rules.balance_tolerance),
            projector: FeatureProjector::new(),
            scorer: HeuristicScorer::new(config.rules.heuristics.clone()),
            combiner: RiskCombiner::new(config.decision),
            oracle,
        }
    }

    pub fn with_validator(mut self, validator: HardRuleValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_scorer(mut self, scorer: HeuristicScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_combiner(mut self, combiner: RiskCombiner) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Evaluate a transaction.
    ///
    /// A hard-rule violation is a normal `Rejected` outcome. An error means
    /// the oracle could not score the transaction; no decision was reached.
    pub fn evaluate(&self, tx: &Transaction) -> Result<Evaluation, OracleError> {
        // NaN compares false against every rule, so it would otherwise pass.
        if !tx.is_well_formed() {
            warn!(
                transaction_id = %tx.transaction_id,
                "Transaction rejected: non-finite monetary value"
            );
            return Ok(Evaluation::Rejected {
                reason: NON_FINITE_INPUT.to_string(),
            });
        }

        if let Verdict::Invalid(reason) = self.validator.validate(tx) {
            warn!(
                transaction_id = %tx.transaction_id,
                reason = %reason,
                "Transaction rejected by hard rules"
            );
            return Ok(Evaluation::Rejected { reason });
        }

        let features = self.projector.project(tx, self.oracle.feature_schema());
        let model_score = self.oracle.predict_fraud_probability(&features)?;

        let heuristic = self
            .scorer
            .score(tx.amount, tx.sender_balance_before, tx.transaction_type);

        let assessment = self.combiner.combine_with_reasons(model_score, heuristic);

        debug!(
            transaction_id = %tx.transaction_id,
            model_score = assessment.model_score,
            heuristic_score = assessment.heuristic_score,
            total_score = assessment.total_score,
            decision = assessment.decision.as_str(),
            "Transaction assessed"
        );

        Ok(Evaluation::Assessed(assessment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_projector::{FeatureSchema, FeatureVector};
    use crate::models::oracle::StaticOracle;
    use crate::types::decision::{Decision, DecisionThresholds};
    use crate::types::transaction::TransactionType;

    struct FailingOracle {
        schema: FeatureSchema,
    }

    impl ModelOracle for FailingOracle {
        fn feature_schema(&self) -> &FeatureSchema {
            &self.schema
        }

        fn predict_fraud_probability(&self, _: &FeatureVector) -> Result<f64, OracleError> {
            Err(OracleError::Unavailable("model not loaded".to_string()))
        }
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["step", "amount", "balance_diff_orig", "type_TRANSFER"])
    }

    #[test]
    fn test_invalid_transaction_skips_oracle() {
        let engine = FraudEngine::new(StaticOracle::new(schema(), 0.0));
        let tx = Transaction::new(1, 500.0, 100.0, 0.0, TransactionType::Transfer);

        let evaluation = engine.evaluate(&tx).unwrap();

        assert_eq!(evaluation.decision(), Decision::Block);
        assert_eq!(
            evaluation.rejection_reason(),
            Some("Amount exceeds available sender balance")
        );
        assert_eq!(engine.oracle().calls(), 0);
    }

    #[test]
    fn test_valid_transaction_is_scored() {
        let engine = FraudEngine::new(StaticOracle::new(schema(), 0.05));
        let tx = Transaction::new(1, 100.0, 10_000.0, 0.0, TransactionType::Transfer);

        let evaluation = engine.evaluate(&tx).unwrap();
        let assessment = evaluation.assessment().unwrap();

        assert_eq!(assessment.model_score, 0.05);
        assert_eq!(assessment.heuristic_score, 0.0);
        assert_eq!(assessment.decision, Decision::Approve);
        assert_eq!(engine.oracle().calls(), 1);
    }

    #[test]
    fn test_non_finite_input_blocked_before_oracle() {
        let engine = FraudEngine::new(StaticOracle::new(schema(), 0.0));

        let mut nan_amount = Transaction::new(1, 100.0, 10_000.0, 0.0, TransactionType::CashOut);
        nan_amount.amount = f64::NAN;
        let infinite_balance = Transaction::new(1, 100.0, 10_000.0, 0.0, TransactionType::Payment)
            .with_receiver_balances(0.0, f64::INFINITY);

        for tx in [nan_amount, infinite_balance] {
            let evaluation = engine.evaluate(&tx).unwrap();
            assert_eq!(evaluation.decision(), Decision::Block);
            assert_eq!(evaluation.rejection_reason(), Some(NON_FINITE_INPUT));
        }
        assert_eq!(engine.oracle().calls(), 0);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let engine = FraudEngine::new(FailingOracle { schema: schema() });
        let tx = Transaction::new(1, 100.0, 10_000.0, 0.0, TransactionType::Payment);

        assert!(matches!(
            engine.evaluate(&tx),
            Err(OracleError::Unavailable(_))
        ));
    }

    #[test]
    fn test_from_config_applies_overrides() {
        let mut config = AppConfig::default();
        config.decision = DecisionThresholds {
            review: 0.05,
            block: 0.15,
        };
        let engine = FraudEngine::from_config(&config, StaticOracle::new(schema(), 0.1));
        let tx = Transaction::new(1, 100.0, 10_000.0, 0.0, TransactionType::Payment);

        let evaluation = engine.evaluate(&tx).unwrap();
        assert_eq!(evaluation.decision(), Decision::Review);
    }
}
