//! The model oracle seam.

use crate::error::{ensure_probability, OracleError};
use crate::feature_projector::{FeatureSchema, FeatureVector};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A pre-trained classifier exposing a probability of fraud.
///
/// Implementations declare the feature schema they were trained on; the
/// engine projects every transaction onto that schema before calling
/// [`ModelOracle::predict_fraud_probability`].
pub trait ModelOracle: Send + Sync {
    /// Feature names in the order the model consumes them
    fn feature_schema(&self) -> &FeatureSchema;

    /// Probability in [0, 1] that the transaction is fraudulent
    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError>;
}

impl<O: ModelOracle + ?Sized> ModelOracle for Box<O> {
    fn feature_schema(&self) -> &FeatureSchema {
        (**self).feature_schema()
    }

    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        (**self).predict_fraud_probability(features)
    }
}

impl<O: ModelOracle + ?Sized> ModelOracle for std::sync::Arc<O> {
    fn feature_schema(&self) -> &FeatureSchema {
        (**self).feature_schema()
    }

    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        (**self).predict_fraud_probability(features)
    }
}

/// Oracle returning a fixed probability, for tests and dry runs.
pub struct StaticOracle {
    schema: FeatureSchema,
    probability: f64,
    calls: AtomicUsize,
}

impl StaticOracle {
    pub fn new(schema: FeatureSchema, probability: f64) -> Self {
        Self {
            schema,
            probability,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of predictions served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl ModelOracle for StaticOracle {
    fn feature_schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if !features.matches(&self.schema) {
            return Err(OracleError::SchemaMismatch {
                expected: self.schema.len(),
                actual: features.len(),
            });
        }

        ensure_probability(self.probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_projector::FeatureProjector;
    use crate::types::transaction::{Transaction, TransactionType};

    #[test]
    fn test_static_oracle_counts_calls() {
        let schema = FeatureSchema::new(["amount", "step"]);
        let oracle = StaticOracle::new(schema.clone(), 0.25);
        let tx = Transaction::new(1, 10.0, 100.0, 0.0, TransactionType::Payment);
        let features = FeatureProjector::new().project(&tx, &schema);

        assert_eq!(oracle.predict_fraud_probability(&features).unwrap(), 0.25);
        assert_eq!(oracle.calls(), 1);
    }

    #[test]
    fn test_static_oracle_rejects_foreign_schema() {
        let oracle = StaticOracle::new(FeatureSchema::new(["amount", "step"]), 0.25);
        let tx = Transaction::new(1, 10.0, 100.0, 0.0, TransactionType::Payment);
        let features = FeatureProjector::new().project(&tx, &FeatureSchema::new(["amount"]));

        assert!(matches!(
            oracle.predict_fraud_probability(&features),
            Err(OracleError::SchemaMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_out_of_range_probability_is_an_error() {
        let schema = FeatureSchema::new(["amount"]);
        let oracle = StaticOracle::new(schema.clone(), 1.5);
        let tx = Transaction::new(1, 10.0, 100.0, 0.0, TransactionType::Payment);
        let features = FeatureProjector::new().project(&tx, &schema);

        assert!(matches!(
            oracle.predict_fraud_probability(&features),
            Err(OracleError::InvalidProbability(_))
        ));
    }
}
