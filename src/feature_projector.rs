//! Feature projection for model inference.
//!
//! Builds the raw columns a transaction contributes (numeric fields, balance
//! deltas and drop-first one-hot type indicators), then reindexes them onto
//! the schema the model declares. The model's schema is authoritative:
//! columns it expects but we did not emit are zero-filled, columns we
//! emitted but it does not expect are discarded.

use crate::types::transaction::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prefix used for one-hot transaction type columns
pub const TYPE_COLUMN_PREFIX: &str = "type_";

/// Ordered list of feature names a model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    feature_names: Vec<String>,
}

impl FeatureSchema {
    pub fn new<I, S>(feature_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_names: feature_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }
}

/// Feature values aligned to a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values narrowed to f32 for tensor input
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when names match the schema exactly, in order.
    pub fn matches(&self, schema: &FeatureSchema) -> bool {
        self.names == schema.feature_names
    }
}

/// Projects transactions onto a model's feature schema.
pub struct FeatureProjector {
    categories: Vec<TransactionType>,
}

impl FeatureProjector {
    /// Create a projector over every known transaction type.
    pub fn new() -> Self {
        Self::with_categories(TransactionType::ALL)
    }

    /// Create a projector over an explicit category set, sorted by label.
    pub fn with_categories<I: IntoIterator<Item = TransactionType>>(categories: I) -> Self {
        let mut categories: Vec<TransactionType> = categories.into_iter().collect();
        categories.sort_by_key(|c| c.as_str());
        categories.dedup();
        Self { categories }
    }

    /// The category left implicit as all-zero indicators.
    ///
    /// The model decides which level it dropped at training time: this is
    /// the first category (by label) with no indicator column in `schema`.
    /// `None` when the schema declares an indicator for every category.
    pub fn reference_category(&self, schema: &FeatureSchema) -> Option<TransactionType> {
        self.categories
            .iter()
            .copied()
            .find(|c| !schema.feature_names().contains(&indicator_name(*c)))
    }

    /// Indicator column names emitted for the type field.
    pub fn indicator_columns(&self, schema: &FeatureSchema) -> Vec<String> {
        let reference = self.reference_category(schema);
        self.categories
            .iter()
            .filter(|c| Some(**c) != reference)
            .map(|c| indicator_name(*c))
            .collect()
    }

    /// Raw encoded columns in emission order, before reindexing.
    ///
    /// One-hot type indicators drop the reference category `schema` implies.
    pub fn encode(&self, tx: &Transaction, schema: &FeatureSchema) -> Vec<(String, f64)> {
        let balance_diff_orig = tx.sender_balance_before - tx.sender_balance_after;
        let balance_diff_dest = tx.receiver_balance_before - tx.receiver_balance_after;

        let mut columns = vec![
            ("step".to_string(), tx.step as f64),
            ("amount".to_string(), tx.amount),
            ("oldbalanceOrg".to_string(), tx.sender_balance_before),
            ("newbalanceOrig".to_string(), tx.sender_balance_after),
            ("oldbalanceDest".to_string(), tx.receiver_balance_before),
            ("newbalanceDest".to_string(), tx.receiver_balance_after),
            ("balance_diff_orig".to_string(), balance_diff_orig),
            ("balance_diff_dest".to_string(), balance_diff_dest),
        ];

        let hot_column = indicator_name(tx.transaction_type);
        for column in self.indicator_columns(schema) {
            let hot = if column == hot_column { 1.0 } else { 0.0 };
            columns.push((column, hot));
        }

        columns
    }

    /// Encode and reindex onto `schema`.
    pub fn project(&self, tx: &Transaction, schema: &FeatureSchema) -> FeatureVector {
        let encoded: HashMap<String, f64> = self.encode(tx, schema).into_iter().collect();

        let values = schema
            .feature_names()
            .iter()
            .map(|name| encoded.get(name).copied().unwrap_or(0.0))
            .collect();

        FeatureVector {
            names: schema.feature_names().to_vec(),
            values,
        }
    }
}

fn indicator_name(category: TransactionType) -> String {
    format!("{}{}", TYPE_COLUMN_PREFIX, category.as_str())
}

impl Default for FeatureProjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn paysim_schema() -> FeatureSchema {
        FeatureSchema::new([
            "step",
            "amount",
            "oldbalanceOrg",
            "newbalanceOrig",
            "oldbalanceDest",
            "newbalanceDest",
            "balance_diff_orig",
            "balance_diff_dest",
            "type_CASH_OUT",
            "type_DEBIT",
            "type_PAYMENT",
            "type_TRANSFER",
        ])
    }

    fn sample(transaction_type: TransactionType) -> Transaction {
        Transaction::new(3, 250.0, 1000.0, 40.0, transaction_type)
    }

    fn cash_in_reference_schema() -> FeatureSchema {
        // Trained on all five ledger types with CASH_IN as the dropped level.
        paysim_schema()
    }

    fn cash_out_reference_schema() -> FeatureSchema {
        FeatureSchema::new(["amount", "type_DEBIT", "type_PAYMENT", "type_TRANSFER"])
    }

    #[test]
    fn test_reference_category_follows_schema() {
        let projector = FeatureProjector::new();

        assert_eq!(projector.reference_category(&cash_in_reference_schema()), None);
        assert_eq!(
            projector.reference_category(&cash_out_reference_schema()),
            Some(TransactionType::CashOut)
        );
        assert_eq!(
            projector.indicator_columns(&cash_out_reference_schema()),
            vec!["type_DEBIT", "type_PAYMENT", "type_TRANSFER"]
        );

        let schema = FeatureSchema::new(["type_CASH_OUT", "type_PAYMENT", "type_TRANSFER"]);
        assert_eq!(projector.reference_category(&schema), Some(TransactionType::Debit));
    }

    #[test]
    fn test_drop_first_encoding() {
        let projector = FeatureProjector::new();
        let encoded = projector.encode(&sample(TransactionType::Payment), &cash_out_reference_schema());

        assert_eq!(encoded.len(), 11);
        assert!(encoded.contains(&("type_PAYMENT".to_string(), 1.0)));
        assert!(encoded.contains(&("type_DEBIT".to_string(), 0.0)));
        assert!(!encoded.iter().any(|(name, _)| name == "type_CASH_OUT"));
    }

    #[test]
    fn test_reference_category_is_all_zero() {
        let projector = FeatureProjector::new();
        let encoded = projector.encode(&sample(TransactionType::CashOut), &cash_out_reference_schema());

        let indicators: Vec<f64> = encoded
            .iter()
            .filter(|(name, _)| name.starts_with(TYPE_COLUMN_PREFIX))
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(indicators, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cash_out_is_hot_when_schema_declares_it() {
        let projector = FeatureProjector::new();
        let features = projector.project(&sample(TransactionType::CashOut), &cash_in_reference_schema());

        assert_eq!(features.get("type_CASH_OUT"), Some(1.0));
        assert_eq!(features.get("type_DEBIT"), Some(0.0));
        assert_eq!(features.get("type_PAYMENT"), Some(0.0));
        assert_eq!(features.get("type_TRANSFER"), Some(0.0));
    }

    #[test]
    fn test_balance_diffs() {
        let projector = FeatureProjector::new();
        let features = projector.project(&sample(TransactionType::Transfer), &paysim_schema());

        assert_eq!(features.get("balance_diff_orig"), Some(250.0));
        assert_eq!(features.get("balance_diff_dest"), Some(-250.0));
        assert_eq!(features.get("step"), Some(3.0));
        assert_eq!(features.get("type_TRANSFER"), Some(1.0));
    }

    #[test]
    fn test_reindex_fills_missing_and_drops_extra() {
        let projector = FeatureProjector::new();
        let schema = FeatureSchema::new(["type_TRANSFER", "amount", "velocity_1h"]);

        let features = projector.project(&sample(TransactionType::Transfer), &schema);

        assert_eq!(features.names(), schema.feature_names());
        assert_eq!(features.values(), &[1.0, 250.0, 0.0]);
        assert!(features.matches(&schema));
    }

    #[test]
    fn test_exactly_one_indicator_hot_per_type() {
        let projector = FeatureProjector::new();

        for transaction_type in TransactionType::ALL {
            let features = projector.project(&sample(transaction_type), &paysim_schema());
            let hot: Vec<&String> = features
                .names()
                .iter()
                .zip(features.values())
                .filter(|(name, v)| name.starts_with(TYPE_COLUMN_PREFIX) && **v == 1.0)
                .map(|(name, _)| name)
                .collect();

            assert_eq!(hot, vec![&format!("type_{}", transaction_type)]);
            assert_eq!(features.len(), 12);
        }
    }

    #[test]
    fn test_to_f32_preserves_order() {
        let projector = FeatureProjector::new();
        let schema = FeatureSchema::new(["amount", "step"]);
        let features = projector.project(&sample(TransactionType::Debit), &schema);

        assert_eq!(features.to_f32(), vec![250.0_f32, 3.0_f32]);
    }

    proptest! {
        #[test]
        fn projected_keys_equal_schema(
            type_index in 0usize..4,
            step in 0u64..1000,
            amount in 0.0f64..1.0e7,
            sbb in 0.0f64..1.0e7,
            rbb in 0.0f64..1.0e7,
            extra in proptest::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let projector = FeatureProjector::new();
            let tx = Transaction::new(step, amount, sbb, rbb, TransactionType::ALL[type_index]);

            let mut names: Vec<String> = paysim_schema().feature_names().to_vec();
            names.extend(extra);
            names.reverse();
            let schema = FeatureSchema::new(names);

            let features = projector.project(&tx, &schema);
            prop_assert_eq!(features.names(), schema.feature_names());
            prop_assert_eq!(features.len(), schema.len());
        }
    }
}
