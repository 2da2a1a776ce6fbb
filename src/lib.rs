//! Fraud Decision Pipeline Library
//!
//! Screens balance-transfer transactions with deterministic conservation
//! rules, a pre-trained classifier and an additive heuristic score, and maps
//! the combined risk onto approve / review / block.

pub mod config;
pub mod consumer;
pub mod engine;
pub mod error;
pub mod feature_projector;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod rules;
pub mod types;

pub use config::AppConfig;
pub use consumer::TransactionConsumer;
pub use engine::FraudEngine;
pub use error::OracleError;
pub use feature_projector::{FeatureProjector, FeatureSchema, FeatureVector};
pub use models::{ModelOracle, OnnxOracle, RiskCombiner, StaticOracle};
pub use producer::DecisionProducer;
pub use rules::{HardRuleValidator, HeuristicScorer, Verdict};
pub use types::{Decision, DecisionThresholds, Evaluation, FraudDecision, RiskAssessment, Transaction, TransactionType};
