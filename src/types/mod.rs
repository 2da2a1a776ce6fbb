//! Type definitions for the fraud decision pipeline

pub mod decision;
pub mod transaction;

pub use decision::{Decision, DecisionThresholds, Evaluation, FraudDecision, RiskAssessment};
pub use transaction::{Transaction, TransactionType};
