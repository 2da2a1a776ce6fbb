//! Deterministic rule sets applied alongside the model

pub mod hard;
pub mod heuristic;

pub use hard::{HardRuleValidator, Verdict};
pub use heuristic::{HeuristicRules, HeuristicScore, HeuristicScorer};
