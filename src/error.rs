//! Error types surfaced by the model oracle

use thiserror::Error;

/// Failure to obtain a fraud probability.
///
/// Kept distinct from hard-rule rejections: an oracle failure means the
/// transaction has no score, never that it scored zero.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Feature schema mismatch: expected {expected} features, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Model returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

impl From<ort::Error> for OracleError {
    fn from(e: ort::Error) -> Self {
        OracleError::Inference(e.to_string())
    }
}

/// Check that a model output is a probability.
pub fn ensure_probability(p: f64) -> Result<f64, OracleError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(OracleError::InvalidProbability(p))
    }
}
