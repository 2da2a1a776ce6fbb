//! ONNX-backed model oracle

use crate::config::ModelConfig;
use crate::error::{ensure_probability, OracleError};
use crate::feature_projector::{FeatureSchema, FeatureVector};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::models::oracle::ModelOracle;
use anyhow::Result;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// Fraud classifier served from an ONNX session.
///
/// The session needs exclusive access while running, so concurrent
/// evaluations serialize on the inner lock.
pub struct OnnxOracle {
    model: Mutex<LoadedModel>,
    schema: FeatureSchema,
}

impl OnnxOracle {
    /// Load model and schema from configuration
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let (model, schema) = loader.load_classifier(&config.model_path, &config.schema_path)?;

        info!(
            model = %model.name,
            features = schema.len(),
            "ONNX oracle initialized"
        );

        Ok(Self::from_parts(model, schema))
    }

    pub fn from_parts(model: LoadedModel, schema: FeatureSchema) -> Self {
        Self {
            model: Mutex::new(model),
            schema,
        }
    }

    /// Name of the underlying model
    pub fn model_name(&self) -> String {
        self.model
            .lock()
            .map(|m| m.name.clone())
            .unwrap_or_else(|_| "unavailable".to_string())
    }

    fn run(&self, features: &[f32]) -> Result<f64, OracleError> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| OracleError::Unavailable(format!("Lock error: {}", e)))?;

        // Shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))?;

        let input_name = model.input_name.clone();
        let output_name = model.output_name.clone();
        let model_name = model.name.clone();

        let outputs = model
            .session
            .run(ort::inputs![input_name.as_str() => input_tensor])?;

        let output = outputs.get(output_name.as_str()).ok_or_else(|| {
            OracleError::Inference(format!("Model output '{}' missing", output_name))
        })?;

        let (shape, data) = output.try_extract_tensor::<f32>()?;
        let prob = fraud_probability(&shape.iter().copied().collect::<Vec<i64>>(), data)?;

        debug!(model = %model_name, prob = prob, "Extracted fraud probability");
        Ok(prob)
    }
}

impl ModelOracle for OnnxOracle {
    fn feature_schema(&self) -> &FeatureSchema {
        &self.schema
    }

    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        if !features.matches(&self.schema) {
            return Err(OracleError::SchemaMismatch {
                expected: self.schema.len(),
                actual: features.len(),
            });
        }

        let prob = self.run(&features.to_f32())?;
        ensure_probability(prob)
    }
}

/// Pick the positive-class probability out of a classifier output tensor.
///
/// Accepts `[batch, 2]` / `[2]` class probabilities or `[batch, 1]` / `[1]`
/// single probabilities.
fn fraud_probability(dims: &[i64], data: &[f32]) -> Result<f64, OracleError> {
    let num_classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => {
            return Err(OracleError::Inference(format!(
                "Unexpected output shape {:?}",
                dims
            )))
        }
    };

    let index = match num_classes {
        1 => 0,
        2 => 1,
        n => {
            return Err(OracleError::Inference(format!(
                "Expected 1 or 2 output classes, got {}",
                n
            )))
        }
    };

    data.get(index)
        .map(|&p| p as f64)
        .ok_or_else(|| OracleError::Inference("Empty output tensor".to_string()))
}
