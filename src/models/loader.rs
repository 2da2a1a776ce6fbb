//! ONNX model and feature schema loader

use crate::feature_projector::FeatureSchema;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let (input_name, output_name) = classifier_io(&input_names, &output_names)
            .with_context(|| format!("Unsupported model signature in {:?}", path))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            output_name,
        })
    }

    /// Load a classifier and the feature schema it was trained on.
    pub fn load_classifier<P: AsRef<Path>, S: AsRef<Path>>(
        &self,
        model_path: P,
        schema_path: S,
    ) -> Result<(LoadedModel, FeatureSchema)> {
        let model = self.load_model(model_path)?;
        let schema = Self::load_schema(schema_path)?;
        Ok((model, schema))
    }

    /// Load the feature schema written alongside the model at training time.
    pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<FeatureSchema> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature schema {:?}", path))?;
        let schema: FeatureSchema = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse feature schema {:?}", path))?;

        if schema.is_empty() {
            anyhow::bail!("Feature schema {} declares no features", path.display());
        }

        info!(
            path = %path.display(),
            features = schema.len(),
            "Feature schema loaded"
        );

        Ok(schema)
    }
}

/// Resolve the single feature-matrix input and the probability output.
///
/// Classifier exports carry one `[batch, n]` float input and either a lone
/// probability output or a `(label, probabilities)` pair; label outputs
/// are never scored.
fn classifier_io(inputs: &[String], outputs: &[String]) -> Result<(String, String)> {
    let input = match inputs {
        [input] => input.clone(),
        _ => anyhow::bail!(
            "Expected exactly one feature input, found {}: {:?}",
            inputs.len(),
            inputs
        ),
    };

    let output = outputs
        .iter()
        .find(|o| o.contains("prob"))
        .or_else(|| match outputs {
            [only] => Some(only),
            _ => None,
        })
        .cloned()
        .ok_or_else(|| {
            anyhow::anyhow!("No probability output among {:?}", outputs)
        })?;

    if output.contains("label") {
        anyhow::bail!("Output {} carries class labels, not probabilities", output);
    }

    Ok((input, output))
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self { onnx_threads: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_classifier_io_picks_probability_output() {
        let (input, output) =
            classifier_io(&names(&["float_input"]), &names(&["output_label", "output_probability"]))
                .unwrap();

        assert_eq!(input, "float_input");
        assert_eq!(output, "output_probability");
    }

    #[test]
    fn test_classifier_io_single_output() {
        let (_, output) = classifier_io(&names(&["X"]), &names(&["variable"])).unwrap();
        assert_eq!(output, "variable");
    }

    #[test]
    fn test_classifier_io_rejects_other_signatures() {
        // Label-only export
        assert!(classifier_io(&names(&["X"]), &names(&["label"])).is_err());
        // Two unnamed outputs: ambiguous
        assert!(classifier_io(&names(&["X"]), &names(&["out0", "out1"])).is_err());
        // Per-column inputs instead of one feature matrix
        assert!(classifier_io(&names(&["step", "amount"]), &names(&["probabilities"])).is_err());
        assert!(classifier_io(&[], &names(&["probabilities"])).is_err());
    }

    #[test]
    fn test_load_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"feature_names": ["step", "amount", "type_TRANSFER"]}}"#).unwrap();

        let schema = ModelLoader::load_schema(file.path()).unwrap();
        assert_eq!(schema.feature_names(), &["step", "amount", "type_TRANSFER"]);
    }

    #[test]
    fn test_empty_schema_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"feature_names": []}}"#).unwrap();

        assert!(ModelLoader::load_schema(file.path()).is_err());
    }

    #[test]
    fn test_missing_schema_file() {
        assert!(ModelLoader::load_schema("does/not/exist.json").is_err());
    }
}
