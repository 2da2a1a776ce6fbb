//! Configuration management for the fraud decision pipeline

use crate::rules::hard::DEFAULT_BALANCE_TOLERANCE;
use crate::rules::heuristic::HeuristicRules;
use crate::types::decision::DecisionThresholds;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub decision: DecisionThresholds,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming transactions
    pub transaction_subject: String,
    /// Subject for outgoing decisions
    pub decision_subject: String,
}

/// Model oracle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// ONNX classifier file
    pub model_path: String,
    /// JSON file listing the feature names the classifier was trained on
    pub schema_path: String,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Hard-rule and heuristic configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Allowed mismatch between the sender debit and the amount
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: f64,
    #[serde(default)]
    pub heuristics: HeuristicRules,
}

fn default_balance_tolerance() -> f64 {
    DEFAULT_BALANCE_TOLERANCE
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
            heuristics: HeuristicRules::default(),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrent evaluations
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `FRAUD_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("FRAUD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// `FRAUD__<SECTION>__<KEY>` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("FRAUD").prefix_separator("__").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        let DecisionThresholds { review, block } = self.decision;

        if !(0.0..=1.0).contains(&review) || !(0.0..=1.0).contains(&block) {
            anyhow::bail!(
                "Decision thresholds must lie in [0, 1] (review={}, block={})",
                review,
                block
            );
        }
        if review > block {
            anyhow::bail!(
                "Review threshold {} is above block threshold {}",
                review,
                block
            );
        }
        if !(self.rules.balance_tolerance >= 0.0) {
            anyhow::bail!(
                "Balance tolerance must be non-negative, got {}",
                self.rules.balance_tolerance
            );
        }
        self.rules.heuristics.validate()?;
        if self.pipeline.workers == 0 {
            anyhow::bail!("Pipeline needs at least one worker");
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                transaction_subject: "transactions".to_string(),
                decision_subject: "fraud.decisions".to_string(),
            },
            model: ModelConfig {
                model_path: "models/rf_model.onnx".to_string(),
                schema_path: "models/feature_schema.json".to_string(),
                onnx_threads: 1,
            },
            rules: RulesConfig::default(),
            decision: DecisionThresholds::default(),
            pipeline: PipelineConfig {
                workers: 4,
                report_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}
