//! Throughput, latency and decision statistics for the pipeline.

use crate::error::OracleError;
use crate::feature_projector::{FeatureSchema, FeatureVector};
use crate::models::oracle::ModelOracle;
use crate::types::decision::{Decision, Evaluation};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for pipeline performance
pub struct PipelineMetrics {
    /// Transactions that reached a decision
    pub transactions_processed: AtomicU64,
    /// Transactions the oracle failed to score
    pub oracle_failures: AtomicU64,
    /// Messages dropped before evaluation
    pub malformed_messages: AtomicU64,
    decisions: RwLock<HashMap<Decision, u64>>,
    rejections: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Oracle call times (in microseconds)
    oracle_times: RwLock<Vec<u64>>,
    /// Total score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            transactions_processed: AtomicU64::new(0),
            oracle_failures: AtomicU64::new(0),
            malformed_messages: AtomicU64::new(0),
            decisions: RwLock::new(HashMap::new()),
            rejections: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            oracle_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed evaluation
    pub fn record_evaluation(&self, evaluation: &Evaluation, processing_time: Duration) {
        self.transactions_processed.fetch_add(1, Ordering::Relaxed);
        push_sample(&self.processing_times, processing_time);

        if let Ok(mut decisions) = self.decisions.write() {
            *decisions.entry(evaluation.decision()).or_insert(0) += 1;
        }

        match evaluation {
            Evaluation::Rejected { reason } => {
                if let Ok(mut rejections) = self.rejections.write() {
                    *rejections.entry(reason.clone()).or_insert(0) += 1;
                }
            }
            Evaluation::Assessed(assessment) => {
                let bucket = (assessment.total_score * 10.0).clamp(0.0, 9.0) as usize;
                if let Ok(mut buckets) = self.score_buckets.write() {
                    buckets[bucket] += 1;
                }
            }
        }
    }

    /// Record time spent in a successful oracle call
    pub fn record_oracle_time(&self, duration: Duration) {
        push_sample(&self.oracle_times, duration);
    }

    pub fn record_oracle_failure(&self) {
        self.oracle_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> LatencyStats {
        self.processing_times
            .read()
            .map(|times| LatencyStats::from_samples(&times))
            .unwrap_or_default()
    }

    /// Get oracle latency statistics
    pub fn get_oracle_stats(&self) -> LatencyStats {
        self.oracle_times
            .read()
            .map(|times| LatencyStats::from_samples(&times))
            .unwrap_or_default()
    }

    /// Get current throughput (transactions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.transactions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn decision_count(&self, decision: Decision) -> u64 {
        self.decisions
            .read()
            .map(|d| d.get(&decision).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn get_rejections(&self) -> HashMap<String, u64> {
        self.rejections.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let tx_count = self.transactions_processed.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();
        let oracle = self.get_oracle_stats();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD DECISION PIPELINE - METRICS SUMMARY         ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Transactions Decided: {:>8}  │  Throughput: {:>6.1} tx/s   ║",
            tx_count,
            self.get_throughput()
        );
        info!(
            "║ Oracle Failures:      {:>8}  │  Malformed:  {:>8}      ║",
            self.oracle_failures.load(Ordering::Relaxed),
            self.malformed_messages.load(Ordering::Relaxed)
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!(
            "║ Oracle Time (μs):     mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            oracle.mean_us, oracle.p50_us, oracle.p95_us, oracle.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Decisions:                                                   ║");
        for decision in [Decision::Approve, Decision::Review, Decision::Block] {
            let count = self.decision_count(decision);
            let pct = if tx_count > 0 {
                (count as f64 / tx_count as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>6} ({:>5.1}%)                                ║", decision.as_str(), count, pct);
        }
        let rejections = self.get_rejections();
        if !rejections.is_empty() {
            info!("║ Hard-Rule Rejections:                                        ║");
            for (reason, count) in &rejections {
                info!("║   {:>6}  {}", count, reason);
            }
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Total Score Distribution:                                    ║");
        let score_dist = self.get_score_distribution();
        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_sample(samples: &RwLock<Vec<u64>>, duration: Duration) {
    if let Ok(mut times) = samples.write() {
        times.push(duration.as_micros() as u64);
        if times.len() > MAX_SAMPLES {
            times.drain(0..MAX_SAMPLES / 2);
        }
    }
}

/// Latency percentiles in microseconds
#[derive(Debug, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

impl LatencyStats {
    fn from_samples(samples: &[u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        Self {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: sorted[count - 1],
        }
    }
}

/// Oracle wrapper that records the latency of successful predictions
pub struct TimedOracle<O> {
    inner: O,
    metrics: Arc<PipelineMetrics>,
}

impl<O: ModelOracle> TimedOracle<O> {
    pub fn new(inner: O, metrics: Arc<PipelineMetrics>) -> Self {
        Self { inner, metrics }
    }
}

impl<O: ModelOracle> ModelOracle for TimedOracle<O> {
    fn feature_schema(&self) -> &FeatureSchema {
        self.inner.feature_schema()
    }

    fn predict_fraud_probability(&self, features: &FeatureVector) -> Result<f64, OracleError> {
        let start = Instant::now();
        let prob = self.inner.predict_fraud_probability(features)?;
        self.metrics.record_oracle_time(start.elapsed());
        Ok(prob)
    }
}

/// Periodic summary logger
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
