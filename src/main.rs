//! Fraud Decision Pipeline - Main Entry Point
//!
//! Consumes transactions from NATS, screens them through the hard rules,
//! the ONNX classifier and the heuristic scorer, and publishes a decision
//! for each one. Evaluations run in parallel up to the configured worker count.

use anyhow::Result;
use fraud_decision_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::TransactionConsumer,
    engine::FraudEngine,
    metrics::{MetricsReporter, PipelineMetrics, TimedOracle},
    models::{ModelOracle, OnnxOracle},
    producer::DecisionProducer,
    FraudDecision,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fraud_decision_pipeline={}", logging.level)));

    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    info!("Starting Fraud Decision Pipeline");
    info!(
        "Decision thresholds: review>={:.2}, block>={:.2}; balance tolerance {}",
        config.decision.review, config.decision.block, config.rules.balance_tolerance
    );

    let metrics = Arc::new(PipelineMetrics::new());

    let oracle = OnnxOracle::new(&config.model)?;
    info!(
        model = %oracle.model_name(),
        features = ?oracle.feature_schema().feature_names(),
        "Model oracle ready"
    );
    let engine = Arc::new(FraudEngine::from_config(
        &config,
        TimedOracle::new(oracle, metrics.clone()),
    ));

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = TransactionConsumer::new(client.clone(), &config.nats.transaction_subject);
    let producer = Arc::new(DecisionProducer::new(client.clone(), &config.nats.decision_subject));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting transaction processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", consumer.subject());
    info!("Publishing decisions to: {}", producer.subject());

    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.report_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Worker pool closed");
                break;
            }
        };

        let transaction = match TransactionConsumer::decode(&message.payload) {
            Ok(tx) => tx,
            Err(e) => {
                warn!(error = %e, "Dropping malformed transaction");
                metrics.record_malformed();
                continue;
            }
        };

        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let tx_id = transaction.transaction_id.clone();

            // Model inference blocks; keep it off the async workers.
            let evaluated = tokio::task::spawn_blocking(move || engine.evaluate(&transaction)).await;

            let evaluation = match evaluated {
                Ok(Ok(evaluation)) => evaluation,
                Ok(Err(e)) => {
                    metrics.record_oracle_failure();
                    error!(transaction_id = %tx_id, error = %e, "Model oracle failed, no decision");
                    drop(permit);
                    return;
                }
                Err(e) => {
                    error!(transaction_id = %tx_id, error = %e, "Evaluation task panicked");
                    drop(permit);
                    return;
                }
            };

            let processing_time = start_time.elapsed();
            metrics.record_evaluation(&evaluation, processing_time);

            let decision = FraudDecision::new(tx_id.clone(), evaluation);
            match producer.publish(&decision).await {
                Ok(()) => debug!(
                    transaction_id = %tx_id,
                    decision = decision.decision.as_str(),
                    processing_time_us = processing_time.as_micros(),
                    "Decision published"
                ),
                Err(e) => error!(
                    transaction_id = %tx_id,
                    error = %e,
                    "Failed to publish fraud decision"
                ),
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let processing_stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} tx/s", metrics.get_throughput()),
                    avg_latency_us = processing_stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!("Pipeline shutting down...");
    metrics.print_summary();

    Ok(())
}
