//! Test Transaction Producer
//!
//! Publishes synthetic PaySim-style transactions to NATS for pipeline
//! testing: ordinary balance-consistent traffic, large account drains, and
//! records whose balances do not add up.

use fraud_decision_pipeline::{Transaction, TransactionType};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Legitimate,
    Drain,
    Inconsistent,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: rand::rngs::ThreadRng,
    transaction_counter: u64,
    step: u64,
}

impl TransactionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            transaction_counter: 0,
            step: 1,
        }
    }

    fn next_id(&mut self) -> String {
        self.transaction_counter += 1;
        if self.transaction_counter % 50 == 0 {
            self.step += 1;
        }
        format!("tx_{:012}", self.transaction_counter)
    }

    fn random_type(&mut self) -> TransactionType {
        TransactionType::ALL[self.rng.gen_range(0..TransactionType::ALL.len())]
    }

    /// Small payment well inside the sender's balance
    fn generate_legitimate(&mut self) -> Transaction {
        let id = self.next_id();
        let balance = round2(self.rng.gen_range(1_000.0..200_000.0));
        let amount = round2(self.rng.gen_range(10.0..(balance * 0.3)));
        let receiver = round2(self.rng.gen_range(0.0..500_000.0));
        let transaction_type = self.random_type();

        Transaction::new(self.step, amount, balance, receiver, transaction_type)
            .with_sender_balances(balance, round2(balance - amount))
            .with_id(id)
    }

    /// Large transfer or cash-out that empties the sender account
    fn generate_drain(&mut self) -> Transaction {
        let id = self.next_id();
        let balance = round2(self.rng.gen_range(40_000.0..2_000_000.0));
        let transaction_type = if self.rng.gen_bool(0.5) {
            TransactionType::CashOut
        } else {
            TransactionType::Transfer
        };

        // PaySim fraud typically leaves the receiver side untouched.
        Transaction::new(self.step, balance, balance, 0.0, transaction_type)
            .with_receiver_balances(0.0, 0.0)
            .with_id(id)
    }

    /// Balances that violate conservation of money
    fn generate_inconsistent(&mut self) -> Transaction {
        let base = self.generate_legitimate();
        let amount = base.amount;

        match self.rng.gen_range(0..3) {
            // Sender never debited
            0 => {
                let before = base.sender_balance_before;
                base.with_sender_balances(before, before)
            }
            // Receiver gets more than was sent
            1 => {
                let before = base.receiver_balance_before;
                base.with_receiver_balances(before, round2(before + amount * 2.0))
            }
            // Overdraw
            _ => {
                let before = round2(amount / 2.0);
                base.with_sender_balances(before, round2(before - amount))
            }
        }
    }

    fn generate(&mut self, kind: Kind) -> Transaction {
        match kind {
            Kind::Legitimate => self.generate_legitimate(),
            Kind::Drain => self.generate_drain(),
            Kind::Inconsistent => self.generate_inconsistent(),
        }
    }

    fn pick_kind(&mut self, fraud_rate: f64) -> Kind {
        if self.rng.gen_bool(fraud_rate) {
            if self.rng.gen_bool(0.5) {
                Kind::Drain
            } else {
                Kind::Inconsistent
            }
        } else {
            Kind::Legitimate
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Transaction Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("transactions");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    let mut generator = TransactionGenerator::new();
    let mut counts = [0u64; 3];

    info!("Starting to publish {} transactions...", count);

    for i in 0..count {
        let kind = generator.pick_kind(fraud_rate);
        counts[kind as usize] += 1;
        let transaction = generator.generate(kind);

        let payload = serde_json::to_vec(&transaction)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} transactions ({} legitimate, {} drains, {} inconsistent)",
                i + 1,
                count,
                counts[0],
                counts[1],
                counts[2]
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} transactions ({} legitimate, {} drains, {} inconsistent)",
        count, counts[0], counts[1], counts[2]
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = TransactionGenerator::new();

    for i in 0..count {
        let kind = generator.pick_kind(fraud_rate);
        let transaction = generator.generate(kind);
        let json = serde_json::to_string_pretty(&transaction)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample {:?} transaction {}:\n{}", kind, i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
