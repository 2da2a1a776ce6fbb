//! NATS subscription and decoding of incoming transactions

use crate::types::transaction::Transaction;
use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::info;

/// Consumer for receiving transactions from NATS
pub struct TransactionConsumer {
    client: Client,
    subject: String,
}

impl TransactionConsumer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the transaction subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self
            .client
            .subscribe(self.subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", self.subject))?;
        info!(subject = %self.subject, "Subscribed to transaction subject");
        Ok(subscriber)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Decode a message payload into a transaction.
    ///
    /// Rejects payloads that are not valid JSON transactions or that carry
    /// non-finite monetary values.
    pub fn decode(payload: &[u8]) -> Result<Transaction> {
        let tx: Transaction =
            serde_json::from_slice(payload).context("Failed to deserialize transaction")?;

        if !tx.is_well_formed() {
            anyhow::bail!(
                "Transaction {} carries non-finite monetary values",
                tx.transaction_id
            );
        }

        Ok(tx)
    }
}
