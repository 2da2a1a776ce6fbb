//! NATS message producer for fraud decisions

use crate::types::decision::FraudDecision;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing decisions to NATS
#[derive(Clone)]
pub struct DecisionProducer {
    client: Client,
    subject: String,
}

impl DecisionProducer {
    /// Create a new decision producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a decision
    pub async fn publish(&self, decision: &FraudDecision) -> Result<()> {
        let payload = serde_json::to_vec(decision)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            decision_id = %decision.decision_id,
            transaction_id = %decision.transaction_id,
            decision = decision.decision.as_str(),
            "Published fraud decision"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
