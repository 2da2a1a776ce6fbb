//! Transaction data structures for balance-transfer fraud screening

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of money movement, as labelled in PaySim-style ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    CashOut,
    Transfer,
    Payment,
    Debit,
}

impl TransactionType {
    /// Every category the feature encoder knows about.
    pub const ALL: [TransactionType; 4] = [
        TransactionType::CashOut,
        TransactionType::Transfer,
        TransactionType::Payment,
        TransactionType::Debit,
    ];

    /// Ledger label (`CASH_OUT`, `TRANSFER`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Debit => "DEBIT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_uppercase();
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| anyhow::anyhow!("Unknown transaction type: {}", s))
    }
}

/// A single transaction to be screened.
///
/// Plain data holder: balance consistency is a runtime verdict of the
/// hard-rule validator, not something enforced at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier
    #[serde(default = "new_transaction_id")]
    pub transaction_id: String,

    /// Discrete time tick
    pub step: u64,

    /// Declared transaction value
    pub amount: f64,

    /// Sender balance before the transaction
    #[serde(alias = "oldbalanceOrg")]
    pub sender_balance_before: f64,

    /// Sender balance after the transaction
    #[serde(alias = "newbalanceOrig")]
    pub sender_balance_after: f64,

    /// Receiver balance before the transaction
    #[serde(alias = "oldbalanceDest")]
    pub receiver_balance_before: f64,

    /// Receiver balance after the transaction
    #[serde(alias = "newbalanceDest")]
    pub receiver_balance_after: f64,

    /// Transaction category
    #[serde(alias = "type")]
    pub transaction_type: TransactionType,
}

fn new_transaction_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Transaction {
    /// Create a transaction whose balances move consistently with `amount`.
    pub fn new(
        step: u64,
        amount: f64,
        sender_balance_before: f64,
        receiver_balance_before: f64,
        transaction_type: TransactionType,
    ) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            step,
            amount,
            sender_balance_before,
            sender_balance_after: sender_balance_before - amount,
            receiver_balance_before,
            receiver_balance_after: receiver_balance_before + amount,
            transaction_type,
        }
    }

    /// Override the sender balances.
    pub fn with_sender_balances(mut self, before: f64, after: f64) -> Self {
        self.sender_balance_before = before;
        self.sender_balance_after = after;
        self
    }

    /// Override the receiver balances.
    pub fn with_receiver_balances(mut self, before: f64, after: f64) -> Self {
        self.receiver_balance_before = before;
        self.receiver_balance_after = after;
        self
    }

    /// Override the identifier.
    pub fn with_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }

    /// True when every monetary field is a finite number.
    ///
    /// NaN compares false against every rule threshold, so callers drop
    /// such records before they reach the engine.
    pub fn is_well_formed(&self) -> bool {
        [
            self.amount,
            self.sender_balance_before,
            self.sender_balance_after,
            self.receiver_balance_before,
            self.receiver_balance_after,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
