//! Balance-conservation checks that reject a transaction outright.

use crate::types::transaction::Transaction;

pub const INVALID_AMOUNT: &str = "Invalid transaction amount";
pub const EXCEEDS_SENDER_BALANCE: &str = "Amount exceeds available sender balance";
pub const SENDER_DEBIT_MISMATCH: &str = "Sender balance change does not match amount";
pub const CREDIT_WITHOUT_DEBIT: &str = "Receiver credited without sender debit";
pub const RECEIVER_OVER_CREDITED: &str = "Receiver credited more than transferred amount";
pub const NEGATIVE_BALANCE: &str = "Negative balance detected";

/// Default tolerance on the sender debit check
pub const DEFAULT_BALANCE_TOLERANCE: f64 = 1e-2;

/// Outcome of hard-rule validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Stateless validator; rules run in a fixed order and the first failure wins.
#[derive(Debug, Clone, Copy)]
pub struct HardRuleValidator {
    balance_tolerance: f64,
}

impl HardRuleValidator {
    pub fn new(balance_tolerance: f64) -> Self {
        Self { balance_tolerance }
    }

    pub fn balance_tolerance(&self) -> f64 {
        self.balance_tolerance
    }

    pub fn validate(&self, tx: &Transaction) -> Verdict {
        match self.first_violation(tx) {
            Some(reason) => Verdict::Invalid(reason.to_string()),
            None => Verdict::Valid,
        }
    }

    fn first_violation(&self, tx: &Transaction) -> Option<&'static str> {
        let sender_debit = tx.sender_balance_before - tx.sender_balance_after;
        let receiver_credit = tx.receiver_balance_after - tx.receiver_balance_before;

        if tx.amount <= 0.0 {
            return Some(INVALID_AMOUNT);
        }

        if tx.amount > tx.sender_balance_before {
            return Some(EXCEEDS_SENDER_BALANCE);
        }

        // Strict comparison: a mismatch of exactly the tolerance passes.
        if (sender_debit - tx.amount).abs() > self.balance_tolerance {
            return Some(SENDER_DEBIT_MISMATCH);
        }

        if receiver_credit > 0.0 && tx.sender_balance_before == tx.sender_balance_after {
            return Some(CREDIT_WITHOUT_DEBIT);
        }

        if receiver_credit > tx.amount {
            return Some(RECEIVER_OVER_CREDITED);
        }

        if tx.sender_balance_after < 0.0 || tx.receiver_balance_after < 0.0 {
            return Some(NEGATIVE_BALANCE);
        }

        None
    }
}

impl Default for HardRuleValidator {
    fn default() -> Self {
        Self::new(DEFAULT_BALANCE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::TransactionType;
    use proptest::prelude::*;

    fn tx(amount: f64, sender: (f64, f64), receiver: (f64, f64)) -> Transaction {
        Transaction::new(1, amount, sender.0, receiver.0, TransactionType::Transfer)
            .with_sender_balances(sender.0, sender.1)
            .with_receiver_balances(receiver.0, receiver.1)
    }

    fn reason(verdict: Verdict) -> String {
        match verdict {
            Verdict::Invalid(reason) => reason,
            Verdict::Valid => panic!("expected an invalid verdict"),
        }
    }

    #[test]
    fn test_consistent_transaction_is_valid() {
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(100.0, (1000.0, 900.0), (50.0, 150.0)));
        assert_eq!(verdict, Verdict::Valid);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(0.0, (1000.0, 1000.0), (0.0, 0.0)));
        assert_eq!(reason(verdict), INVALID_AMOUNT);
    }

    #[test]
    fn test_amount_above_sender_balance() {
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(500.0, (100.0, 0.0), (0.0, 500.0)));
        assert_eq!(reason(verdict), EXCEEDS_SENDER_BALANCE);
    }

    #[test]
    fn test_first_violation_wins() {
        // Breaks both the balance check and the debit-match check.
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(500.0, (100.0, 100.0), (0.0, 0.0)));
        assert_eq!(reason(verdict), EXCEEDS_SENDER_BALANCE);
    }

    #[test]
    fn test_tolerance_boundary() {
        let validator = HardRuleValidator::default();

        let inside = validator.validate(&tx(100.0, (1000.0, 900.0099), (0.0, 0.0)));
        assert_eq!(inside, Verdict::Valid);

        let outside = validator.validate(&tx(100.0, (1000.0, 900.011), (0.0, 0.0)));
        assert_eq!(reason(outside), SENDER_DEBIT_MISMATCH);
    }

    #[test]
    fn test_mismatch_equal_to_tolerance_passes() {
        // 1000 - 899.5 - 100 is exactly 0.5 in binary floating point.
        let validator = HardRuleValidator::new(0.5);
        assert_eq!(
            validator.validate(&tx(100.0, (1000.0, 899.5), (0.0, 0.0))),
            Verdict::Valid
        );
        assert_eq!(
            reason(validator.validate(&tx(100.0, (1000.0, 899.25), (0.0, 0.0)))),
            SENDER_DEBIT_MISMATCH
        );
    }

    #[test]
    fn test_credit_without_debit() {
        // Only reachable when the amount itself is within tolerance.
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(0.005, (10.0, 10.0), (0.0, 0.005)));
        assert_eq!(reason(verdict), CREDIT_WITHOUT_DEBIT);
    }

    #[test]
    fn test_receiver_over_credited() {
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(100.0, (1000.0, 900.0), (0.0, 150.0)));
        assert_eq!(reason(verdict), RECEIVER_OVER_CREDITED);
    }

    #[test]
    fn test_negative_balances() {
        let validator = HardRuleValidator::default();

        let sender = validator.validate(&tx(100.0, (100.0, -0.005), (0.0, 100.0)));
        assert_eq!(reason(sender), NEGATIVE_BALANCE);

        let receiver = validator.validate(&tx(100.0, (1000.0, 900.0), (10.0, -1.0)));
        assert_eq!(reason(receiver), NEGATIVE_BALANCE);
    }

    #[test]
    fn test_receiver_untouched_is_valid() {
        // PaySim merchants often show no receiver movement.
        let validator = HardRuleValidator::default();
        let verdict = validator.validate(&tx(9839.64, (170136.0, 160296.36), (0.0, 0.0)));
        assert_eq!(verdict, Verdict::Valid);
    }

    proptest! {
        #[test]
        fn non_positive_amount_always_invalid(
            amount in -1.0e9f64..=0.0,
            sbb in 0.0f64..1.0e9,
            sba in -1.0e9f64..1.0e9,
            rbb in 0.0f64..1.0e9,
            rba in -1.0e9f64..1.0e9,
        ) {
            let verdict = HardRuleValidator::default().validate(&tx(amount, (sbb, sba), (rbb, rba)));
            prop_assert_eq!(verdict, Verdict::Invalid(INVALID_AMOUNT.to_string()));
        }

        #[test]
        fn overdraw_always_reports_balance(
            sbb in 0.0f64..1.0e6,
            excess in 0.01f64..1.0e6,
            sba in -1.0e6f64..1.0e6,
            rba in -1.0e6f64..1.0e6,
        ) {
            let verdict = HardRuleValidator::default().validate(&tx(sbb + excess, (sbb, sba), (0.0, rba)));
            prop_assert_eq!(verdict, Verdict::Invalid(EXCEEDS_SENDER_BALANCE.to_string()));
        }
    }
}
