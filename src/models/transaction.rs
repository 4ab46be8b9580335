//! Ledger entries written by the payment processor

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

/// Immutable record of one payment event
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub consumer_id: i64,
    pub loan_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a ledger entry
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub consumer_id: i64,
    pub loan_id: i64,
    pub amount: Decimal,
    pub description: String,
}

impl NewTransaction {
    pub fn payment(consumer_id: i64, loan_id: i64, amount: Decimal, contract_number: &str) -> Self {
        Self {
            consumer_id,
            loan_id,
            amount,
            description: format!("Payment for loan {}", contract_number),
        }
    }
}

/// Payment request, used both for quoting and for paying
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransactionRequest {
    #[validate(range(min = 1))]
    pub consumer_id: i64,
    #[validate(range(min = 1))]
    pub loan_id: i64,
    #[validate(length(min = 1))]
    pub transaction_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payment_description_references_contract() {
        let tx = NewTransaction::payment(1, 2, dec!(110), "1-AbCdEfGhIj-9");
        assert_eq!(tx.description, "Payment for loan 1-AbCdEfGhIj-9");
        assert_eq!(tx.amount, dec!(110));
    }

    #[test]
    fn test_transaction_request_validation() {
        let request = TransactionRequest {
            consumer_id: 0,
            loan_id: 1,
            transaction_type: "full".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
