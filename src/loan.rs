//! Loan models for the credit ledger
use std::fmt;
use std::str::FromStr;

use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use crate::error::CreditError;
use crate::models::{validate_interest_rate, validate_positive_amount};

const CONTRACT_TOKEN_LEN: usize = 10;

/// Loan status enum
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    OnGoing,
    Late,
    Finish,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoanStatus::Finish)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::OnGoing => "on_going",
            LoanStatus::Late => "late",
            LoanStatus::Finish => "finish",
        }
    }
}

/// How a payment settles the loan
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Full,
    Installment,
}

impl FromStr for PaymentType {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(PaymentType::Full),
            "installment" => Ok(PaymentType::Installment),
            other => Err(CreditError::InvalidPaymentType(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Full => f.write_str("full"),
            PaymentType::Installment => f.write_str("installment"),
        }
    }
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Loan {
    pub id: i64,
    pub consumer_id: i64,
    pub merchant_id: i64,
    pub consumer_limit_id: i64,
    pub principal_amount: Decimal,
    pub principal_paid: Decimal,
    pub interest_rate: Decimal, // percent, fixed at origination
    pub interest_amount: Decimal,
    pub interest_paid: Decimal,
    pub status: LoanStatus,
    pub due_at: DateTime<Utc>,
    pub installment: i32,
    pub contract_number: String,
    pub asset_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Loan {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Principal not yet repaid
    pub fn outstanding_principal(&self) -> Decimal {
        self.principal_amount - self.principal_paid
    }
}

/// Insert payload produced by origination
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub consumer_id: i64,
    pub merchant_id: i64,
    pub consumer_limit_id: i64,
    pub principal_amount: Decimal,
    pub interest_rate: Decimal,
    pub interest_amount: Decimal,
    pub due_at: DateTime<Utc>,
    pub contract_number: String,
    pub asset_name: String,
}

/// State written back to a loan after a payment
///
/// `expected_installment` and `expected_principal_paid` are the values the
/// payment was priced against; the write only applies while the stored loan
/// still matches them.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanUpdate {
    pub id: i64,
    pub principal_paid: Decimal,
    pub interest_paid: Decimal,
    pub status: LoanStatus,
    pub installment: i32,
    pub expected_installment: i32,
    pub expected_principal_paid: Decimal,
}

/// Request to originate a new loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    #[validate(range(min = 1))]
    pub consumer_id: i64,
    #[validate(range(min = 1))]
    pub merchant_id: i64,
    pub tenure: i16,
    #[validate(custom = "validate_positive_amount")]
    pub loan_amount: Decimal,
    #[validate(custom = "validate_interest_rate")]
    pub interest_rate: Decimal,
    #[validate(length(min = 1, max = 255))]
    pub asset_name: String,
}

/// Human-facing loan reference: `{consumer}-{token}-{merchant}`
pub fn generate_contract_number(consumer_id: i64, merchant_id: i64) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONTRACT_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}-{}", consumer_id, token, merchant_id)
}
