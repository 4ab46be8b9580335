//! Consumer credit lines, one per (consumer, tenure)

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use super::validate_non_negative_amount;
use crate::error::CreditError;

/// Repayment term in months, restricted to the offered set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i16", into = "i16")]
#[sqlx(transparent)]
pub struct Tenure(i16);

impl Tenure {
    pub const VALID_MONTHS: [i16; 4] = [1, 2, 3, 6];

    pub fn new(months: i16) -> Result<Self, CreditError> {
        if Self::VALID_MONTHS.contains(&months) {
            Ok(Self(months))
        } else {
            Err(CreditError::InvalidTenure(months))
        }
    }

    pub fn months(self) -> i16 {
        self.0
    }
}

impl TryFrom<i16> for Tenure {
    type Error = CreditError;

    fn try_from(months: i16) -> Result<Self, Self::Error> {
        Self::new(months)
    }
}

impl From<Tenure> for i16 {
    fn from(tenure: Tenure) -> Self {
        tenure.0
    }
}

impl fmt::Display for Tenure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months", self.0)
    }
}

/// Consumer limit model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ConsumerLimit {
    pub id: i64,
    pub consumer_id: i64,
    pub tenure: Tenure,
    pub limit_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ConsumerLimit {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Insert payload for a consumer limit
#[derive(Debug, Clone)]
pub struct NewConsumerLimit {
    pub consumer_id: i64,
    pub tenure: Tenure,
    pub limit_amount: Decimal,
}

/// Upsert request keyed on (consumer, tenure)
#[derive(Debug, Deserialize, Validate)]
pub struct ConsumerLimitRequest {
    #[validate(range(min = 1))]
    pub consumer_id: i64,
    pub tenure: i16,
    #[validate(custom = "validate_non_negative_amount")]
    pub limit_amount: Decimal,
}

/// A committed limit together with what is still free under it
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RemainingLimit {
    pub limit: ConsumerLimit,
    pub exposure: Decimal,
    pub remaining: Decimal,
}
