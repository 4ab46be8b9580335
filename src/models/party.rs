//! Consumers and merchants
//!
//! The credit engine only needs their identity; the registration fields are
//! stored for reference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use super::validate_non_negative_amount;

/// Consumer model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Consumer {
    pub id: i64,
    pub full_name: String,
    pub legal_name: String,
    pub nik: String,
    pub salary: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Merchant model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Merchant {
    pub id: i64,
    pub merchant_name: String,
    pub merchant_type: String,
    pub created_at: DateTime<Utc>,
}

/// Request to register a consumer
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConsumerRequest {
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(length(min = 1, max = 255))]
    pub legal_name: String,
    #[validate(length(equal = 16))]
    pub nik: String,
    #[validate(custom = "validate_non_negative_amount")]
    pub salary: Decimal,
}

/// Request to register a merchant
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMerchantRequest {
    #[validate(length(min = 1, max = 255))]
    pub merchant_name: String,
    #[validate(length(min = 1, max = 100))]
    pub merchant_type: String,
}
