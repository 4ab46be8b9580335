//! Data models for the credit ledger

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

pub mod consumer_limit;
pub mod party;
pub mod transaction;

pub use consumer_limit::*;
pub use party::*;
pub use transaction::*;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope that carries no payload
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

/// Scale of the NUMERIC money columns
pub const MONEY_SCALE: u32 = 4;

/// Highest interest rate a loan may carry, in percent
pub const MAX_INTEREST_RATE: Decimal = Decimal::ONE_HUNDRED;

/// True when `value` is representable at the money columns' scale without rounding
pub fn fits_money_scale(value: &Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// Pagination parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Clamped (page, limit, offset); pages start at 1
    pub fn resolve(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

/// Paginated response
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

pub(crate) fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if !value.is_sign_positive() || value.is_zero() {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    validate_money_scale(value)
}

pub(crate) fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("amount_must_not_be_negative"));
    }
    validate_money_scale(value)
}

pub(crate) fn validate_interest_rate(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative_amount(value)?;
    if *value > MAX_INTEREST_RATE {
        return Err(ValidationError::new("interest_rate_too_high"));
    }
    Ok(())
}

fn validate_money_scale(value: &Decimal) -> Result<(), ValidationError> {
    if fits_money_scale(value) {
        Ok(())
    } else {
        Err(ValidationError::new("amount_exceeds_money_scale"))
    }
}
