//! Error types for the credit ledger
//!
//! `StorageError` is what repositories return, `CreditError` is the domain
//! taxonomy surfaced by the services, and `ApiError` maps both onto HTTP
//! status codes and a JSON error body.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Failures raised below the repository contract
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A guarded write matched no row because the row changed underneath it
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Domain errors produced by the credit engine
#[derive(Error, Debug)]
pub enum CreditError {
    #[error("invalid tenure: {0} (expected one of 1, 2, 3, 6)")]
    InvalidTenure(i16),

    #[error("transaction_type must be installment or full, got '{0}'")]
    InvalidPaymentType(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("consumer {0} not found")]
    ConsumerNotFound(i64),

    #[error("merchant {0} not found")]
    MerchantNotFound(i64),

    #[error("consumer limit not found for consumer {consumer_id} and tenure {tenure}")]
    LimitNotFound { consumer_id: i64, tenure: i16 },

    #[error("consumer limit {0} not found")]
    ConsumerLimitNotFound(i64),

    #[error("loan {0} not found")]
    LoanNotFound(i64),

    #[error("transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("insufficient limit: requested {requested}, remaining limit: {remaining}")]
    InsufficientLimit {
        requested: Decimal,
        remaining: Decimal,
    },

    #[error("loan {0} already finished")]
    LoanAlreadyFinished(i64),

    #[error("loan {loan_id} does not belong to consumer {consumer_id}")]
    LoanOwnershipMismatch { loan_id: i64, consumer_id: i64 },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Gateway timeout: {0}")]
    Timeout(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::Timeout(_) => "TIMEOUT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::DatabaseError(_) | ApiError::Timeout(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CreditError> for ApiError {
    fn from(err: CreditError) -> Self {
        let message = err.to_string();
        match err {
            CreditError::ConsumerNotFound(_)
            | CreditError::MerchantNotFound(_)
            | CreditError::LimitNotFound { .. }
            | CreditError::ConsumerLimitNotFound(_)
            | CreditError::LoanNotFound(_)
            | CreditError::TransactionNotFound(_) => ApiError::NotFound(message),
            CreditError::InvalidTenure(_)
            | CreditError::InvalidPaymentType(_)
            | CreditError::InvalidAmount(_)
            | CreditError::LoanOwnershipMismatch { .. } => ApiError::BadRequest(message),
            CreditError::InsufficientLimit { .. } => ApiError::UnprocessableEntity(message),
            CreditError::LoanAlreadyFinished(_) => ApiError::Conflict(message),
            CreditError::Timeout(_) => ApiError::Timeout(message),
            CreditError::Storage(StorageError::Conflict(_)) => ApiError::Conflict(message),
            CreditError::Storage(_) => ApiError::DatabaseError(message),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}
