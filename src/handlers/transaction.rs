//! Payment and ledger handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{ApiResponse, Transaction, TransactionRequest};
use crate::services::{PaymentProcessor, PaymentQuote};

/// Quote a payment without booking it
pub async fn get_remaining_payment(
    State(processor): State<Arc<PaymentProcessor>>,
    Query(request): Query<TransactionRequest>,
) -> Result<Json<ApiResponse<PaymentQuote>>, ApiError> {
    request.validate()?;
    let quote = processor.get_remaining_payment(request).await?;
    Ok(Json(ApiResponse::ok(quote)))
}

/// Book a payment
pub async fn create_transaction(
    State(processor): State<Arc<PaymentProcessor>>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Transaction>>), ApiError> {
    request.validate()?;
    let transaction = processor.create_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(transaction))))
}

pub async fn get_transaction(
    State(processor): State<Arc<PaymentProcessor>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Transaction>>, ApiError> {
    let transaction = processor.get_transaction_by_id(id).await?;
    Ok(Json(ApiResponse::ok(transaction)))
}

pub async fn list_loan_transactions(
    State(processor): State<Arc<PaymentProcessor>>,
    Path(loan_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let transactions = processor.get_transactions_by_loan_id(loan_id).await?;
    Ok(Json(ApiResponse::ok(transactions)))
}

pub async fn list_consumer_transactions(
    State(processor): State<Arc<PaymentProcessor>>,
    Path(consumer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>, ApiError> {
    let transactions = processor.get_transactions_by_consumer_id(consumer_id).await?;
    Ok(Json(ApiResponse::ok(transactions)))
}
