//! Loan handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::loan::{CreateLoanRequest, Loan};
use crate::loan_service::LoanService;
use crate::models::ApiResponse;

/// Originate a loan
pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    Json(request): Json<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Loan>>), ApiError> {
    request.validate()?;
    let loan = service.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(loan))))
}

pub async fn get_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.get_loan_by_id(id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn list_consumer_loans(
    State(service): State<Arc<LoanService>>,
    Path(consumer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<Loan>>>, ApiError> {
    let loans = service.get_loans_by_consumer_id(consumer_id).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

pub async fn delete_loan(
    State(service): State<Arc<LoanService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service.delete_loan_by_id(id).await?;
    Ok(Json(ApiResponse::empty()))
}
