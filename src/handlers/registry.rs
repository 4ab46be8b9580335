//! Consumer and merchant handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{
    ApiResponse, Consumer, CreateConsumerRequest, CreateMerchantRequest, Merchant,
    PaginatedResponse, PaginationParams,
};
use crate::services::RegistryService;

/// Register a consumer
pub async fn create_consumer(
    State(service): State<Arc<RegistryService>>,
    Json(request): Json<CreateConsumerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Consumer>>), ApiError> {
    request.validate()?;
    let consumer = service.create_consumer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(consumer))))
}

/// List consumers page by page
pub async fn list_consumers(
    State(service): State<Arc<RegistryService>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<Consumer>>>, ApiError> {
    let page = service.list_consumers(params).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_consumer(
    State(service): State<Arc<RegistryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Consumer>>, ApiError> {
    let consumer = service.get_consumer_by_id(id).await?;
    Ok(Json(ApiResponse::ok(consumer)))
}

/// Register a merchant
pub async fn create_merchant(
    State(service): State<Arc<RegistryService>>,
    Json(request): Json<CreateMerchantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Merchant>>), ApiError> {
    request.validate()?;
    let merchant = service.create_merchant(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(merchant))))
}

pub async fn get_merchant(
    State(service): State<Arc<RegistryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Merchant>>, ApiError> {
    let merchant = service.get_merchant_by_id(id).await?;
    Ok(Json(ApiResponse::ok(merchant)))
}
