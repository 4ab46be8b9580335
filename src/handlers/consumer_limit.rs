//! Consumer limit handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::models::{ApiResponse, ConsumerLimit, ConsumerLimitRequest, RemainingLimit};
use crate::services::ConsumerLimitService;

/// Create or update the limit for a (consumer, tenure) pair
pub async fn upsert_consumer_limit(
    State(service): State<Arc<ConsumerLimitService>>,
    Json(request): Json<ConsumerLimitRequest>,
) -> Result<Json<ApiResponse<ConsumerLimit>>, ApiError> {
    request.validate()?;
    let limit = service.create_or_update_consumer_limit(request).await?;
    Ok(Json(ApiResponse::ok(limit)))
}

pub async fn list_consumer_limits(
    State(service): State<Arc<ConsumerLimitService>>,
    Path(consumer_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ConsumerLimit>>>, ApiError> {
    let limits = service.get_consumer_limits_by_consumer_id(consumer_id).await?;
    Ok(Json(ApiResponse::ok(limits)))
}

/// Limit for one tenure together with what is still free under it
pub async fn get_remaining_limit(
    State(service): State<Arc<ConsumerLimitService>>,
    Path((consumer_id, tenure)): Path<(i64, i16)>,
) -> Result<Json<ApiResponse<RemainingLimit>>, ApiError> {
    let remaining = service.get_remaining_limit(consumer_id, tenure).await?;
    Ok(Json(ApiResponse::ok(remaining)))
}

pub async fn delete_consumer_limit(
    State(service): State<Arc<ConsumerLimitService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service.delete_consumer_limit(id).await?;
    Ok(Json(ApiResponse::empty()))
}
