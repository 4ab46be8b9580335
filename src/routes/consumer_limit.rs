//! Consumer limit route definitions

use axum::{
    routing::{delete, get, put},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn consumer_limit_routes() -> Router<AppState> {
    Router::new()
        .route("/consumer-limits", put(upsert_consumer_limit))
        .route(
            "/consumer-limits/consumer/:consumer_id",
            get(list_consumer_limits),
        )
        .route(
            "/consumer-limits/consumer/:consumer_id/tenure/:tenure",
            get(get_remaining_limit),
        )
        .route("/consumer-limits/:id", delete(delete_consumer_limit))
}
