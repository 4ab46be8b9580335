//! Consumer and merchant route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn registry_routes() -> Router<AppState> {
    Router::new()
        .route("/consumers", post(create_consumer).get(list_consumers))
        .route("/consumers/:id", get(get_consumer))
        .route("/merchants", post(create_merchant))
        .route("/merchants/:id", get(get_merchant))
}
