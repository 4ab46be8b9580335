//! Route definitions for the credit ledger API

mod consumer_limit;
mod loan;
mod registry;
mod transaction;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::health_check;
use crate::middleware;
use crate::state::AppState;

pub use consumer_limit::consumer_limit_routes;
pub use loan::loan_routes;
pub use registry::registry_routes;
pub use transaction::transaction_routes;

/// Prefix every business route is mounted under
pub const API_PREFIX: &str = "/api/v1";

/// Assemble the full application router
pub fn build_router(app_state: AppState, cors_allowed_origins: Option<&str>) -> Router {
    let api = Router::new()
        .merge(registry_routes())
        .merge(consumer_limit_routes())
        .merge(loan_routes())
        .merge(transaction_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest(API_PREFIX, api)
        .with_state(app_state)
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(cors_allowed_origins))
}

async fn root() -> &'static str {
    "Credit Ledger API Server"
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.trim().is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
