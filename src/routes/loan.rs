//! Loan route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loans", axum::routing::post(create_loan))
        .route("/loans/:id", get(get_loan).delete(delete_loan))
        .route("/loans/consumer/:consumer_id", get(list_consumer_loans))
}
