//! Payment and ledger route definitions

use axum::{routing::get, Router};

use crate::handlers::*;
use crate::state::AppState;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", axum::routing::post(create_transaction))
        .route(
            "/transactions/remaining-payment",
            get(get_remaining_payment),
        )
        .route("/transactions/:id", get(get_transaction))
        .route("/transactions/loan/:loan_id", get(list_loan_transactions))
        .route(
            "/transactions/consumer/:consumer_id",
            get(list_consumer_transactions),
        )
}
