//! HTTP surface tests
//!
//! Drives the full router (middleware included) with `oneshot` over the
//! in-memory store.

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use credit_ledger_server::repository::{InMemoryRepository, Repositories};
use credit_ledger_server::routes::build_router;
use credit_ledger_server::state::AppState;

fn app() -> Router {
    let state = AppState::new(
        Repositories::in_memory(InMemoryRepository::new()),
        Duration::from_secs(5),
        None,
    );
    build_router(state, None)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn id_of(body: &Value) -> i64 {
    body["data"]["id"].as_i64().unwrap()
}

/// Register a consumer, a merchant and a 3-month limit of 3000
async fn seed(app: &Router) -> (i64, i64) {
    let (status, consumer) = send(
        app,
        Method::POST,
        "/api/v1/consumers",
        Some(json!({
            "full_name": "Andi Wijaya",
            "legal_name": "Andi Wijaya",
            "nik": "3201011506880003",
            "salary": "12000000"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, merchant) = send(
        app,
        Method::POST,
        "/api/v1/merchants",
        Some(json!({ "merchant_name": "Toko Motor", "merchant_type": "automotive" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let consumer_id = id_of(&consumer);
    let (status, _) = send(
        app,
        Method::PUT,
        "/api/v1/consumer-limits",
        Some(json!({ "consumer_id": consumer_id, "tenure": 3, "limit_amount": 3000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (consumer_id, id_of(&merchant))
}

#[tokio::test]
async fn test_health_without_database() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "in-memory");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_loan_and_payment_flow() {
    let app = app();
    let (consumer_id, merchant_id) = seed(&app).await;

    let (status, loan) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(json!({
            "consumer_id": consumer_id,
            "merchant_id": merchant_id,
            "tenure": 3,
            "loan_amount": 1500,
            "interest_rate": 10,
            "asset_name": "Scooter"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["success"], true);
    assert_eq!(loan["data"]["status"], "on_going");
    assert_eq!(loan["data"]["installment"], 0);
    let loan_id = id_of(&loan);

    let (status, quote) = send(
        &app,
        Method::GET,
        &format!(
            "/api/v1/transactions/remaining-payment?consumer_id={}&loan_id={}&transaction_type=installment",
            consumer_id, loan_id
        ),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["data"]["installment"], 1);
    assert_eq!(quote["data"]["tenure"], 3);

    let (status, tx) = send(
        &app,
        Method::POST,
        "/api/v1/transactions",
        Some(json!({
            "consumer_id": consumer_id,
            "loan_id": loan_id,
            "transaction_type": "full"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tx_id = id_of(&tx);
    assert!(tx["data"]["description"]
        .as_str()
        .unwrap()
        .starts_with("Payment for loan "));

    let (status, fetched) = send(&app, Method::GET, &format!("/api/v1/transactions/{}", tx_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["loan_id"], loan_id);

    let (_, ledger) = send(
        &app,
        Method::GET,
        &format!("/api/v1/transactions/loan/{}", loan_id),
        None,
    )
    .await;
    assert_eq!(ledger["data"].as_array().unwrap().len(), 1);

    let (_, settled) = send(&app, Method::GET, &format!("/api/v1/loans/{}", loan_id), None).await;
    assert_eq!(settled["data"]["status"], "finish");
    assert_eq!(settled["data"]["installment"], 3);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/transactions",
        Some(json!({
            "consumer_id": consumer_id,
            "loan_id": loan_id,
            "transaction_type": "installment"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_insufficient_limit_is_unprocessable() {
    let app = app();
    let (consumer_id, merchant_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(json!({
            "consumer_id": consumer_id,
            "merchant_id": merchant_id,
            "tenure": 3,
            "loan_amount": 3500,
            "interest_rate": 5,
            "asset_name": "Motorbike"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("remaining limit: 3000"));

    let (_, loans) = send(
        &app,
        Method::GET,
        &format!("/api/v1/loans/consumer/{}", consumer_id),
        None,
    )
    .await;
    assert!(loans["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sub_scale_loan_amount_is_a_validation_error() {
    let app = app();
    let (consumer_id, merchant_id) = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(json!({
            "consumer_id": consumer_id,
            "merchant_id": merchant_id,
            "tenure": 3,
            "loan_amount": "0.00001",
            "interest_rate": 10,
            "asset_name": "Sticker"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(json!({
            "consumer_id": consumer_id,
            "merchant_id": merchant_id,
            "tenure": 3,
            "loan_amount": 100,
            "interest_rate": 1000,
            "asset_name": "Sticker"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_remaining_limit_lookup() {
    let app = app();
    let (consumer_id, _) = seed(&app).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/consumer-limits/consumer/{}/tenure/3", consumer_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limit"]["tenure"], 3);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/consumer-limits/consumer/{}/tenure/4", consumer_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/consumer-limits/consumer/{}/tenure/6", consumer_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_and_not_found_errors() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/consumers",
        Some(json!({
            "full_name": "",
            "legal_name": "X",
            "nik": "123",
            "salary": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(&app, Method::GET, "/api/v1/loans/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::DELETE, "/api/v1/consumer-limits/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/v1/merchants/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_payment_type_is_bad_request() {
    let app = app();
    let (consumer_id, merchant_id) = seed(&app).await;

    let (_, loan) = send(
        &app,
        Method::POST,
        "/api/v1/loans",
        Some(json!({
            "consumer_id": consumer_id,
            "merchant_id": merchant_id,
            "tenure": 3,
            "loan_amount": 300,
            "interest_rate": 0,
            "asset_name": "Helmet"
        })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/transactions",
        Some(json!({
            "consumer_id": consumer_id,
            "loan_id": id_of(&loan),
            "transaction_type": "weekly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("weekly"));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/loans/{}", id_of(&loan)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_consumers_are_listed_page_by_page() {
    let app = app();
    for i in 0..3 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/consumers",
            Some(json!({
                "full_name": format!("Consumer {}", i),
                "legal_name": format!("Consumer {}", i),
                "nik": format!("320101150688000{}", i),
                "salary": 5000000
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/consumers?page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["limit"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["data"][0]["full_name"], "Consumer 0");

    let (_, body) = send(&app, Method::GET, "/api/v1/consumers?page=2&limit=2", None).await;
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["data"][0]["full_name"], "Consumer 2");

    let (_, body) = send(&app, Method::GET, "/api/v1/consumers", None).await;
    assert_eq!(body["data"]["page"], 1);
    assert_eq!(body["data"]["limit"], 20);
}
