//! Application state shared across handlers

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::loan_service::LoanService;
use crate::repository::Repositories;
use crate::services::{
    ConsumerLimitService, LoanLocks, PaymentProcessor, RegistryService,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry_service: Arc<RegistryService>,
    pub consumer_limit_service: Arc<ConsumerLimitService>,
    pub loan_service: Arc<LoanService>,
    pub payment_processor: Arc<PaymentProcessor>,
    /// Absent when running on the in-memory store
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Wire every service over one set of repositories
    ///
    /// Loan deletion and payments share the same per-loan locks.
    pub fn new(repos: Repositories, request_timeout: Duration, db_pool: Option<PgPool>) -> Self {
        let locks = LoanLocks::new();
        Self {
            registry_service: Arc::new(RegistryService::new(&repos, request_timeout)),
            consumer_limit_service: Arc::new(ConsumerLimitService::new(&repos, request_timeout)),
            loan_service: Arc::new(LoanService::new(&repos, locks.clone(), request_timeout)),
            payment_processor: Arc::new(PaymentProcessor::new(&repos, locks, request_timeout)),
            db_pool,
        }
    }
}

impl FromRef<AppState> for Arc<RegistryService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry_service.clone()
    }
}

impl FromRef<AppState> for Arc<ConsumerLimitService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.consumer_limit_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentProcessor> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_processor.clone()
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}
