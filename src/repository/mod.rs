//! Storage ports for the credit engine
//!
//! Every single-row lookup returns `Option`, so "no row" is never confused
//! with a failed query. Soft-deleted rows are filtered by every read.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::StorageResult;
use crate::loan::{Loan, LoanUpdate, NewLoan};
use crate::models::{
    Consumer, ConsumerLimit, CreateConsumerRequest, CreateMerchantRequest, Merchant,
    NewConsumerLimit, NewTransaction, Tenure, Transaction,
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait ConsumerRepository: Send + Sync {
    async fn create_consumer(&self, consumer: CreateConsumerRequest) -> StorageResult<Consumer>;
    async fn get_consumer_by_id(&self, id: i64) -> StorageResult<Option<Consumer>>;
    /// One page of live consumers ordered by id, plus the total count
    async fn list_consumers(&self, limit: i64, offset: i64) -> StorageResult<(Vec<Consumer>, i64)>;
}

#[async_trait]
pub trait MerchantRepository: Send + Sync {
    async fn create_merchant(&self, merchant: CreateMerchantRequest) -> StorageResult<Merchant>;
    async fn get_merchant_by_id(&self, id: i64) -> StorageResult<Option<Merchant>>;
}

#[async_trait]
pub trait ConsumerLimitRepository: Send + Sync {
    async fn get_limit_by_id(&self, id: i64) -> StorageResult<Option<ConsumerLimit>>;
    async fn get_limit_by_tenure_and_consumer_id(
        &self,
        tenure: Tenure,
        consumer_id: i64,
    ) -> StorageResult<Option<ConsumerLimit>>;
    async fn get_limits_by_consumer_id(&self, consumer_id: i64)
        -> StorageResult<Vec<ConsumerLimit>>;
    async fn create_limit(&self, limit: NewConsumerLimit) -> StorageResult<ConsumerLimit>;
    async fn update_limit_amount(&self, id: i64, amount: Decimal) -> StorageResult<ConsumerLimit>;
    /// Soft delete; returns false when no live row matched
    async fn delete_limit(&self, id: i64) -> StorageResult<bool>;
}

#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn create_loan(&self, loan: NewLoan) -> StorageResult<Loan>;
    async fn get_loan_by_id(&self, id: i64) -> StorageResult<Option<Loan>>;
    async fn get_loans_by_consumer_id(&self, consumer_id: i64) -> StorageResult<Vec<Loan>>;
    /// Soft delete; returns false when no live row matched
    async fn delete_loan(&self, id: i64) -> StorageResult<bool>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Open a unit of work; nothing written through it is visible until commit
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>>;
    async fn get_transaction_by_id(&self, id: i64) -> StorageResult<Option<Transaction>>;
    async fn get_transactions_by_loan_id(&self, loan_id: i64) -> StorageResult<Vec<Transaction>>;
    async fn get_transactions_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> StorageResult<Vec<Transaction>>;
}

/// Atomic write scope for a payment
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_transaction(&mut self, tx: NewTransaction) -> StorageResult<Transaction>;
    /// Guarded update; fails with `StorageError::Conflict` when the loan no
    /// longer matches the snapshot carried by `update`
    async fn update_loan(&mut self, update: LoanUpdate) -> StorageResult<()>;
    async fn commit(self: Box<Self>) -> StorageResult<()>;
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}

/// The full set of repositories the services are wired with
#[derive(Clone)]
pub struct Repositories {
    pub consumers: Arc<dyn ConsumerRepository>,
    pub merchants: Arc<dyn MerchantRepository>,
    pub limits: Arc<dyn ConsumerLimitRepository>,
    pub loans: Arc<dyn LoanRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
}

impl Repositories {
    pub fn postgres(repo: PgRepository) -> Self {
        let repo = Arc::new(repo);
        Self {
            consumers: repo.clone(),
            merchants: repo.clone(),
            limits: repo.clone(),
            loans: repo.clone(),
            transactions: repo,
        }
    }

    pub fn in_memory(repo: InMemoryRepository) -> Self {
        let repo = Arc::new(repo);
        Self {
            consumers: repo.clone(),
            merchants: repo.clone(),
            limits: repo.clone(),
            loans: repo.clone(),
            transactions: repo,
        }
    }
}
