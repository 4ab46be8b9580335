//! In-memory implementation of the storage ports
//!
//! Backs the test suite and local runs without Postgres. A unit of work
//! buffers its writes and applies them under a single write lock on commit,
//! so a rolled back payment leaves nothing behind.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{
    ConsumerLimitRepository, ConsumerRepository, LoanRepository, MerchantRepository,
    TransactionRepository, UnitOfWork,
};
use crate::error::{StorageError, StorageResult};
use crate::loan::{Loan, LoanStatus, LoanUpdate, NewLoan};
use crate::models::{
    Consumer, ConsumerLimit, CreateConsumerRequest, CreateMerchantRequest, Merchant,
    NewConsumerLimit, NewTransaction, Tenure, Transaction,
};

#[derive(Default)]
struct State {
    next_id: i64,
    consumers: HashMap<i64, Consumer>,
    merchants: HashMap<i64, Merchant>,
    limits: HashMap<i64, ConsumerLimit>,
    loans: HashMap<i64, Loan>,
    transactions: HashMap<i64, Transaction>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct FailureSwitches {
    loan_updates: AtomicBool,
    transaction_inserts: AtomicBool,
}

/// A thread-safe in-memory store for the whole credit ledger
#[derive(Default, Clone)]
pub struct InMemoryRepository {
    state: Arc<RwLock<State>>,
    failures: Arc<FailureSwitches>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `UnitOfWork::update_loan` fail
    pub fn fail_loan_updates(&self, fail: bool) {
        self.failures.loan_updates.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `UnitOfWork::insert_transaction` fail
    pub fn fail_transaction_inserts(&self, fail: bool) {
        self.failures.transaction_inserts.store(fail, Ordering::SeqCst);
    }

    /// Replace a stored loan wholesale, bypassing the payment path
    pub async fn put_loan(&self, loan: Loan) {
        let mut state = self.state.write().await;
        state.next_id = state.next_id.max(loan.id);
        state.loans.insert(loan.id, loan);
    }
}

#[async_trait]
impl ConsumerRepository for InMemoryRepository {
    async fn create_consumer(&self, consumer: CreateConsumerRequest) -> StorageResult<Consumer> {
        let mut state = self.state.write().await;
        let consumer = Consumer {
            id: state.allocate_id(),
            full_name: consumer.full_name,
            legal_name: consumer.legal_name,
            nik: consumer.nik,
            salary: consumer.salary,
            created_at: Utc::now(),
        };
        state.consumers.insert(consumer.id, consumer.clone());
        Ok(consumer)
    }

    async fn get_consumer_by_id(&self, id: i64) -> StorageResult<Option<Consumer>> {
        let state = self.state.read().await;
        Ok(state.consumers.get(&id).cloned())
    }

    async fn list_consumers(&self, limit: i64, offset: i64) -> StorageResult<(Vec<Consumer>, i64)> {
        let state = self.state.read().await;
        let mut consumers: Vec<Consumer> = state.consumers.values().cloned().collect();
        consumers.sort_by_key(|c| c.id);

        let total = consumers.len() as i64;
        let page = consumers
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl MerchantRepository for InMemoryRepository {
    async fn create_merchant(&self, merchant: CreateMerchantRequest) -> StorageResult<Merchant> {
        let mut state = self.state.write().await;
        let merchant = Merchant {
            id: state.allocate_id(),
            merchant_name: merchant.merchant_name,
            merchant_type: merchant.merchant_type,
            created_at: Utc::now(),
        };
        state.merchants.insert(merchant.id, merchant.clone());
        Ok(merchant)
    }

    async fn get_merchant_by_id(&self, id: i64) -> StorageResult<Option<Merchant>> {
        let state = self.state.read().await;
        Ok(state.merchants.get(&id).cloned())
    }
}

#[async_trait]
impl ConsumerLimitRepository for InMemoryRepository {
    async fn get_limit_by_id(&self, id: i64) -> StorageResult<Option<ConsumerLimit>> {
        let state = self.state.read().await;
        Ok(state.limits.get(&id).filter(|l| l.is_live()).cloned())
    }

    async fn get_limit_by_tenure_and_consumer_id(
        &self,
        tenure: Tenure,
        consumer_id: i64,
    ) -> StorageResult<Option<ConsumerLimit>> {
        let state = self.state.read().await;
        Ok(state
            .limits
            .values()
            .find(|l| l.is_live() && l.consumer_id == consumer_id && l.tenure == tenure)
            .cloned())
    }

    async fn get_limits_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> StorageResult<Vec<ConsumerLimit>> {
        let state = self.state.read().await;
        let mut limits: Vec<ConsumerLimit> = state
            .limits
            .values()
            .filter(|l| l.is_live() && l.consumer_id == consumer_id)
            .cloned()
            .collect();
        limits.sort_by_key(|l| l.tenure.months());
        Ok(limits)
    }

    async fn create_limit(&self, limit: NewConsumerLimit) -> StorageResult<ConsumerLimit> {
        let mut state = self.state.write().await;
        let duplicate = state.limits.values().any(|l| {
            l.is_live() && l.consumer_id == limit.consumer_id && l.tenure == limit.tenure
        });
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "consumer {} already has a limit for {}",
                limit.consumer_id, limit.tenure
            )));
        }

        let now = Utc::now();
        let limit = ConsumerLimit {
            id: state.allocate_id(),
            consumer_id: limit.consumer_id,
            tenure: limit.tenure,
            limit_amount: limit.limit_amount,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.limits.insert(limit.id, limit.clone());
        Ok(limit)
    }

    async fn update_limit_amount(&self, id: i64, amount: Decimal) -> StorageResult<ConsumerLimit> {
        let mut state = self.state.write().await;
        let limit = state
            .limits
            .get_mut(&id)
            .filter(|l| l.is_live())
            .ok_or_else(|| StorageError::Conflict(format!("consumer limit {} is gone", id)))?;
        limit.limit_amount = amount;
        limit.updated_at = Utc::now();
        Ok(limit.clone())
    }

    async fn delete_limit(&self, id: i64) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        match state.limits.get_mut(&id).filter(|l| l.is_live()) {
            Some(limit) => {
                limit.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LoanRepository for InMemoryRepository {
    async fn create_loan(&self, loan: NewLoan) -> StorageResult<Loan> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let loan = Loan {
            id: state.allocate_id(),
            consumer_id: loan.consumer_id,
            merchant_id: loan.merchant_id,
            consumer_limit_id: loan.consumer_limit_id,
            principal_amount: loan.principal_amount,
            principal_paid: Decimal::ZERO,
            interest_rate: loan.interest_rate,
            interest_amount: loan.interest_amount,
            interest_paid: Decimal::ZERO,
            status: LoanStatus::OnGoing,
            due_at: loan.due_at,
            installment: 0,
            contract_number: loan.contract_number,
            asset_name: loan.asset_name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn get_loan_by_id(&self, id: i64) -> StorageResult<Option<Loan>> {
        let state = self.state.read().await;
        Ok(state.loans.get(&id).filter(|l| l.is_live()).cloned())
    }

    async fn get_loans_by_consumer_id(&self, consumer_id: i64) -> StorageResult<Vec<Loan>> {
        let state = self.state.read().await;
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|l| l.is_live() && l.consumer_id == consumer_id)
            .cloned()
            .collect();
        loans.sort_by_key(|l| l.id);
        Ok(loans)
    }

    async fn delete_loan(&self, id: i64) -> StorageResult<bool> {
        let mut state = self.state.write().await;
        match state.loans.get_mut(&id).filter(|l| l.is_live()) {
            Some(loan) => {
                loan.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRepository {
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            state: self.state.clone(),
            failures: self.failures.clone(),
            pending_transactions: Vec::new(),
            pending_loan_updates: Vec::new(),
        }))
    }

    async fn get_transaction_by_id(&self, id: i64) -> StorageResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.get(&id).cloned())
    }

    async fn get_transactions_by_loan_id(&self, loan_id: i64) -> StorageResult<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.loan_id == loan_id)
            .cloned()
            .collect();
        transactions.sort_by_key(|t| t.id);
        Ok(transactions)
    }

    async fn get_transactions_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> StorageResult<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .values()
            .filter(|t| t.consumer_id == consumer_id)
            .cloned()
            .collect();
        transactions.sort_by_key(|t| t.id);
        Ok(transactions)
    }
}

struct InMemoryUnitOfWork {
    state: Arc<RwLock<State>>,
    failures: Arc<FailureSwitches>,
    pending_transactions: Vec<Transaction>,
    pending_loan_updates: Vec<LoanUpdate>,
}

fn check_loan_snapshot(state: &State, update: &LoanUpdate) -> StorageResult<()> {
    let matches = state.loans.get(&update.id).is_some_and(|loan| {
        loan.is_live()
            && !loan.status.is_terminal()
            && loan.installment == update.expected_installment
            && loan.principal_paid == update.expected_principal_paid
    });

    if matches {
        Ok(())
    } else {
        Err(StorageError::Conflict(format!(
            "loan {} changed while the payment was in flight",
            update.id
        )))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn insert_transaction(&mut self, tx: NewTransaction) -> StorageResult<Transaction> {
        if self.failures.transaction_inserts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "transaction insert rejected".to_string(),
            ));
        }

        // ids are reserved eagerly, like a sequence; a rollback leaves a gap
        let id = self.state.write().await.allocate_id();
        let transaction = Transaction {
            id,
            consumer_id: tx.consumer_id,
            loan_id: tx.loan_id,
            amount: tx.amount,
            description: tx.description,
            created_at: Utc::now(),
        };
        self.pending_transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn update_loan(&mut self, update: LoanUpdate) -> StorageResult<()> {
        if self.failures.loan_updates.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("loan update rejected".to_string()));
        }

        check_loan_snapshot(&*self.state.read().await, &update)?;
        self.pending_loan_updates.push(update);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let InMemoryUnitOfWork {
            state: shared,
            pending_transactions,
            pending_loan_updates,
            ..
        } = *self;
        let mut state = shared.write().await;

        for update in &pending_loan_updates {
            check_loan_snapshot(&state, update)?;
        }

        let now = Utc::now();
        for update in pending_loan_updates {
            if let Some(loan) = state.loans.get_mut(&update.id) {
                loan.principal_paid = update.principal_paid;
                loan.interest_paid = update.interest_paid;
                loan.status = update.status;
                loan.installment = update.installment;
                loan.updated_at = now;
            }
        }
        for transaction in pending_transactions {
            state.transactions.insert(transaction.id, transaction);
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn new_loan(consumer_id: i64, limit_id: i64) -> NewLoan {
        NewLoan {
            consumer_id,
            merchant_id: 99,
            consumer_limit_id: limit_id,
            principal_amount: dec!(1000),
            interest_rate: dec!(10),
            interest_amount: dec!(100),
            due_at: Utc::now() + Duration::days(30),
            contract_number: "1-abcdefghij-99".to_string(),
            asset_name: "Phone".to_string(),
        }
    }

    fn settle(loan: &Loan) -> LoanUpdate {
        LoanUpdate {
            id: loan.id,
            principal_paid: loan.principal_amount,
            interest_paid: loan.interest_amount,
            status: LoanStatus::Finish,
            installment: 1,
            expected_installment: loan.installment,
            expected_principal_paid: loan.principal_paid,
        }
    }

    #[tokio::test]
    async fn test_limit_lookup_ignores_deleted_rows() {
        let repo = InMemoryRepository::new();
        let tenure = Tenure::new(3).unwrap();
        let limit = repo
            .create_limit(NewConsumerLimit {
                consumer_id: 1,
                tenure,
                limit_amount: dec!(5000),
            })
            .await
            .unwrap();

        assert!(repo.delete_limit(limit.id).await.unwrap());
        assert!(!repo.delete_limit(limit.id).await.unwrap());
        assert!(repo.get_limit_by_id(limit.id).await.unwrap().is_none());
        assert!(repo
            .get_limit_by_tenure_and_consumer_id(tenure, 1)
            .await
            .unwrap()
            .is_none());

        // the (consumer, tenure) slot is free again once the old row is deleted
        assert!(repo
            .create_limit(NewConsumerLimit {
                consumer_id: 1,
                tenure,
                limit_amount: dec!(1000),
            })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_live_limit_rejected() {
        let repo = InMemoryRepository::new();
        let limit = NewConsumerLimit {
            consumer_id: 1,
            tenure: Tenure::new(1).unwrap(),
            limit_amount: dec!(100),
        };
        repo.create_limit(limit.clone()).await.unwrap();
        assert!(matches!(
            repo.create_limit(limit).await,
            Err(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_applies_both_writes() {
        let repo = InMemoryRepository::new();
        let loan = repo.create_loan(new_loan(1, 10)).await.unwrap();

        let mut uow = repo.begin().await.unwrap();
        let tx = uow
            .insert_transaction(NewTransaction::payment(1, loan.id, dec!(1100), "c"))
            .await
            .unwrap();
        uow.update_loan(settle(&loan)).await.unwrap();

        // nothing visible before commit
        assert!(repo.get_transaction_by_id(tx.id).await.unwrap().is_none());

        uow.commit().await.unwrap();

        assert_eq!(repo.get_transaction_by_id(tx.id).await.unwrap(), Some(tx));
        let stored = repo.get_loan_by_id(loan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LoanStatus::Finish);
        assert_eq!(stored.principal_paid, dec!(1000));
    }

    #[tokio::test]
    async fn test_rollback_discards_pending_writes() {
        let repo = InMemoryRepository::new();
        let loan = repo.create_loan(new_loan(1, 10)).await.unwrap();

        let mut uow = repo.begin().await.unwrap();
        uow.insert_transaction(NewTransaction::payment(1, loan.id, dec!(1100), "c"))
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert!(repo
            .get_transactions_by_loan_id(loan.id)
            .await
            .unwrap()
            .is_empty());
        let stored = repo.get_loan_by_id(loan.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LoanStatus::OnGoing);
    }

    #[tokio::test]
    async fn test_stale_snapshot_conflicts() {
        let repo = InMemoryRepository::new();
        let loan = repo.create_loan(new_loan(1, 10)).await.unwrap();

        let mut first = repo.begin().await.unwrap();
        first.update_loan(settle(&loan)).await.unwrap();
        let mut second = repo.begin().await.unwrap();
        second.update_loan(settle(&loan)).await.unwrap();

        first.commit().await.unwrap();
        assert!(matches!(
            second.commit().await,
            Err(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_deleted_loans_hidden_from_reads() {
        let repo = InMemoryRepository::new();
        let loan = repo.create_loan(new_loan(5, 10)).await.unwrap();
        repo.create_loan(new_loan(5, 10)).await.unwrap();

        assert!(repo.delete_loan(loan.id).await.unwrap());
        assert!(repo.get_loan_by_id(loan.id).await.unwrap().is_none());
        assert_eq!(repo.get_loans_by_consumer_id(5).await.unwrap().len(), 1);
    }
}
