//! PostgreSQL implementation of the storage ports

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};

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

#[derive(Clone)]
pub struct PgRepository {
    db_pool: PgPool,
}

impl PgRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ConsumerRepository for PgRepository {
    async fn create_consumer(&self, consumer: CreateConsumerRequest) -> StorageResult<Consumer> {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            INSERT INTO consumers (full_name, legal_name, nik, salary, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, legal_name, nik, salary, created_at
            "#,
        )
        .bind(consumer.full_name)
        .bind(consumer.legal_name)
        .bind(consumer.nik)
        .bind(consumer.salary)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert consumer");
            e
        })?;

        Ok(consumer)
    }

    async fn get_consumer_by_id(&self, id: i64) -> StorageResult<Option<Consumer>> {
        let consumer = sqlx::query_as::<_, Consumer>(
            r#"
            SELECT id, full_name, legal_name, nik, salary, created_at
            FROM consumers
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(consumer)
    }

    async fn list_consumers(&self, limit: i64, offset: i64) -> StorageResult<(Vec<Consumer>, i64)> {
        let consumers = sqlx::query_as::<_, Consumer>(
            r#"
            SELECT id, full_name, legal_name, nik, salary, created_at
            FROM consumers
            WHERE deleted_at IS NULL
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM consumers WHERE deleted_at IS NULL")
                .fetch_one(&self.db_pool)
                .await?;

        Ok((consumers, total))
    }
}

#[async_trait]
impl MerchantRepository for PgRepository {
    async fn create_merchant(&self, merchant: CreateMerchantRequest) -> StorageResult<Merchant> {
        let merchant = sqlx::query_as::<_, Merchant>(
            r#"
            INSERT INTO merchants (merchant_name, merchant_type, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, merchant_name, merchant_type, created_at
            "#,
        )
        .bind(merchant.merchant_name)
        .bind(merchant.merchant_type)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await?;

        Ok(merchant)
    }

    async fn get_merchant_by_id(&self, id: i64) -> StorageResult<Option<Merchant>> {
        let merchant = sqlx::query_as::<_, Merchant>(
            r#"
            SELECT id, merchant_name, merchant_type, created_at
            FROM merchants
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(merchant)
    }
}

#[async_trait]
impl ConsumerLimitRepository for PgRepository {
    async fn get_limit_by_id(&self, id: i64) -> StorageResult<Option<ConsumerLimit>> {
        let limit = sqlx::query_as::<_, ConsumerLimit>(
            "SELECT * FROM consumer_limits WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(limit)
    }

    async fn get_limit_by_tenure_and_consumer_id(
        &self,
        tenure: Tenure,
        consumer_id: i64,
    ) -> StorageResult<Option<ConsumerLimit>> {
        let limit = sqlx::query_as::<_, ConsumerLimit>(
            r#"
            SELECT * FROM consumer_limits
            WHERE tenure = $1 AND consumer_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(tenure)
        .bind(consumer_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(limit)
    }

    async fn get_limits_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> StorageResult<Vec<ConsumerLimit>> {
        let limits = sqlx::query_as::<_, ConsumerLimit>(
            r#"
            SELECT * FROM consumer_limits
            WHERE consumer_id = $1 AND deleted_at IS NULL
            ORDER BY tenure
            "#,
        )
        .bind(consumer_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(limits)
    }

    async fn create_limit(&self, limit: NewConsumerLimit) -> StorageResult<ConsumerLimit> {
        let now = Utc::now();
        let limit = sqlx::query_as::<_, ConsumerLimit>(
            r#"
            INSERT INTO consumer_limits (consumer_id, tenure, limit_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(limit.consumer_id)
        .bind(limit.tenure)
        .bind(limit.limit_amount)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => StorageError::Conflict(format!(
                "consumer {} already has a limit for {}",
                limit.consumer_id, limit.tenure
            )),
            _ => StorageError::Database(e),
        })?;

        Ok(limit)
    }

    async fn update_limit_amount(&self, id: i64, amount: Decimal) -> StorageResult<ConsumerLimit> {
        let limit = sqlx::query_as::<_, ConsumerLimit>(
            r#"
            UPDATE consumer_limits
            SET limit_amount = $1, updated_at = $2
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| StorageError::Conflict(format!("consumer limit {} is gone", id)))?;

        Ok(limit)
    }

    async fn delete_limit(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE consumer_limits SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl LoanRepository for PgRepository {
    async fn create_loan(&self, loan: NewLoan) -> StorageResult<Loan> {
        let now = Utc::now();
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                consumer_id, merchant_id, consumer_limit_id,
                principal_amount, principal_paid, interest_rate,
                interest_amount, interest_paid, status, due_at,
                installment, contract_number, asset_name, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, 0, $5, $6, 0, $7, $8, 0, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(loan.consumer_id)
        .bind(loan.merchant_id)
        .bind(loan.consumer_limit_id)
        .bind(loan.principal_amount)
        .bind(loan.interest_rate)
        .bind(loan.interest_amount)
        .bind(LoanStatus::OnGoing)
        .bind(loan.due_at)
        .bind(loan.contract_number)
        .bind(loan.asset_name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to insert loan into database");
            e
        })?;

        Ok(loan)
    }

    async fn get_loan_by_id(&self, id: i64) -> StorageResult<Option<Loan>> {
        let loan =
            sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(loan)
    }

    async fn get_loans_by_consumer_id(&self, consumer_id: i64) -> StorageResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE consumer_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(consumer_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(loans)
    }

    async fn delete_loan(&self, id: i64) -> StorageResult<bool> {
        let result =
            sqlx::query("UPDATE loans SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL")
                .bind(Utc::now())
                .bind(id)
                .execute(&self.db_pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TransactionRepository for PgRepository {
    async fn begin(&self) -> StorageResult<Box<dyn UnitOfWork>> {
        let tx = self.db_pool.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to begin database transaction");
            e
        })?;

        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn get_transaction_by_id(&self, id: i64) -> StorageResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT id, consumer_id, loan_id, amount, description, created_at FROM transactions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(transaction)
    }

    async fn get_transactions_by_loan_id(&self, loan_id: i64) -> StorageResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, consumer_id, loan_id, amount, description, created_at
            FROM transactions
            WHERE loan_id = $1
            ORDER BY id
            "#,
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(transactions)
    }

    async fn get_transactions_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> StorageResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, consumer_id, loan_id, amount, description, created_at
            FROM transactions
            WHERE consumer_id = $1
            ORDER BY id
            "#,
        )
        .bind(consumer_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(transactions)
    }
}

/// Payment writes sharing one database transaction
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_transaction(&mut self, tx: NewTransaction) -> StorageResult<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (consumer_id, loan_id, amount, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, consumer_id, loan_id, amount, description, created_at
            "#,
        )
        .bind(tx.consumer_id)
        .bind(tx.loan_id)
        .bind(tx.amount)
        .bind(tx.description)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(transaction)
    }

    async fn update_loan(&mut self, update: LoanUpdate) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET principal_paid = $1, interest_paid = $2, status = $3,
                installment = $4, updated_at = $5
            WHERE id = $6
              AND deleted_at IS NULL
              AND status <> 'finish'
              AND installment = $7
              AND principal_paid = $8
            "#,
        )
        .bind(update.principal_paid)
        .bind(update.interest_paid)
        .bind(update.status)
        .bind(update.installment)
        .bind(Utc::now())
        .bind(update.id)
        .bind(update.expected_installment)
        .bind(update.expected_principal_paid)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "loan {} changed while the payment was in flight",
                update.id
            )));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let PgUnitOfWork { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        let PgUnitOfWork { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
