//! Payment processor - prices a payment and books it atomically
//!
//! A payment is one unit of work: the ledger entry and the loan update are
//! committed together or not at all. Payments on the same loan are
//! serialised through [`LoanLocks`]; the guarded loan update catches anything
//! that slips past the lock (another process, for instance).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::payment_calculator::{price, PaymentQuote};
use super::{with_deadline, LoanLocks};
use crate::error::{CreditError, StorageResult};
use crate::loan::{Loan, LoanStatus, LoanUpdate, PaymentType};
use crate::models::{NewTransaction, Transaction, TransactionRequest};
use crate::repository::{
    ConsumerLimitRepository, ConsumerRepository, LoanRepository, Repositories,
    TransactionRepository, UnitOfWork,
};

#[derive(Clone)]
pub struct PaymentProcessor {
    consumers: Arc<dyn ConsumerRepository>,
    limits: Arc<dyn ConsumerLimitRepository>,
    loans: Arc<dyn LoanRepository>,
    transactions: Arc<dyn TransactionRepository>,
    locks: LoanLocks,
    deadline: Duration,
}

impl PaymentProcessor {
    pub fn new(repos: &Repositories, locks: LoanLocks, deadline: Duration) -> Self {
        Self {
            consumers: repos.consumers.clone(),
            limits: repos.limits.clone(),
            loans: repos.loans.clone(),
            transactions: repos.transactions.clone(),
            locks,
            deadline,
        }
    }

    /// Quote what a payment would cost without booking it
    pub async fn get_remaining_payment(
        &self,
        request: TransactionRequest,
    ) -> Result<PaymentQuote, CreditError> {
        with_deadline(self.deadline, async {
            let payment_type: PaymentType = request.transaction_type.parse()?;
            let (loan, tenure) = self
                .load_payable_loan(request.consumer_id, request.loan_id)
                .await?;
            price(&loan, tenure, payment_type)
        })
        .await
    }

    /// Book a payment: insert the ledger entry and advance the loan
    pub async fn create_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<Transaction, CreditError> {
        with_deadline(self.deadline, async {
            let payment_type: PaymentType = request.transaction_type.parse()?;

            let _guard = self.locks.acquire(request.loan_id).await;

            let (loan, tenure) = self
                .load_payable_loan(request.consumer_id, request.loan_id)
                .await?;
            let quote = price(&loan, tenure, payment_type)?;
            let (status, installment) =
                next_loan_state(Utc::now(), loan.due_at, &quote, payment_type);

            let mut uow = self.transactions.begin().await?;
            match book_payment(uow.as_mut(), &loan, &quote, status, installment).await {
                Ok(transaction) => {
                    uow.commit().await?;
                    tracing::info!(
                        transaction_id = %transaction.id,
                        loan_id = %loan.id,
                        consumer_id = %loan.consumer_id,
                        amount = %transaction.amount,
                        status = %status.as_str(),
                        installment = %installment,
                        "Payment booked"
                    );
                    Ok(transaction)
                }
                Err(err) => {
                    tracing::error!(loan_id = %loan.id, error = %err, "Payment write failed, rolling back");
                    if let Err(rollback_err) = uow.rollback().await {
                        tracing::error!(loan_id = %loan.id, error = %rollback_err, "Rollback failed");
                    }
                    Err(err.into())
                }
            }
        })
        .await
    }

    pub async fn get_transaction_by_id(&self, id: i64) -> Result<Transaction, CreditError> {
        with_deadline(self.deadline, async {
            self.transactions
                .get_transaction_by_id(id)
                .await?
                .ok_or(CreditError::TransactionNotFound(id))
        })
        .await
    }

    pub async fn get_transactions_by_loan_id(
        &self,
        loan_id: i64,
    ) -> Result<Vec<Transaction>, CreditError> {
        with_deadline(self.deadline, async {
            Ok(self.transactions.get_transactions_by_loan_id(loan_id).await?)
        })
        .await
    }

    pub async fn get_transactions_by_consumer_id(
        &self,
        consumer_id: i64,
    ) -> Result<Vec<Transaction>, CreditError> {
        with_deadline(self.deadline, async {
            Ok(self
                .transactions
                .get_transactions_by_consumer_id(consumer_id)
                .await?)
        })
        .await
    }

    /// Fresh reads backing a payment, checked in order: consumer, loan,
    /// ownership, not finished, owning limit
    async fn load_payable_loan(
        &self,
        consumer_id: i64,
        loan_id: i64,
    ) -> Result<(Loan, i16), CreditError> {
        self.consumers
            .get_consumer_by_id(consumer_id)
            .await?
            .ok_or(CreditError::ConsumerNotFound(consumer_id))?;

        let loan = self
            .loans
            .get_loan_by_id(loan_id)
            .await?
            .ok_or(CreditError::LoanNotFound(loan_id))?;

        if loan.consumer_id != consumer_id {
            tracing::warn!(loan_id = %loan_id, consumer_id = %consumer_id, "Loan does not belong to consumer");
            return Err(CreditError::LoanOwnershipMismatch {
                loan_id,
                consumer_id,
            });
        }
        if loan.status.is_terminal() {
            return Err(CreditError::LoanAlreadyFinished(loan_id));
        }

        let limit = self
            .limits
            .get_limit_by_id(loan.consumer_limit_id)
            .await?
            .ok_or(CreditError::ConsumerLimitNotFound(loan.consumer_limit_id))?;

        Ok((loan, limit.tenure.months()))
    }
}

/// Loan status and installment counter after a payment
///
/// Past the due date the loan is `late`, otherwise `on_going`. A full
/// payment, or reaching the last installment, finishes the loan and clamps
/// the counter to the tenure.
pub fn next_loan_state(
    now: DateTime<Utc>,
    due_at: DateTime<Utc>,
    quote: &PaymentQuote,
    payment_type: PaymentType,
) -> (LoanStatus, i32) {
    let tenure = i32::from(quote.tenure);
    if payment_type == PaymentType::Full || quote.installment >= tenure {
        return (LoanStatus::Finish, tenure);
    }

    let status = if now > due_at {
        LoanStatus::Late
    } else {
        LoanStatus::OnGoing
    };
    (status, quote.installment)
}

async fn book_payment(
    uow: &mut dyn UnitOfWork,
    loan: &Loan,
    quote: &PaymentQuote,
    status: LoanStatus,
    installment: i32,
) -> StorageResult<Transaction> {
    let transaction = uow
        .insert_transaction(NewTransaction::payment(
            loan.consumer_id,
            loan.id,
            quote.total,
            &loan.contract_number,
        ))
        .await?;

    uow.update_loan(LoanUpdate {
        id: loan.id,
        principal_paid: loan.principal_paid + quote.remaining_principal,
        interest_paid: loan.interest_paid + quote.remaining_interest,
        status,
        installment,
        expected_installment: loan.installment,
        expected_principal_paid: loan.principal_paid,
    })
    .await?;

    Ok(transaction)
}
