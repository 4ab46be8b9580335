//! Loan service layer - Business logic for loan origination and lifecycle

use std::sync::Arc;
use std::time::Duration;

use chrono::{Months, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CreditError;
use crate::loan::{generate_contract_number, CreateLoanRequest, Loan, NewLoan};
use crate::models::{fits_money_scale, Tenure, MAX_INTEREST_RATE, MONEY_SCALE};
use crate::repository::{ConsumerRepository, LoanRepository, MerchantRepository, Repositories};
use crate::services::{with_deadline, LimitLedger, LoanLocks};

/// Loan service for managing loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    consumers: Arc<dyn ConsumerRepository>,
    merchants: Arc<dyn MerchantRepository>,
    loans: Arc<dyn LoanRepository>,
    ledger: LimitLedger,
    locks: LoanLocks,
    deadline: Duration,
}

impl LoanService {
    /// Create a new loan service instance
    pub fn new(repos: &Repositories, locks: LoanLocks, deadline: Duration) -> Self {
        Self {
            consumers: repos.consumers.clone(),
            merchants: repos.merchants.clone(),
            loans: repos.loans.clone(),
            ledger: LimitLedger::new(repos),
            locks,
            deadline,
        }
    }

    /// Originate a loan against the consumer's limit for the requested tenure
    ///
    /// Checks run in order and stop at the first failure: consumer, merchant,
    /// limit for (consumer, tenure), then free limit. Does not take the
    /// payment lock, so a payment landing concurrently on the same line is
    /// not serialised against it.
    pub async fn create_loan(&self, request: CreateLoanRequest) -> Result<Loan, CreditError> {
        with_deadline(self.deadline, async {
            let tenure = Tenure::new(request.tenure)?;
            if request.loan_amount.is_sign_negative() || request.loan_amount.is_zero() {
                return Err(CreditError::InvalidAmount(format!(
                    "loan amount must be positive, got {}",
                    request.loan_amount
                )));
            }
            if !fits_money_scale(&request.loan_amount) {
                return Err(CreditError::InvalidAmount(format!(
                    "loan amount {} has more than {} decimal places",
                    request.loan_amount, MONEY_SCALE
                )));
            }
            if request.interest_rate.is_sign_negative()
                || request.interest_rate > MAX_INTEREST_RATE
                || !fits_money_scale(&request.interest_rate)
            {
                return Err(CreditError::InvalidAmount(format!(
                    "interest rate must be between 0 and {} with at most {} decimal places, got {}",
                    MAX_INTEREST_RATE, MONEY_SCALE, request.interest_rate
                )));
            }

            self.consumers
                .get_consumer_by_id(request.consumer_id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, consumer_id = %request.consumer_id, "Failed to load consumer");
                    e
                })?
                .ok_or(CreditError::ConsumerNotFound(request.consumer_id))?;

            self.merchants
                .get_merchant_by_id(request.merchant_id)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, merchant_id = %request.merchant_id, "Failed to load merchant");
                    e
                })?
                .ok_or(CreditError::MerchantNotFound(request.merchant_id))?;

            let available = self
                .ledger
                .remaining_limit(request.consumer_id, tenure.months())
                .await?;

            if request.loan_amount > available.remaining {
                tracing::warn!(
                    consumer_id = %request.consumer_id,
                    requested = %request.loan_amount,
                    remaining = %available.remaining,
                    "Loan exceeds remaining limit"
                );
                return Err(CreditError::InsufficientLimit {
                    requested: request.loan_amount,
                    remaining: available.remaining,
                });
            }

            let due_at = Utc::now()
                .checked_add_months(Months::new(tenure.months().unsigned_abs().into()))
                .ok_or(CreditError::InvalidTenure(tenure.months()))?;

            let loan = self
                .loans
                .create_loan(NewLoan {
                    consumer_id: request.consumer_id,
                    merchant_id: request.merchant_id,
                    consumer_limit_id: available.limit.id,
                    principal_amount: request.loan_amount,
                    interest_rate: request.interest_rate,
                    interest_amount: interest_for(request.loan_amount, request.interest_rate),
                    due_at,
                    contract_number: generate_contract_number(
                        request.consumer_id,
                        request.merchant_id,
                    ),
                    asset_name: request.asset_name,
                })
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, consumer_id = %request.consumer_id, "Failed to originate loan");
                    e
                })?;

            tracing::info!(
                loan_id = %loan.id,
                consumer_id = %loan.consumer_id,
                contract_number = %loan.contract_number,
                principal = %loan.principal_amount,
                "Loan originated"
            );

            Ok(loan)
        })
        .await
    }

    pub async fn get_loan_by_id(&self, id: i64) -> Result<Loan, CreditError> {
        with_deadline(self.deadline, async {
            self.loans
                .get_loan_by_id(id)
                .await?
                .ok_or(CreditError::LoanNotFound(id))
        })
        .await
    }

    pub async fn get_loans_by_consumer_id(&self, consumer_id: i64) -> Result<Vec<Loan>, CreditError> {
        with_deadline(self.deadline, async {
            Ok(self.loans.get_loans_by_consumer_id(consumer_id).await?)
        })
        .await
    }

    /// Soft delete a loan; waits for any payment in flight on it to finish
    pub async fn delete_loan_by_id(&self, id: i64) -> Result<(), CreditError> {
        with_deadline(self.deadline, async {
            let _guard = self.locks.acquire(id).await;
            if !self.loans.delete_loan(id).await? {
                return Err(CreditError::LoanNotFound(id));
            }
            tracing::info!(loan_id = %id, "Loan deleted");
            Ok(())
        })
        .await
    }
}

/// Interest charged over the life of a loan, rounded to the money scale
pub fn interest_for(principal: Decimal, rate: Decimal) -> Decimal {
    (principal * rate / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
