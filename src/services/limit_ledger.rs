//! Limit ledger - how much of a credit line is still free

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::CreditError;
use crate::loan::{Loan, LoanStatus};
use crate::models::{RemainingLimit, Tenure};
use crate::repository::{ConsumerLimitRepository, LoanRepository, Repositories};

/// Read-only view over limits and the loans drawn against them
#[derive(Clone)]
pub struct LimitLedger {
    limits: Arc<dyn ConsumerLimitRepository>,
    loans: Arc<dyn LoanRepository>,
}

impl LimitLedger {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            limits: repos.limits.clone(),
            loans: repos.loans.clone(),
        }
    }

    /// Committed limit for (consumer, tenure) and the amount still free under it
    pub async fn remaining_limit(
        &self,
        consumer_id: i64,
        tenure_months: i16,
    ) -> Result<RemainingLimit, CreditError> {
        let tenure = Tenure::new(tenure_months)?;

        let limit = self
            .limits
            .get_limit_by_tenure_and_consumer_id(tenure, consumer_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, consumer_id = %consumer_id, "Failed to load consumer limit");
                e
            })?
            .ok_or(CreditError::LimitNotFound {
                consumer_id,
                tenure: tenure_months,
            })?;

        let loans = self
            .loans
            .get_loans_by_consumer_id(consumer_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, consumer_id = %consumer_id, "Failed to load consumer loans");
                e
            })?;
        let exposure = outstanding_exposure(&loans, limit.id);

        tracing::debug!(
            consumer_id = %consumer_id,
            limit_id = %limit.id,
            exposure = %exposure,
            "Computed outstanding exposure"
        );

        Ok(RemainingLimit {
            remaining: limit.limit_amount - exposure,
            exposure,
            limit,
        })
    }
}

/// Unpaid principal of the live, unfinished loans drawn on `limit_id`
pub fn outstanding_exposure(loans: &[Loan], limit_id: i64) -> Decimal {
    loans
        .iter()
        .filter(|loan| {
            loan.is_live() && loan.status != LoanStatus::Finish && loan.consumer_limit_id == limit_id
        })
        .map(Loan::outstanding_principal)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn loan(id: i64, limit_id: i64, principal: Decimal, paid: Decimal, status: LoanStatus) -> Loan {
        let now = Utc::now();
        Loan {
            id,
            consumer_id: 1,
            merchant_id: 2,
            consumer_limit_id: limit_id,
            principal_amount: principal,
            principal_paid: paid,
            interest_rate: dec!(10),
            interest_amount: principal / dec!(10),
            interest_paid: dec!(0),
            status,
            due_at: now,
            installment: 0,
            contract_number: format!("1-token{}-2", id),
            asset_name: "TV".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_exposure_sums_unpaid_principal() {
        let loans = vec![
            loan(1, 10, dec!(1000), dec!(250), LoanStatus::OnGoing),
            loan(2, 10, dec!(500), dec!(0), LoanStatus::Late),
        ];
        assert_eq!(outstanding_exposure(&loans, 10), dec!(1250));
    }

    #[test]
    fn test_exposure_skips_finished_and_other_lines() {
        let mut deleted = loan(4, 10, dec!(900), dec!(0), LoanStatus::OnGoing);
        deleted.deleted_at = Some(Utc::now());

        let loans = vec![
            loan(1, 10, dec!(1000), dec!(1000), LoanStatus::Finish),
            loan(2, 20, dec!(500), dec!(0), LoanStatus::OnGoing),
            loan(3, 10, dec!(300), dec!(100), LoanStatus::OnGoing),
            deleted,
        ];
        assert_eq!(outstanding_exposure(&loans, 10), dec!(200));
        assert_eq!(outstanding_exposure(&loans, 20), dec!(500));
    }

    #[test]
    fn test_exposure_of_no_loans_is_zero() {
        assert_eq!(outstanding_exposure(&[], 10), Decimal::ZERO);
    }
}
