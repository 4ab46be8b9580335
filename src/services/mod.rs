//! Business logic services for the credit engine

use std::future::Future;
use std::time::Duration;

use crate::error::CreditError;

mod consumer_limit;
mod limit_ledger;
mod loan_locks;
pub mod payment_calculator;
mod payment_processor;
mod registry;

pub use consumer_limit::ConsumerLimitService;
pub use limit_ledger::{outstanding_exposure, LimitLedger};
pub use loan_locks::LoanLocks;
pub use payment_calculator::{price, PaymentQuote};
pub use payment_processor::{next_loan_state, PaymentProcessor};
pub use registry::RegistryService;

// Note: LoanService is kept at crate root next to the loan model

/// Run a usecase under the per-call deadline
///
/// Dropping the inner future on expiry aborts whatever storage call was in
/// flight; an open sqlx transaction rolls back when it is dropped.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, operation: F) -> Result<T, CreditError>
where
    F: Future<Output = Result<T, CreditError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(deadline_ms = %deadline.as_millis(), "Operation exceeded its deadline");
            Err(CreditError::Timeout(deadline))
        }
    }
}
