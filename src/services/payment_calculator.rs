//! Payment pricing
//!
//! Pure functions: a quote is derived from a loan snapshot and never written
//! anywhere, so quoting the same loan twice yields the same numbers.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::types::chrono::{DateTime, Utc};

use crate::error::CreditError;
use crate::loan::{Loan, PaymentType};
pub use crate::models::MONEY_SCALE;

/// Amount due for one payment against a loan
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PaymentQuote {
    pub loan_id: i64,
    pub contract_number: String,
    pub payment_type: PaymentType,
    pub tenure: i16,
    pub due_at: DateTime<Utc>,
    pub principal_amount: Decimal,
    pub principal_paid: Decimal,
    pub interest_amount: Decimal,
    pub interest_paid: Decimal,
    /// Installment number this payment brings the loan to
    pub installment: i32,
    pub remaining_principal: Decimal,
    pub remaining_interest: Decimal,
    pub total: Decimal,
}

/// Price a payment against `loan` drawn on a line of `tenure` months
///
/// Installments are sized by the full tenure, not the installments left.
/// Shares are truncated to the money scale so repeated installments never
/// overshoot the amount owed.
pub fn price(loan: &Loan, tenure: i16, payment_type: PaymentType) -> Result<PaymentQuote, CreditError> {
    if loan.status.is_terminal() {
        return Err(CreditError::LoanAlreadyFinished(loan.id));
    }
    if tenure <= 0 {
        return Err(CreditError::InvalidTenure(tenure));
    }

    let (remaining_principal, remaining_interest, installment) = match payment_type {
        PaymentType::Full => (
            loan.principal_amount - loan.principal_paid,
            loan.interest_amount - loan.interest_paid,
            loan.installment,
        ),
        PaymentType::Installment => {
            let months = Decimal::from(tenure);
            (
                share(loan.principal_amount, months),
                share(loan.interest_amount, months),
                loan.installment + 1,
            )
        }
    };

    Ok(PaymentQuote {
        loan_id: loan.id,
        contract_number: loan.contract_number.clone(),
        payment_type,
        tenure,
        due_at: loan.due_at,
        principal_amount: loan.principal_amount,
        principal_paid: loan.principal_paid,
        interest_amount: loan.interest_amount,
        interest_paid: loan.interest_paid,
        installment,
        remaining_principal,
        remaining_interest,
        total: remaining_principal + remaining_interest,
    })
}

fn share(amount: Decimal, months: Decimal) -> Decimal {
    (amount / months).round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::LoanStatus;
    use rust_decimal_macros::dec;

    fn loan(principal: Decimal, principal_paid: Decimal, interest: Decimal, interest_paid: Decimal) -> Loan {
        let now = Utc::now();
        Loan {
            id: 11,
            consumer_id: 1,
            merchant_id: 2,
            consumer_limit_id: 3,
            principal_amount: principal,
            principal_paid,
            interest_rate: dec!(10),
            interest_amount: interest,
            interest_paid,
            status: LoanStatus::OnGoing,
            due_at: now,
            installment: 0,
            contract_number: "1-Zx81Kd0PqA-2".to_string(),
            asset_name: "Laptop".to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_installment_quote_scenario() {
        let mut loan = loan(dec!(1200), dec!(100), dec!(120), dec!(10));
        loan.installment = 1;

        let quote = price(&loan, 12, PaymentType::Installment).unwrap();
        assert_eq!(quote.remaining_principal, dec!(100));
        assert_eq!(quote.remaining_interest, dec!(10));
        assert_eq!(quote.total, dec!(110));
        assert_eq!(quote.installment, 2);
        assert_eq!(quote.contract_number, "1-Zx81Kd0PqA-2");
    }

    #[test]
    fn test_full_quote_scenario() {
        let mut loan = loan(dec!(1000), dec!(500), dec!(100), dec!(50));
        loan.installment = 3;

        let quote = price(&loan, 6, PaymentType::Full).unwrap();
        assert_eq!(quote.remaining_principal, dec!(500));
        assert_eq!(quote.remaining_interest, dec!(50));
        assert_eq!(quote.total, dec!(550));
        assert_eq!(quote.installment, 3);
    }

    #[test]
    fn test_full_quote_ignores_tenure() {
        let loan = loan(dec!(750), dec!(125.5), dec!(75), dec!(12.55));
        for tenure in [1, 2, 3, 6] {
            let quote = price(&loan, tenure, PaymentType::Full).unwrap();
            assert_eq!(quote.remaining_principal, dec!(624.5));
            assert_eq!(quote.remaining_interest, dec!(62.45));
        }
    }

    #[test]
    fn test_installment_divides_by_full_tenure() {
        // already-paid amounts do not shrink the installment
        let loan = loan(dec!(600), dec!(300), dec!(60), dec!(30));
        for tenure in [1i16, 2, 3, 6] {
            let quote = price(&loan, tenure, PaymentType::Installment).unwrap();
            assert_eq!(quote.remaining_principal, dec!(600) / Decimal::from(tenure));
            assert_eq!(quote.remaining_interest, dec!(60) / Decimal::from(tenure));
        }
    }

    #[test]
    fn test_uneven_installments_truncate() {
        let loan = loan(dec!(1000), dec!(0), dec!(100), dec!(0));
        let quote = price(&loan, 3, PaymentType::Installment).unwrap();
        assert_eq!(quote.remaining_principal, dec!(333.3333));
        assert_eq!(quote.remaining_interest, dec!(33.3333));
        assert!(quote.remaining_principal * dec!(3) <= dec!(1000));
    }

    #[test]
    fn test_finished_loan_not_priced() {
        let mut loan = loan(dec!(1000), dec!(1000), dec!(100), dec!(100));
        loan.status = LoanStatus::Finish;
        assert!(matches!(
            price(&loan, 3, PaymentType::Installment),
            Err(CreditError::LoanAlreadyFinished(11))
        ));
    }

    #[test]
    fn test_non_positive_tenure_rejected() {
        let loan = loan(dec!(1000), dec!(0), dec!(100), dec!(0));
        assert!(matches!(
            price(&loan, 0, PaymentType::Installment),
            Err(CreditError::InvalidTenure(0))
        ));
    }

    #[test]
    fn test_quote_is_repeatable() {
        let loan = loan(dec!(900), dec!(0), dec!(90), dec!(0));
        assert_eq!(
            price(&loan, 3, PaymentType::Installment).unwrap(),
            price(&loan, 3, PaymentType::Installment).unwrap()
        );
    }
}
