//! Principal-first repayment allocation.
//!
//! Every repayment is split into a principal portion and an interest
//! portion. Principal is recovered first: until the cumulative repaid
//! amount covers the principal, repayments pay principal down and only
//! the excess counts as interest. Once principal is fully recovered,
//! everything is interest.

use rust_decimal::Decimal;
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::LoanId;

use crate::loan::LoanStatus;

/// The split of one repayment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentAllocation {
    /// Portion reducing the outstanding principal.
    pub principal_portion: Decimal,
    /// Portion recognized as interest income.
    pub interest_portion: Decimal,
}

/// Splits a repayment amount, principal first.
///
/// `prior_repaid` is the sum of all earlier repayments on the loan.
#[must_use]
pub fn allocate(principal: Decimal, prior_repaid: Decimal, amount: Decimal) -> RepaymentAllocation {
    if prior_repaid < principal {
        let remaining_principal = principal - prior_repaid;
        let principal_portion = amount.min(remaining_principal);
        RepaymentAllocation {
            principal_portion,
            interest_portion: amount - principal_portion,
        }
    } else {
        RepaymentAllocation {
            principal_portion: Decimal::ZERO,
            interest_portion: amount,
        }
    }
}

/// Whether this repayment settles the loan.
///
/// Overpayment is accepted: the excess became interest in [`allocate`]
/// and the loan still closes.
#[must_use]
pub fn closes_loan(prior_repaid: Decimal, amount: Decimal, total_payable: Decimal) -> bool {
    prior_repaid + amount >= total_payable
}

/// Errors that can occur while recording a repayment.
#[derive(Debug, Error)]
pub enum RepaymentError {
    /// Loan not found.
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    /// Only disbursed loans can be repaid.
    #[error("Can only repay disbursed loans (status: {status:?})")]
    LoanNotDisbursed {
        /// The loan's actual status.
        status: LoanStatus,
    },

    /// Repayment amount must be positive.
    #[error("Repayment amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// The repayment posting failed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl RepaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::LoanNotDisbursed { .. } => "LOAN_NOT_DISBURSED",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Ledger(inner) => inner.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::LoanNotFound(_) => 404,
            Self::LoanNotDisbursed { .. } => 422,
            Self::InvalidAmount(_) => 400,
            Self::Ledger(inner) => inner.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<RepaymentError> for AppError {
    fn from(err: RepaymentError) -> Self {
        match err {
            RepaymentError::LoanNotFound(_) => Self::NotFound(err.to_string()),
            RepaymentError::LoanNotDisbursed { .. } => Self::BusinessRule(err.to_string()),
            RepaymentError::Ledger(inner) => inner.into(),
            RepaymentError::Database(msg) => Self::Database(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_first_repayment_all_principal() {
        let split = allocate(dec!(10000), dec!(0), dec!(4000));
        assert_eq!(split.principal_portion, dec!(4000));
        assert_eq!(split.interest_portion, dec!(0));
    }

    #[test]
    fn test_final_repayment_spills_into_interest() {
        // Walkthrough: principal 10_000, total payable 10_500, 4_000 already
        // repaid. 6_500 covers the remaining 6_000 of principal and 500 of
        // interest, and closes the loan.
        let split = allocate(dec!(10000), dec!(4000), dec!(6500));
        assert_eq!(split.principal_portion, dec!(6000));
        assert_eq!(split.interest_portion, dec!(500));
        assert!(closes_loan(dec!(4000), dec!(6500), dec!(10500)));
    }

    #[test]
    fn test_partial_repayment_does_not_close() {
        assert!(!closes_loan(dec!(0), dec!(4000), dec!(10500)));
    }

    #[test]
    fn test_principal_recovered_all_interest() {
        let split = allocate(dec!(10000), dec!(10000), dec!(300));
        assert_eq!(split.principal_portion, dec!(0));
        assert_eq!(split.interest_portion, dec!(300));
    }

    #[test]
    fn test_overpayment_accepted() {
        // 12_000 against 6_000 remaining principal: excess is interest.
        let split = allocate(dec!(10000), dec!(4000), dec!(12000));
        assert_eq!(split.principal_portion, dec!(6000));
        assert_eq!(split.interest_portion, dec!(6000));
        assert!(closes_loan(dec!(4000), dec!(12000), dec!(10500)));
    }

    #[test]
    fn test_exact_close() {
        assert!(closes_loan(dec!(10000), dec!(500), dec!(10500)));
        assert!(!closes_loan(dec!(10000), dec!(499.99), dec!(10500)));
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..5_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// The two portions always sum to the repayment amount.
        #[test]
        fn prop_portions_sum_to_amount(
            principal in money(),
            prior in money(),
            amount in money(),
        ) {
            let split = allocate(principal, prior, amount);
            prop_assert_eq!(split.principal_portion + split.interest_portion, amount);
        }

        /// Neither portion is ever negative.
        #[test]
        fn prop_portions_non_negative(
            principal in money(),
            prior in money(),
            amount in money(),
        ) {
            let split = allocate(principal, prior, amount);
            prop_assert!(split.principal_portion >= Decimal::ZERO);
            prop_assert!(split.interest_portion >= Decimal::ZERO);
        }

        /// The principal portion never exceeds the remaining principal.
        #[test]
        fn prop_principal_portion_bounded(
            principal in money(),
            prior in money(),
            amount in money(),
        ) {
            let split = allocate(principal, prior, amount);
            let remaining = (principal - prior).max(Decimal::ZERO);
            prop_assert!(split.principal_portion <= remaining);
        }

        /// Principal-first: interest only appears once principal is exhausted.
        #[test]
        fn prop_interest_only_after_principal(
            principal in money(),
            prior in money(),
            amount in money(),
        ) {
            let split = allocate(principal, prior, amount);
            if split.interest_portion > Decimal::ZERO {
                prop_assert_eq!(
                    prior + split.principal_portion,
                    principal.max(prior),
                    "interest paid while principal outstanding"
                );
            }
        }
    }
}
