//! Savings contribution rules.
//!
//! A deposit moves cash into the pool and credits the member's savings
//! account with the same amount. The month label is free text supplied
//! by the treasurer ("Jan-2025"), not a date the core interprets.

use rust_decimal::Decimal;
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::AccountId;

use crate::ledger::PostingInput;

/// Contribution status. Only one value is ever produced; the column
/// exists so a future pledge/arrears flow has somewhere to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributionStatus {
    /// Recorded and posted to the ledger.
    Confirmed,
}

impl ContributionStatus {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
        }
    }
}

/// Validates a deposit amount.
///
/// # Errors
///
/// Returns `ContributionError::InvalidAmount` if the amount is not positive.
pub fn validate_amount(amount: Decimal) -> Result<(), ContributionError> {
    if amount <= Decimal::ZERO {
        return Err(ContributionError::InvalidAmount(amount));
    }
    Ok(())
}

/// The double-entry shape of a deposit: debit the pool, credit the member.
#[must_use]
pub fn deposit_postings(
    pool_account: AccountId,
    member_account: AccountId,
    amount: Decimal,
) -> Vec<PostingInput> {
    vec![
        PostingInput::debit(pool_account, amount),
        PostingInput::credit(member_account, amount),
    ]
}

/// Errors that can occur while recording a contribution.
#[derive(Debug, Error)]
pub enum ContributionError {
    /// Deposit amount must be positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// The underlying ledger posting failed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ContributionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::Ledger(inner) => inner.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) => 400,
            Self::Ledger(inner) => inner.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<ContributionError> for AppError {
    fn from(err: ContributionError) -> Self {
        match err {
            ContributionError::Ledger(inner) => inner.into(),
            ContributionError::Database(msg) => Self::Database(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::validate_postings;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_accepted() {
        assert!(validate_amount(dec!(1000)).is_ok());
        assert!(validate_amount(dec!(0.01)).is_ok());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert!(matches!(
            validate_amount(dec!(0)),
            Err(ContributionError::InvalidAmount(_))
        ));
        assert!(matches!(
            validate_amount(dec!(-50)),
            Err(ContributionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_deposit_postings_balance() {
        let pool = AccountId::new();
        let member = AccountId::new();
        let postings = deposit_postings(pool, member, dec!(1000));

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].account_id, pool);
        assert_eq!(postings[0].debit, dec!(1000));
        assert_eq!(postings[1].account_id, member);
        assert_eq!(postings[1].credit, dec!(1000));
        assert!(validate_postings(&postings).is_ok());
    }

    #[test]
    fn test_status_string() {
        assert_eq!(ContributionStatus::Confirmed.as_str(), "CONFIRMED");
    }
}
