//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::{AccountId, IdempotencyKey};

/// Errors that can occur while posting or reading the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A journal entry needs at least two postings.
    #[error("Journal entry must have at least 2 postings")]
    InsufficientPostings,

    /// Debits and credits differ beyond tolerance.
    #[error("Journal entry is unbalanced. Debits ({debit}) must equal Credits ({credit})")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A posting row carries a negative amount.
    #[error("Posting amounts cannot be negative")]
    NegativeAmount,

    /// A posting row has neither a debit nor a credit.
    #[error("Posting must debit or credit a non-zero amount")]
    EmptyPosting,

    /// Referenced account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The idempotency key was already used by an earlier entry.
    #[error("Idempotency key already used: {0}")]
    DuplicateIdempotencyKey(IdempotencyKey),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientPostings => "INSUFFICIENT_POSTINGS",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::EmptyPosting => "EMPTY_POSTING",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateIdempotencyKey(_) => "DUPLICATE_IDEMPOTENCY_KEY",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InsufficientPostings
            | Self::UnbalancedEntry { .. }
            | Self::NegativeAmount
            | Self::EmptyPosting => 400,
            Self::AccountNotFound(_) => 404,
            Self::DuplicateIdempotencyKey(_) => 409,
            Self::Database(_) => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::DuplicateIdempotencyKey(_) => Self::Conflict(err.to_string()),
            LedgerError::Database(msg) => Self::Database(msg.clone()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_message_names_both_sums() {
        let err = LedgerError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is unbalanced. Debits (100.00) must equal Credits (50.00)"
        );
        assert_eq!(err.error_code(), "UNBALANCED_ENTRY");
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LedgerError::AccountNotFound(AccountId::new()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::DuplicateIdempotencyKey(IdempotencyKey::new()).http_status_code(),
            409
        );
        assert_eq!(LedgerError::Database(String::new()).http_status_code(), 500);
        assert_eq!(LedgerError::EmptyPosting.http_status_code(), 400);
    }

    #[test]
    fn test_app_error_conversion() {
        let app: AppError = LedgerError::InsufficientPostings.into();
        assert_eq!(app.status_code(), 400);

        let app: AppError = LedgerError::AccountNotFound(AccountId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = LedgerError::DuplicateIdempotencyKey(IdempotencyKey::new()).into();
        assert_eq!(app.status_code(), 409);
    }
}
