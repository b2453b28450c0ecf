//! Loan error types.

use rust_decimal::Decimal;
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::LoanId;

use super::status::LoanStatus;

/// Errors that can occur in the loan lifecycle.
#[derive(Debug, Error)]
pub enum LoanError {
    /// Loan not found.
    #[error("Loan not found: {0}")]
    NotFound(LoanId),

    /// The requested status change is not in the transition table.
    #[error("Cannot transition loan from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: LoanStatus,
        /// Requested status.
        to: LoanStatus,
    },

    /// Principal must be positive.
    #[error("Loan principal must be positive, got {0}")]
    InvalidPrincipal(Decimal),

    /// Interest rate cannot be negative.
    #[error("Interest rate cannot be negative, got {0}")]
    InvalidRate(Decimal),

    /// Total payable must be positive.
    #[error("Total payable must be positive, got {0}")]
    InvalidTotalPayable(Decimal),

    /// The disbursement posting failed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LoanError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "LOAN_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidPrincipal(_) => "INVALID_PRINCIPAL",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::InvalidTotalPayable(_) => "INVALID_TOTAL_PAYABLE",
            Self::Ledger(inner) => inner.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } => 422,
            Self::InvalidPrincipal(_) | Self::InvalidRate(_) | Self::InvalidTotalPayable(_) => 400,
            Self::Ledger(inner) => inner.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<LoanError> for AppError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::NotFound(_) => Self::NotFound(err.to_string()),
            LoanError::InvalidTransition { .. } => Self::BusinessRule(err.to_string()),
            LoanError::Ledger(inner) => inner.into(),
            LoanError::Database(msg) => Self::Database(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LoanError::NotFound(LoanId::new()).error_code(),
            "LOAN_NOT_FOUND"
        );
        assert_eq!(
            LoanError::InvalidTransition {
                from: LoanStatus::Closed,
                to: LoanStatus::Approved,
            }
            .error_code(),
            "INVALID_TRANSITION"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(LoanError::NotFound(LoanId::new()).http_status_code(), 404);
        assert_eq!(
            LoanError::InvalidTransition {
                from: LoanStatus::Closed,
                to: LoanStatus::Approved,
            }
            .http_status_code(),
            422
        );
        assert_eq!(
            LoanError::InvalidPrincipal(Decimal::ZERO).http_status_code(),
            400
        );
    }
}
