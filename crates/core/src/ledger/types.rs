//! Ledger domain types for journal entry creation and balance reads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hazina_shared::types::{AccountId, IdempotencyKey, MemberId};

/// System (singleton) account types.
///
/// Exactly one account of each system type exists, created lazily on
/// first use. Member savings accounts are per-member and are not listed
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemAccountType {
    /// The cooperative's cash pool.
    SaccoPool,
    /// Outstanding loan principal owed to the cooperative.
    LoanReceivable,
    /// Interest income earned on loans.
    Income,
    /// Operating expenses.
    Expense,
}

impl SystemAccountType {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SaccoPool => "SACCO_POOL",
            Self::LoanReceivable => "LOAN_RECEIVABLE",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// Returns the balance sign convention for this account type.
    #[must_use]
    pub const fn kind(self) -> AccountKind {
        match self {
            Self::SaccoPool | Self::LoanReceivable | Self::Expense => AccountKind::DebitNormal,
            Self::Income => AccountKind::CreditNormal,
        }
    }
}

/// Balance sign convention for an account.
///
/// Pool, loan-receivable, and expense accounts are debit-normal: their
/// holdings grow when debited. Member savings and income accounts are
/// credit-normal: the amount owed to the party grows when credited.
/// Mixing conventions across reads is the classic sign-flip bug, so
/// every read goes through [`AccountKind::balance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Balance = debits - credits.
    DebitNormal,
    /// Balance = credits - debits.
    CreditNormal,
}

impl AccountKind {
    /// The convention for a member savings account.
    pub const MEMBER_SAVINGS: Self = Self::CreditNormal;

    /// Computes the balance from posting totals under this convention.
    #[must_use]
    pub fn balance(self, debit_total: Decimal, credit_total: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit_total - credit_total,
            Self::CreditNormal => credit_total - debit_total,
        }
    }
}

/// Aggregated posting totals for one account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountTotals {
    /// Sum of all debit amounts posted to the account.
    pub debit: Decimal,
    /// Sum of all credit amounts posted to the account.
    pub credit: Decimal,
}

impl AccountTotals {
    /// Computes the balance under the given sign convention.
    #[must_use]
    pub fn balance(&self, kind: AccountKind) -> Decimal {
        kind.balance(self.debit, self.credit)
    }
}

/// Business-object type a journal entry refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// A monthly savings contribution.
    Contribution,
    /// A loan disbursement.
    Loan,
    /// A loan repayment installment.
    LoanRepayment,
    /// A dividend distribution run.
    Dividend,
}

impl ReferenceType {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contribution => "contribution",
            Self::Loan => "loan",
            Self::LoanRepayment => "loan_repayment",
            Self::Dividend => "dividend",
        }
    }
}

/// One row of a journal entry: an account and a one-sided amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero if this is a credit row).
    pub debit: Decimal,
    /// Credit amount (zero if this is a debit row).
    pub credit: Decimal,
}

impl PostingInput {
    /// A debit row.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    /// A credit row.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
        }
    }
}

/// Input for posting one balanced journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    /// What kind of business object this entry records.
    pub reference_type: ReferenceType,
    /// Id of the originating business object.
    pub reference_id: Uuid,
    /// Free-text description shown on statements.
    pub description: String,
    /// The member or admin who triggered the posting.
    pub created_by: MemberId,
    /// Optional client-supplied deduplication key.
    pub idempotency_key: Option<IdempotencyKey>,
    /// The posting rows; must balance within tolerance.
    pub postings: Vec<PostingInput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_system_account_strings() {
        assert_eq!(SystemAccountType::SaccoPool.as_str(), "SACCO_POOL");
        assert_eq!(SystemAccountType::LoanReceivable.as_str(), "LOAN_RECEIVABLE");
        assert_eq!(SystemAccountType::Income.as_str(), "INCOME");
        assert_eq!(SystemAccountType::Expense.as_str(), "EXPENSE");
    }

    #[test]
    fn test_sign_conventions_per_type() {
        assert_eq!(SystemAccountType::SaccoPool.kind(), AccountKind::DebitNormal);
        assert_eq!(
            SystemAccountType::LoanReceivable.kind(),
            AccountKind::DebitNormal
        );
        assert_eq!(SystemAccountType::Expense.kind(), AccountKind::DebitNormal);
        assert_eq!(SystemAccountType::Income.kind(), AccountKind::CreditNormal);
        assert_eq!(AccountKind::MEMBER_SAVINGS, AccountKind::CreditNormal);
    }

    #[test]
    fn test_debit_normal_balance() {
        // Pool: deposits debit it, disbursements credit it.
        let totals = AccountTotals {
            debit: dec!(5000),
            credit: dec!(2000),
        };
        assert_eq!(totals.balance(AccountKind::DebitNormal), dec!(3000));
    }

    #[test]
    fn test_credit_normal_balance() {
        // Member savings: deposits credit it.
        let totals = AccountTotals {
            debit: dec!(200),
            credit: dec!(1200),
        };
        assert_eq!(totals.balance(AccountKind::CreditNormal), dec!(1000));
    }

    #[test]
    fn test_one_sided_constructors() {
        let account = AccountId::new();
        let d = PostingInput::debit(account, dec!(100));
        assert_eq!(d.debit, dec!(100));
        assert_eq!(d.credit, Decimal::ZERO);

        let c = PostingInput::credit(account, dec!(100));
        assert_eq!(c.debit, Decimal::ZERO);
        assert_eq!(c.credit, dec!(100));
    }

    #[test]
    fn test_reference_type_strings() {
        assert_eq!(ReferenceType::Contribution.as_str(), "contribution");
        assert_eq!(ReferenceType::Loan.as_str(), "loan");
        assert_eq!(ReferenceType::LoanRepayment.as_str(), "loan_repayment");
        assert_eq!(ReferenceType::Dividend.as_str(), "dividend");
    }
}
