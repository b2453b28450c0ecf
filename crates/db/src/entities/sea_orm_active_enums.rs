//! Postgres enum mappings.
//!
//! These mirror the domain enums in `hazina-core`; the `From` impls keep
//! the two families in lockstep so repositories never match on raw
//! strings.

use hazina_core::contribution::ContributionStatus as CoreContributionStatus;
use hazina_core::governance::VoteDecision as CoreVoteDecision;
use hazina_core::ledger::{AccountKind, SystemAccountType};
use hazina_core::loan::LoanStatus as CoreLoanStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger account type.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// The cooperative's cash pool.
    #[sea_orm(string_value = "SACCO_POOL")]
    SaccoPool,
    /// Outstanding loan principal.
    #[sea_orm(string_value = "LOAN_RECEIVABLE")]
    LoanReceivable,
    /// Interest income.
    #[sea_orm(string_value = "INCOME")]
    Income,
    /// Operating expenses.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    /// One member's savings.
    #[sea_orm(string_value = "MEMBER_SAVINGS")]
    MemberSavings,
}

impl AccountType {
    /// The balance sign convention for this account type.
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::SaccoPool | Self::LoanReceivable | Self::Expense => AccountKind::DebitNormal,
            Self::Income | Self::MemberSavings => AccountKind::CreditNormal,
        }
    }
}

impl From<SystemAccountType> for AccountType {
    fn from(value: SystemAccountType) -> Self {
        match value {
            SystemAccountType::SaccoPool => Self::SaccoPool,
            SystemAccountType::LoanReceivable => Self::LoanReceivable,
            SystemAccountType::Income => Self::Income,
            SystemAccountType::Expense => Self::Expense,
        }
    }
}

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "loan_status")]
pub enum LoanStatus {
    /// Awaiting treasurer approval.
    #[sea_orm(string_value = "REQUESTED")]
    Requested,
    /// Awaiting committee votes.
    #[sea_orm(string_value = "COMMITTEE_REVIEW")]
    CommitteeReview,
    /// Approved, awaiting disbursement.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Declined.
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    /// Funds released.
    #[sea_orm(string_value = "DISBURSED")]
    Disbursed,
    /// Fully repaid.
    #[sea_orm(string_value = "CLOSED")]
    Closed,
}

impl From<CoreLoanStatus> for LoanStatus {
    fn from(value: CoreLoanStatus) -> Self {
        match value {
            CoreLoanStatus::Requested => Self::Requested,
            CoreLoanStatus::CommitteeReview => Self::CommitteeReview,
            CoreLoanStatus::Approved => Self::Approved,
            CoreLoanStatus::Rejected => Self::Rejected,
            CoreLoanStatus::Disbursed => Self::Disbursed,
            CoreLoanStatus::Closed => Self::Closed,
        }
    }
}

impl From<LoanStatus> for CoreLoanStatus {
    fn from(value: LoanStatus) -> Self {
        match value {
            LoanStatus::Requested => Self::Requested,
            LoanStatus::CommitteeReview => Self::CommitteeReview,
            LoanStatus::Approved => Self::Approved,
            LoanStatus::Rejected => Self::Rejected,
            LoanStatus::Disbursed => Self::Disbursed,
            LoanStatus::Closed => Self::Closed,
        }
    }
}

/// Committee vote decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vote_decision")]
pub enum VoteDecision {
    /// In favor.
    #[sea_orm(string_value = "APPROVE")]
    Approve,
    /// Against.
    #[sea_orm(string_value = "REJECT")]
    Reject,
}

impl From<CoreVoteDecision> for VoteDecision {
    fn from(value: CoreVoteDecision) -> Self {
        match value {
            CoreVoteDecision::Approve => Self::Approve,
            CoreVoteDecision::Reject => Self::Reject,
        }
    }
}

impl From<VoteDecision> for CoreVoteDecision {
    fn from(value: VoteDecision) -> Self {
        match value {
            VoteDecision::Approve => Self::Approve,
            VoteDecision::Reject => Self::Reject,
        }
    }
}

/// Contribution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "contribution_status")]
pub enum ContributionStatus {
    /// Recorded and posted.
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
}

impl From<CoreContributionStatus> for ContributionStatus {
    fn from(value: CoreContributionStatus) -> Self {
        match value {
            CoreContributionStatus::Confirmed => Self::Confirmed,
        }
    }
}
