//! Committee vote tallying for large loans.
//!
//! Loans above the committee threshold sit in `CommitteeReview` until
//! enough committee members have voted. Two approvals release the loan
//! back to the normal approval path; two rejections kill it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::{LoanId, MemberId};

use crate::loan::LoanStatus;

/// Votes required to release or reject a loan under review.
pub const VOTE_QUORUM: usize = 2;

/// A committee member's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteDecision {
    /// In favor of granting the loan.
    Approve,
    /// Against granting the loan.
    Reject,
}

impl VoteDecision {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        }
    }
}

/// What the accumulated votes mean for the loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumOutcome {
    /// Not enough votes either way yet.
    Pending,
    /// Approval quorum reached: release to `Requested`.
    Release,
    /// Rejection quorum reached: move to `Rejected`.
    Reject,
}

impl QuorumOutcome {
    /// The loan status this outcome transitions to, if any.
    #[must_use]
    pub const fn next_status(self) -> Option<LoanStatus> {
        match self {
            Self::Pending => None,
            Self::Release => Some(LoanStatus::Requested),
            Self::Reject => Some(LoanStatus::Rejected),
        }
    }
}

/// Tallies a loan's votes and applies the quorum rule.
///
/// Approvals are counted first, so a simultaneous double quorum (possible
/// only if the quorum were 1) resolves in the member's favor.
#[must_use]
pub fn tally(votes: &[VoteDecision]) -> QuorumOutcome {
    let approvals = votes.iter().filter(|v| **v == VoteDecision::Approve).count();
    let rejections = votes.iter().filter(|v| **v == VoteDecision::Reject).count();

    if approvals >= VOTE_QUORUM {
        QuorumOutcome::Release
    } else if rejections >= VOTE_QUORUM {
        QuorumOutcome::Reject
    } else {
        QuorumOutcome::Pending
    }
}

/// Errors that can occur while casting votes.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Loan not found.
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    /// Only loans under committee review accept votes.
    #[error("Loan is not under committee review (status: {status:?})")]
    LoanNotInReview {
        /// The loan's actual status.
        status: LoanStatus,
    },

    /// Each committee member votes at most once per loan.
    #[error("Member {voter_id} has already voted on loan {loan_id}")]
    DuplicateVote {
        /// The loan being voted on.
        loan_id: LoanId,
        /// The member who already voted.
        voter_id: MemberId,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl GovernanceError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::LoanNotInReview { .. } => "LOAN_NOT_IN_REVIEW",
            Self::DuplicateVote { .. } => "DUPLICATE_VOTE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::LoanNotFound(_) => 404,
            Self::LoanNotInReview { .. } => 422,
            Self::DuplicateVote { .. } => 409,
            Self::Database(_) => 500,
        }
    }
}

impl From<GovernanceError> for AppError {
    fn from(err: GovernanceError) -> Self {
        match &err {
            GovernanceError::LoanNotFound(_) => Self::NotFound(err.to_string()),
            GovernanceError::LoanNotInReview { .. } => Self::BusinessRule(err.to_string()),
            GovernanceError::DuplicateVote { .. } => Self::Conflict(err.to_string()),
            GovernanceError::Database(msg) => Self::Database(msg.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteDecision::{Approve, Reject};

    #[test]
    fn test_no_votes_pending() {
        assert_eq!(tally(&[]), QuorumOutcome::Pending);
    }

    #[test]
    fn test_single_vote_pending() {
        assert_eq!(tally(&[Approve]), QuorumOutcome::Pending);
        assert_eq!(tally(&[Reject]), QuorumOutcome::Pending);
    }

    #[test]
    fn test_split_vote_pending() {
        assert_eq!(tally(&[Approve, Reject]), QuorumOutcome::Pending);
    }

    #[test]
    fn test_two_approvals_release() {
        let outcome = tally(&[Approve, Approve]);
        assert_eq!(outcome, QuorumOutcome::Release);
        assert_eq!(outcome.next_status(), Some(LoanStatus::Requested));
    }

    #[test]
    fn test_two_rejections_reject() {
        let outcome = tally(&[Reject, Approve, Reject]);
        assert_eq!(outcome, QuorumOutcome::Reject);
        assert_eq!(outcome.next_status(), Some(LoanStatus::Rejected));
    }

    #[test]
    fn test_approvals_win_over_rejections() {
        // Both quorums reached (larger committee): approvals counted first.
        assert_eq!(
            tally(&[Approve, Reject, Approve, Reject]),
            QuorumOutcome::Release
        );
    }

    #[test]
    fn test_pending_has_no_next_status() {
        assert_eq!(QuorumOutcome::Pending.next_status(), None);
    }

    #[test]
    fn test_release_target_is_a_legal_transition() {
        // The quorum outcome must land on edges the state machine allows.
        for outcome in [QuorumOutcome::Release, QuorumOutcome::Reject] {
            let next = outcome.next_status().unwrap();
            assert!(LoanStatus::CommitteeReview.can_transition(next));
        }
    }

    #[test]
    fn test_vote_strings() {
        assert_eq!(Approve.as_str(), "APPROVE");
        assert_eq!(Reject.as_str(), "REJECT");
    }
}
