//! Loan status state machine and application routing.
//!
//! The status graph is declared in one place and consulted by every
//! status-mutating entry point. Illegal transitions fail with
//! [`LoanError::InvalidTransition`] instead of being silently written.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hazina_shared::types::MemberId;

use super::error::LoanError;

/// Principal above which a new application is routed to committee review
/// before it can be approved.
pub const COMMITTEE_REVIEW_THRESHOLD: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Loan lifecycle status.
///
/// ```text
/// Requested ──────────────► Approved ──► Disbursed ──► Closed
///     │  ▲                      │
///     │  └── CommitteeReview ◄──┘ (large loans start here)
///     │           │
///     ▼           ▼
///  Rejected    Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Awaiting treasurer approval.
    Requested,
    /// Large loan awaiting committee votes.
    CommitteeReview,
    /// Approved, awaiting disbursement.
    Approved,
    /// Declined; terminal.
    Rejected,
    /// Funds released to the member.
    Disbursed,
    /// Fully repaid; terminal.
    Closed,
}

impl LoanStatus {
    /// Returns the stable string form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::CommitteeReview => "COMMITTEE_REVIEW",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Disbursed => "DISBURSED",
            Self::Closed => "CLOSED",
        }
    }

    /// Returns true for states no transition leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Closed)
    }

    /// The declared transition table.
    #[must_use]
    pub const fn can_transition(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Requested, Self::Approved | Self::Rejected)
                | (Self::CommitteeReview, Self::Requested | Self::Rejected)
                | (Self::Approved, Self::Disbursed)
                | (Self::Disbursed, Self::Closed)
        )
    }

    /// Validates a transition, returning the target status on success.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::InvalidTransition` if the edge is not in the
    /// declared table.
    pub fn transition(self, to: Self) -> Result<Self, LoanError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(LoanError::InvalidTransition { from: self, to })
        }
    }

    /// Initial status for a new application: principal above the
    /// committee threshold goes to review first.
    #[must_use]
    pub fn initial_for_principal(principal: Decimal) -> Self {
        if principal > COMMITTEE_REVIEW_THRESHOLD {
            Self::CommitteeReview
        } else {
            Self::Requested
        }
    }
}

/// A validated loan application.
///
/// `total_payable` is supplied by the caller and deliberately NOT
/// derived from `principal * (1 + rate)`; amortization schedules are a
/// product concern the core does not second-guess.
#[derive(Debug, Clone)]
pub struct LoanApplication {
    /// The applying member.
    pub member_id: MemberId,
    /// Requested principal.
    pub principal: Decimal,
    /// Interest rate as a fraction (0.05 = 5%).
    pub rate: Decimal,
    /// Total the member will repay over the loan's life.
    pub total_payable: Decimal,
    /// Routed initial status.
    pub status: LoanStatus,
}

impl LoanApplication {
    /// Validates the amounts and routes the application.
    ///
    /// # Errors
    ///
    /// Returns `LoanError` if the principal or total payable is not
    /// positive, or the rate is negative.
    pub fn new(
        member_id: MemberId,
        principal: Decimal,
        rate: Decimal,
        total_payable: Decimal,
    ) -> Result<Self, LoanError> {
        if principal <= Decimal::ZERO {
            return Err(LoanError::InvalidPrincipal(principal));
        }
        if rate < Decimal::ZERO {
            return Err(LoanError::InvalidRate(rate));
        }
        if total_payable <= Decimal::ZERO {
            return Err(LoanError::InvalidTotalPayable(total_payable));
        }

        Ok(Self {
            member_id,
            principal,
            rate,
            total_payable,
            status: LoanStatus::initial_for_principal(principal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    const ALL: [LoanStatus; 6] = [
        LoanStatus::Requested,
        LoanStatus::CommitteeReview,
        LoanStatus::Approved,
        LoanStatus::Rejected,
        LoanStatus::Disbursed,
        LoanStatus::Closed,
    ];

    #[rstest]
    #[case(LoanStatus::Requested, LoanStatus::Approved)]
    #[case(LoanStatus::Requested, LoanStatus::Rejected)]
    #[case(LoanStatus::CommitteeReview, LoanStatus::Requested)]
    #[case(LoanStatus::CommitteeReview, LoanStatus::Rejected)]
    #[case(LoanStatus::Approved, LoanStatus::Disbursed)]
    #[case(LoanStatus::Disbursed, LoanStatus::Closed)]
    fn test_legal_transitions(#[case] from: LoanStatus, #[case] to: LoanStatus) {
        assert!(from.can_transition(to));
        assert_eq!(from.transition(to).unwrap(), to);
    }

    #[rstest]
    #[case(LoanStatus::Closed, LoanStatus::Approved)]
    #[case(LoanStatus::Rejected, LoanStatus::Requested)]
    #[case(LoanStatus::Requested, LoanStatus::Disbursed)]
    #[case(LoanStatus::CommitteeReview, LoanStatus::Approved)]
    #[case(LoanStatus::Disbursed, LoanStatus::Disbursed)]
    fn test_illegal_transitions(#[case] from: LoanStatus, #[case] to: LoanStatus) {
        assert!(!from.can_transition(to));
        let err = from.transition(to).unwrap_err();
        assert!(matches!(err, LoanError::InvalidTransition { .. }));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL {
            if from.is_terminal() {
                for to in ALL {
                    assert!(
                        !from.can_transition(to),
                        "{from:?} is terminal but allows {to:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn test_threshold_routing() {
        assert_eq!(
            LoanStatus::initial_for_principal(dec!(50000)),
            LoanStatus::Requested
        );
        // Exactly at threshold stays on the fast path.
        assert_eq!(
            LoanStatus::initial_for_principal(dec!(100000)),
            LoanStatus::Requested
        );
        assert_eq!(
            LoanStatus::initial_for_principal(dec!(100000.01)),
            LoanStatus::CommitteeReview
        );
        assert_eq!(
            LoanStatus::initial_for_principal(dec!(150000)),
            LoanStatus::CommitteeReview
        );
    }

    #[test]
    fn test_application_validation() {
        let member = MemberId::new();

        let app = LoanApplication::new(member, dec!(50000), dec!(0.05), dec!(52500)).unwrap();
        assert_eq!(app.status, LoanStatus::Requested);
        assert_eq!(app.total_payable, dec!(52500));

        let err = LoanApplication::new(member, dec!(0), dec!(0.05), dec!(1)).unwrap_err();
        assert!(matches!(err, LoanError::InvalidPrincipal(_)));

        let err = LoanApplication::new(member, dec!(1000), dec!(-0.01), dec!(1000)).unwrap_err();
        assert!(matches!(err, LoanError::InvalidRate(_)));

        let err = LoanApplication::new(member, dec!(1000), dec!(0.05), dec!(0)).unwrap_err();
        assert!(matches!(err, LoanError::InvalidTotalPayable(_)));
    }

    #[test]
    fn test_total_payable_not_derived() {
        // 10_000 at 5% would derive 10_500; the caller said 11_000 and
        // the core takes their word for it.
        let app =
            LoanApplication::new(MemberId::new(), dec!(10000), dec!(0.05), dec!(11000)).unwrap();
        assert_eq!(app.total_payable, dec!(11000));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every status reaches at most the edges in the declared table;
        /// counting them pins the graph shape.
        #[test]
        fn prop_transition_table_is_closed(seed in 0usize..6) {
            let from = ALL[seed];
            let exits = ALL.iter().filter(|to| from.can_transition(**to)).count();
            let expected = match from {
                LoanStatus::Requested | LoanStatus::CommitteeReview => 2,
                LoanStatus::Approved | LoanStatus::Disbursed => 1,
                LoanStatus::Rejected | LoanStatus::Closed => 0,
            };
            prop_assert_eq!(exits, expected);
        }

        /// Routing is monotone in the principal: once a principal routes to
        /// committee review, every larger principal does too.
        #[test]
        fn prop_routing_monotone(cents_a in 1i64..30_000_000, cents_b in 1i64..30_000_000) {
            let (small, large) = if cents_a <= cents_b {
                (Decimal::new(cents_a, 2), Decimal::new(cents_b, 2))
            } else {
                (Decimal::new(cents_b, 2), Decimal::new(cents_a, 2))
            };

            if LoanStatus::initial_for_principal(small) == LoanStatus::CommitteeReview {
                prop_assert_eq!(
                    LoanStatus::initial_for_principal(large),
                    LoanStatus::CommitteeReview
                );
            }
        }
    }
}
