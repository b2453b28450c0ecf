//! Journal entry validation.
//!
//! Every posting passes through [`validate_postings`] before any row is
//! written. The balance invariant is the single most important check in
//! the system: within one journal entry the debits must equal the
//! credits, to within [`BALANCE_TOLERANCE`] currency units.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::PostingInput;

/// Maximum tolerated difference between total debits and total credits.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3); // 0.001

/// Summed debit/credit totals of a validated entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    /// Total debit amount across all postings.
    pub debit: Decimal,
    /// Total credit amount across all postings.
    pub credit: Decimal,
}

/// Validates a posting set and returns its totals.
///
/// Checks, in order:
/// 1. at least two postings;
/// 2. no negative amounts;
/// 3. every row moves a non-zero amount on at least one side;
/// 4. total debits equal total credits within [`BALANCE_TOLERANCE`].
///
/// # Errors
///
/// Returns `LedgerError` describing the first violated rule.
pub fn validate_postings(postings: &[PostingInput]) -> Result<EntryTotals, LedgerError> {
    if postings.len() < 2 {
        return Err(LedgerError::InsufficientPostings);
    }

    for posting in postings {
        if posting.debit < Decimal::ZERO || posting.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        if posting.debit.is_zero() && posting.credit.is_zero() {
            return Err(LedgerError::EmptyPosting);
        }
    }

    let debit: Decimal = postings.iter().map(|p| p.debit).sum();
    let credit: Decimal = postings.iter().map(|p| p.credit).sum();

    if (debit - credit).abs() > BALANCE_TOLERANCE {
        return Err(LedgerError::UnbalancedEntry { debit, credit });
    }

    Ok(EntryTotals { debit, credit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hazina_shared::types::AccountId;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn debit(amount: Decimal) -> PostingInput {
        PostingInput::debit(AccountId::new(), amount)
    }

    fn credit(amount: Decimal) -> PostingInput {
        PostingInput::credit(AccountId::new(), amount)
    }

    #[test]
    fn test_tolerance_constant_value() {
        assert_eq!(BALANCE_TOLERANCE, dec!(0.001));
    }

    #[test]
    fn test_balanced_pair_accepted() {
        let totals = validate_postings(&[debit(dec!(1000)), credit(dec!(1000))]).unwrap();
        assert_eq!(totals.debit, dec!(1000));
        assert_eq!(totals.credit, dec!(1000));
    }

    #[test]
    fn test_fan_out_accepted() {
        // Dividend shape: one debit, many credits.
        let result = validate_postings(&[
            debit(dec!(1000)),
            credit(dec!(300)),
            credit(dec!(700)),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_unbalanced_rejected_with_both_sums() {
        let err = validate_postings(&[debit(dec!(100)), credit(dec!(50))]).unwrap_err();
        match err {
            LedgerError::UnbalancedEntry { debit, credit } => {
                assert_eq!(debit, dec!(100));
                assert_eq!(credit, dec!(50));
            }
            other => panic!("expected UnbalancedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatch_within_tolerance_accepted() {
        let result = validate_postings(&[debit(dec!(100.0005)), credit(dec!(100))]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_mismatch_just_beyond_tolerance_rejected() {
        let err = validate_postings(&[debit(dec!(100.0011)), credit(dec!(100))]).unwrap_err();
        assert!(matches!(err, LedgerError::UnbalancedEntry { .. }));
    }

    #[test]
    fn test_single_posting_rejected() {
        let err = validate_postings(&[debit(dec!(100))]).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientPostings));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = validate_postings(&[debit(dec!(-100)), credit(dec!(-100))]).unwrap_err();
        assert!(matches!(err, LedgerError::NegativeAmount));
    }

    #[test]
    fn test_empty_row_rejected() {
        let err = validate_postings(&[
            debit(dec!(100)),
            credit(dec!(100)),
            PostingInput::debit(AccountId::new(), Decimal::ZERO),
        ])
        .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyPosting));
    }

    // Strategy: non-negative amounts with 2 decimal places, like real postings.
    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A mirrored posting set (every debit matched by an equal credit)
        /// is always accepted, and its totals equal the generated sum.
        #[test]
        fn prop_mirrored_sets_always_balance(
            amounts in prop::collection::vec(amount_strategy(), 1..10),
        ) {
            prop_assume!(amounts.iter().all(|a| !a.is_zero()));

            let mut postings = Vec::new();
            for amount in &amounts {
                postings.push(debit(*amount));
                postings.push(credit(*amount));
            }

            let totals = validate_postings(&postings).unwrap();
            let expected: Decimal = amounts.iter().copied().sum();
            prop_assert_eq!(totals.debit, expected);
            prop_assert_eq!(totals.credit, expected);
        }

        /// Skewing one side of a balanced set beyond tolerance is always rejected.
        #[test]
        fn prop_skewed_sets_always_rejected(
            amount in amount_strategy(),
            skew_cents in 1i64..1_000_000,
        ) {
            prop_assume!(!amount.is_zero());
            let skew = Decimal::new(skew_cents, 2); // >= 0.01 > tolerance

            let result = validate_postings(&[debit(amount + skew), credit(amount)]);
            let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedEntry { .. }));
            prop_assert!(is_unbalanced);
        }

        /// Validation never accepts a set whose reported totals differ beyond
        /// tolerance: accepted totals are trustworthy.
        #[test]
        fn prop_accepted_totals_within_tolerance(
            debits in prop::collection::vec(amount_strategy(), 1..6),
            credits in prop::collection::vec(amount_strategy(), 1..6),
        ) {
            prop_assume!(debits.iter().all(|a| !a.is_zero()));
            prop_assume!(credits.iter().all(|a| !a.is_zero()));

            let mut postings: Vec<PostingInput> =
                debits.iter().map(|a| debit(*a)).collect();
            postings.extend(credits.iter().map(|a| credit(*a)));

            if let Ok(totals) = validate_postings(&postings) {
                prop_assert!((totals.debit - totals.credit).abs() <= BALANCE_TOLERANCE);
            }
        }
    }
}
