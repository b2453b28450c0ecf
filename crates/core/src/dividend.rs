//! Pro-rata dividend apportionment.
//!
//! Accumulated interest income is distributed to members in proportion
//! to their savings balances. Rounding each share independently can make
//! the credited total drift from the distributed income, so shares are
//! floored to whole cents and the residual is handed out by the
//! largest-remainder method. The resulting fan-out entry sums exactly to
//! the distributed income for any member count.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use hazina_shared::error::AppError;
use hazina_shared::types::{AccountId, MemberId};

/// One member's savings position entering a distribution.
#[derive(Debug, Clone)]
pub struct MemberStake {
    /// The member owning the savings account.
    pub member_id: MemberId,
    /// The member's savings account.
    pub account_id: AccountId,
    /// Current savings balance (credits minus debits).
    pub balance: Decimal,
}

/// One member's computed slice of a distribution.
#[derive(Debug, Clone)]
pub struct DividendShare {
    /// The member receiving the dividend.
    pub member_id: MemberId,
    /// The savings account to credit.
    pub account_id: AccountId,
    /// The balance the share was computed from.
    pub balance: Decimal,
    /// Exact proportional share of total savings (0 when total is 0).
    pub share: Decimal,
    /// Amount to credit, in whole cents except at most one dust carrier.
    pub amount: Decimal,
}

const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

/// Apportions `total_income` across stakes by savings balance.
///
/// Members with a non-positive balance receive nothing and do not count
/// toward the proportional base. The returned amounts sum to exactly
/// `total_income` whenever at least one stake has a positive balance;
/// with no positive stakes every amount is zero.
#[must_use]
pub fn apportion(total_income: Decimal, stakes: &[MemberStake]) -> Vec<DividendShare> {
    let total_savings: Decimal = stakes
        .iter()
        .map(|s| s.balance)
        .filter(|b| *b > Decimal::ZERO)
        .sum();

    if total_savings <= Decimal::ZERO || total_income <= Decimal::ZERO {
        return stakes
            .iter()
            .map(|s| DividendShare {
                member_id: s.member_id,
                account_id: s.account_id,
                balance: s.balance,
                share: Decimal::ZERO,
                amount: Decimal::ZERO,
            })
            .collect();
    }

    let mut shares: Vec<DividendShare> = Vec::with_capacity(stakes.len());
    let mut remainders: Vec<(usize, Decimal)> = Vec::with_capacity(stakes.len());

    for (idx, stake) in stakes.iter().enumerate() {
        let (share, amount, remainder) = if stake.balance > Decimal::ZERO {
            let share = stake.balance / total_savings;
            let exact = stake.balance * total_income / total_savings;
            let floored = exact.trunc_with_scale(2);
            (share, floored, exact - floored)
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

        shares.push(DividendShare {
            member_id: stake.member_id,
            account_id: stake.account_id,
            balance: stake.balance,
            share,
            amount,
        });
        if stake.balance > Decimal::ZERO {
            remainders.push((idx, remainder));
        }
    }

    let floored_total: Decimal = shares.iter().map(|s| s.amount).sum();
    let residual = total_income - floored_total;
    if residual <= Decimal::ZERO {
        return shares;
    }

    // Largest remainder first; ties broken by larger balance, then
    // account id for determinism.
    remainders.sort_by(|(a, ra), (b, rb)| {
        rb.cmp(ra)
            .then_with(|| shares[*b].balance.cmp(&shares[*a].balance))
            .then_with(|| shares[*a].account_id.0.cmp(&shares[*b].account_id.0))
    });

    let whole_cents = (residual / CENT).trunc().to_usize().unwrap_or(0);
    let cents_to_assign = whole_cents.min(remainders.len());
    for (idx, _) in remainders.iter().take(cents_to_assign) {
        shares[*idx].amount += CENT;
    }

    // Sub-cent dust (only when income itself is not cent-aligned) goes to
    // the largest remainder so the entry still sums exactly.
    let assigned: Decimal = shares.iter().map(|s| s.amount).sum();
    let dust = total_income - assigned;
    if dust > Decimal::ZERO
        && let Some((idx, _)) = remainders.first()
    {
        shares[*idx].amount += dust;
    }

    shares
}

/// Errors that can occur while distributing dividends.
#[derive(Debug, Error)]
pub enum DividendError {
    /// There is no positive income to distribute.
    #[error("No income available to distribute (balance: {0})")]
    NothingToDistribute(Decimal),

    /// The fan-out posting failed.
    #[error(transparent)]
    Ledger(#[from] crate::ledger::LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl DividendError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NothingToDistribute(_) => "NOTHING_TO_DISTRIBUTE",
            Self::Ledger(inner) => inner.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NothingToDistribute(_) => 400,
            Self::Ledger(inner) => inner.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

impl From<DividendError> for AppError {
    fn from(err: DividendError) -> Self {
        match err {
            DividendError::Ledger(inner) => inner.into(),
            DividendError::Database(msg) => Self::Database(msg),
            other => Self::Validation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn stake(balance: Decimal) -> MemberStake {
        MemberStake {
            member_id: MemberId::new(),
            account_id: AccountId::new(),
            balance,
        }
    }

    #[test]
    fn test_two_member_split() {
        // 3000/7000 of 1000 income: 300 and 700.
        let stakes = vec![stake(dec!(3000)), stake(dec!(7000))];
        let shares = apportion(dec!(1000), &stakes);

        assert_eq!(shares[0].share, dec!(0.3));
        assert_eq!(shares[0].amount, dec!(300.00));
        assert_eq!(shares[1].share, dec!(0.7));
        assert_eq!(shares[1].amount, dec!(700.00));
    }

    #[test]
    fn test_zero_savings_all_zero() {
        let stakes = vec![stake(dec!(0)), stake(dec!(0))];
        let shares = apportion(dec!(1000), &stakes);
        assert!(shares.iter().all(|s| s.amount.is_zero() && s.share.is_zero()));
    }

    #[test]
    fn test_indivisible_income_sums_exactly() {
        // 100.00 across three equal stakes: 33.33 + 33.33 + 33.34.
        let stakes = vec![stake(dec!(500)), stake(dec!(500)), stake(dec!(500))];
        let shares = apportion(dec!(100.00), &stakes);

        let total: Decimal = shares.iter().map(|s| s.amount).sum();
        assert_eq!(total, dec!(100.00));
        for share in &shares {
            assert!(share.amount == dec!(33.33) || share.amount == dec!(33.34));
        }
    }

    #[test]
    fn test_negative_balance_excluded() {
        let stakes = vec![stake(dec!(-500)), stake(dec!(1000))];
        let shares = apportion(dec!(100), &stakes);

        assert_eq!(shares[0].amount, dec!(0));
        assert_eq!(shares[0].share, dec!(0));
        assert_eq!(shares[1].amount, dec!(100.00));
    }

    #[test]
    fn test_single_member_takes_all() {
        let stakes = vec![stake(dec!(12345))];
        let shares = apportion(dec!(987.65), &stakes);
        assert_eq!(shares[0].amount, dec!(987.65));
        assert_eq!(shares[0].share, dec!(1));
    }

    #[test]
    fn test_sub_cent_income_carried_by_largest_remainder() {
        let stakes = vec![stake(dec!(600)), stake(dec!(400))];
        let shares = apportion(dec!(0.015), &stakes);

        let total: Decimal = shares.iter().map(|s| s.amount).sum();
        assert_eq!(total, dec!(0.015));
    }

    fn balances() -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec((1i64..10_000_000).prop_map(|c| Decimal::new(c, 2)), 1..40)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(150))]

        /// The credited amounts always sum to exactly the distributed income,
        /// regardless of member count - the fan-out entry always balances.
        #[test]
        fn prop_amounts_sum_to_income(
            balances in balances(),
            income_cents in 1i64..100_000_000,
        ) {
            let income = Decimal::new(income_cents, 2);
            let stakes: Vec<MemberStake> = balances.iter().map(|b| stake(*b)).collect();

            let shares = apportion(income, &stakes);
            let total: Decimal = shares.iter().map(|s| s.amount).sum();
            prop_assert_eq!(total, income);
        }

        /// Every member's amount stays within one cent of the exact
        /// proportional slice.
        #[test]
        fn prop_each_share_within_one_cent(
            balances in balances(),
            income_cents in 1i64..100_000_000,
        ) {
            let income = Decimal::new(income_cents, 2);
            let stakes: Vec<MemberStake> = balances.iter().map(|b| stake(*b)).collect();
            let total_savings: Decimal = balances.iter().copied().sum();

            let shares = apportion(income, &stakes);
            for share in &shares {
                let exact = share.balance * income / total_savings;
                prop_assert!((share.amount - exact).abs() <= dec!(0.01));
            }
        }

        /// Amounts are never negative and shares sum to 1.
        #[test]
        fn prop_shares_form_distribution(
            balances in balances(),
            income_cents in 1i64..100_000_000,
        ) {
            let income = Decimal::new(income_cents, 2);
            let stakes: Vec<MemberStake> = balances.iter().map(|b| stake(*b)).collect();

            let shares = apportion(income, &stakes);
            let share_sum: Decimal = shares.iter().map(|s| s.share).sum();
            prop_assert!(shares.iter().all(|s| s.amount >= Decimal::ZERO));
            // Decimal division rounds, so allow a tiny epsilon.
            prop_assert!((share_sum - Decimal::ONE).abs() < dec!(0.000001));
        }
    }
}
