//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for the financial workflows,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Each write workflow runs inside a single database
//! transaction: either every row lands or none do.

pub mod contribution;
pub mod dividend;
pub mod governance;
pub mod ledger;
pub mod loan;
pub mod repayment;
pub mod reports;

pub use contribution::ContributionRepository;
pub use dividend::{DistributionResult, DividendRepository, PotentialDividends};
pub use governance::{GovernanceRepository, LoanUnderReview};
pub use ledger::{LedgerRepository, StatementLine};
pub use loan::LoanRepository;
pub use repayment::RepaymentRepository;
pub use reports::{
    GlobalStats, LoanProgress, MemberSavings, MonthlyCashflow, PersonalStats, RecentPosting,
    ReportsRepository,
};
