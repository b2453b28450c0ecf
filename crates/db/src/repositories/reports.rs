//! Read-only reporting queries consumed by statement and dashboard
//! generators.
//!
//! Every figure is recomputed from postings at read time; balances are
//! never cached.

use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use hazina_core::ledger::{AccountKind, LedgerError, SystemAccountType};
use hazina_shared::types::{AccountId, MemberId};

use crate::entities::sea_orm_active_enums::{AccountType, LoanStatus as DbLoanStatus};
use crate::entities::{accounts, loan_repayments, loans, postings};
use crate::repositories::ledger::LedgerRepository;

fn db_err(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// Cooperative-wide dashboard figures.
#[derive(Debug, Clone)]
pub struct GlobalStats {
    /// Cash available in the pool.
    pub liquidity: Decimal,
    /// Principal currently out on disbursed loans.
    pub portfolio_at_risk: Decimal,
    /// Interest income earned to date.
    pub total_income: Decimal,
    /// Loans awaiting treasurer approval.
    pub awaiting_disbursement: u64,
    /// Loans awaiting committee votes.
    pub awaiting_governance: u64,
    /// Total member savings held in the pool.
    pub total_savings: Decimal,
}

/// Progress of one member's active loan.
#[derive(Debug, Clone)]
pub struct LoanProgress {
    /// Loan principal.
    pub principal: Decimal,
    /// Total the member will repay.
    pub total_payable: Decimal,
    /// Amount repaid so far.
    pub repaid: Decimal,
    /// Repaid percentage of total payable, capped at 100.
    pub percent: Decimal,
}

/// One member's dashboard figures.
#[derive(Debug, Clone)]
pub struct PersonalStats {
    /// Savings balance.
    pub total_savings: Decimal,
    /// Principal of the active (disbursed) loan, zero if none.
    pub active_loan_principal: Decimal,
    /// Progress of the active loan, if any.
    pub progress: Option<LoanProgress>,
}

/// One row of the member savings roster.
#[derive(Debug, Clone)]
pub struct MemberSavings {
    /// The member.
    pub member_id: MemberId,
    /// The member's savings account.
    pub account_id: AccountId,
    /// Current balance.
    pub balance: Decimal,
}

/// One month of cash movement.
#[derive(Debug, Clone)]
pub struct MonthlyCashflow {
    /// Month label, e.g. "Mar 26".
    pub label: String,
    /// Cash into the pool (deposits and repayments).
    pub inflow: Decimal,
    /// Principal disbursed.
    pub disbursed: Decimal,
    /// Interest income recognized.
    pub interest_income: Decimal,
}

/// A recent posting with its account.
#[derive(Debug, Clone)]
pub struct RecentPosting {
    /// The posting row.
    pub posting: postings::Model,
    /// The account it hit.
    pub account: accounts::Model,
}

/// Repository for dashboard and statement reads.
#[derive(Debug, Clone)]
pub struct ReportsRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
}

impl ReportsRepository {
    /// Creates a new reports repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger }
    }

    /// Cooperative-wide figures for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn global_stats(&self) -> Result<GlobalStats, LedgerError> {
        let liquidity = self
            .system_balance(SystemAccountType::SaccoPool)
            .await?
            .unwrap_or(Decimal::ZERO);
        let total_income = self
            .system_balance(SystemAccountType::Income)
            .await?
            .unwrap_or(Decimal::ZERO);

        let outstanding: Option<Option<Decimal>> = loans::Entity::find()
            .select_only()
            .column_as(loans::Column::Principal.sum(), "principal")
            .filter(loans::Column::Status.eq(DbLoanStatus::Disbursed))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let awaiting_disbursement = loans::Entity::find()
            .filter(loans::Column::Status.eq(DbLoanStatus::Requested))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let awaiting_governance = loans::Entity::find()
            .filter(loans::Column::Status.eq(DbLoanStatus::CommitteeReview))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(GlobalStats {
            liquidity,
            portfolio_at_risk: outstanding.flatten().unwrap_or(Decimal::ZERO),
            total_income,
            awaiting_disbursement,
            awaiting_governance,
            // Pool cash is member money; the dashboard reports them as one
            // figure until savings products diverge.
            total_savings: liquidity,
        })
    }

    /// One member's dashboard figures.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn personal_stats(&self, member_id: MemberId) -> Result<PersonalStats, LedgerError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(AccountType::MemberSavings))
            .filter(accounts::Column::OwnerId.eq(member_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let total_savings = match account {
            Some(account) => {
                let totals = self.ledger.account_totals(&self.db, account.id).await?;
                totals.balance(AccountKind::MEMBER_SAVINGS)
            }
            None => Decimal::ZERO,
        };

        let active_loan = loans::Entity::find()
            .filter(loans::Column::OwnerId.eq(member_id.into_inner()))
            .filter(loans::Column::Status.eq(DbLoanStatus::Disbursed))
            .order_by_desc(loans::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let (active_loan_principal, progress) = match active_loan {
            Some(loan) => {
                let repaid: Option<Option<Decimal>> = loan_repayments::Entity::find()
                    .select_only()
                    .column_as(loan_repayments::Column::Amount.sum(), "amount")
                    .filter(loan_repayments::Column::LoanId.eq(loan.id))
                    .into_tuple()
                    .one(&self.db)
                    .await
                    .map_err(db_err)?;
                let repaid = repaid.flatten().unwrap_or(Decimal::ZERO);

                let percent = if loan.total_payable > Decimal::ZERO {
                    (repaid / loan.total_payable * Decimal::ONE_HUNDRED)
                        .min(Decimal::ONE_HUNDRED)
                } else {
                    Decimal::ZERO
                };

                (
                    loan.principal,
                    Some(LoanProgress {
                        principal: loan.principal,
                        total_payable: loan.total_payable,
                        repaid,
                        percent,
                    }),
                )
            }
            None => (Decimal::ZERO, None),
        };

        Ok(PersonalStats {
            total_savings,
            active_loan_principal,
            progress,
        })
    }

    /// Every member's savings balance.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn member_savings_roster(&self) -> Result<Vec<MemberSavings>, LedgerError> {
        let savings_accounts = accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(AccountType::MemberSavings))
            .filter(accounts::Column::OwnerId.is_not_null())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut roster = Vec::with_capacity(savings_accounts.len());
        for account in savings_accounts {
            let Some(owner) = account.owner_id else {
                continue;
            };
            let totals = self.ledger.account_totals(&self.db, account.id).await?;
            roster.push(MemberSavings {
                member_id: MemberId::from_uuid(owner),
                account_id: AccountId::from_uuid(account.id),
                balance: totals.balance(AccountKind::MEMBER_SAVINGS),
            });
        }
        Ok(roster)
    }

    /// Most recent postings across all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn recent_postings(&self, limit: u64) -> Result<Vec<RecentPosting>, LedgerError> {
        let rows = postings::Entity::find()
            .find_also_related(accounts::Entity)
            .order_by_desc(postings::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(posting, account)| {
                account.map(|account| RecentPosting { posting, account })
            })
            .collect())
    }

    /// Cash movement over the last `months` calendar months, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn monthly_cashflow(&self, months: u32) -> Result<Vec<MonthlyCashflow>, LedgerError> {
        let pool = self.find_system(SystemAccountType::SaccoPool).await?;
        let receivable = self.find_system(SystemAccountType::LoanReceivable).await?;
        let income = self.find_system(SystemAccountType::Income).await?;

        let today = chrono::Utc::now().date_naive();
        let current_month = today.with_day(1).unwrap_or(today);

        let mut flows = Vec::with_capacity(months as usize);
        for back in (0..months).rev() {
            let Some(start) = current_month.checked_sub_months(Months::new(back)) else {
                continue;
            };
            let Some(end) = start.checked_add_months(Months::new(1)) else {
                continue;
            };

            let inflow = match &pool {
                Some(account) => {
                    self.sum_in_range(account.id, postings::Column::Debit, start, end)
                        .await?
                }
                None => Decimal::ZERO,
            };
            let disbursed = match &receivable {
                Some(account) => {
                    self.sum_in_range(account.id, postings::Column::Debit, start, end)
                        .await?
                }
                None => Decimal::ZERO,
            };
            let interest_income = match &income {
                Some(account) => {
                    self.sum_in_range(account.id, postings::Column::Credit, start, end)
                        .await?
                }
                None => Decimal::ZERO,
            };

            flows.push(MonthlyCashflow {
                label: start.format("%b %y").to_string(),
                inflow,
                disbursed,
                interest_income,
            });
        }
        Ok(flows)
    }

    async fn system_balance(
        &self,
        account_type: SystemAccountType,
    ) -> Result<Option<Decimal>, LedgerError> {
        let Some(account) = self.find_system(account_type).await? else {
            return Ok(None);
        };
        let totals = self.ledger.account_totals(&self.db, account.id).await?;
        Ok(Some(totals.balance(account_type.kind())))
    }

    async fn find_system(
        &self,
        account_type: SystemAccountType,
    ) -> Result<Option<accounts::Model>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(AccountType::from(account_type)))
            .filter(accounts::Column::OwnerId.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn sum_in_range(
        &self,
        account_id: uuid::Uuid,
        column: postings::Column,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal, LedgerError> {
        let start_at = start.and_time(NaiveTime::MIN).and_utc();
        let end_at = end.and_time(NaiveTime::MIN).and_utc();

        let sum: Option<Option<Decimal>> = postings::Entity::find()
            .select_only()
            .column_as(column.sum(), "total")
            .filter(postings::Column::AccountId.eq(account_id))
            .filter(postings::Column::CreatedAt.gte(start_at))
            .filter(postings::Column::CreatedAt.lt(end_at))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(sum.flatten().unwrap_or(Decimal::ZERO))
    }
}
