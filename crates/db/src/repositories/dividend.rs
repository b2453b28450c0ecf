//! Dividend repository: pro-rata distribution of accumulated income.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, TransactionTrait,
};
use uuid::Uuid;

use hazina_core::audit::{AuditAction, AuditEvent, AuditSink};
use hazina_core::dividend::{DividendError, DividendShare, MemberStake, apportion};
use hazina_core::ledger::{NewJournalEntry, PostingInput, ReferenceType, SystemAccountType};
use hazina_shared::types::{AccountId, IdempotencyKey, MemberId};

use crate::entities::sea_orm_active_enums::AccountType;
use crate::entities::{accounts, journal_entries};
use crate::repositories::ledger::LedgerRepository;

fn db_err(err: DbErr) -> DividendError {
    DividendError::Database(err.to_string())
}

/// Projection of what a distribution would pay out right now.
#[derive(Debug, Clone)]
pub struct PotentialDividends {
    /// Income account balance (credits minus debits).
    pub total_income: Decimal,
    /// Sum of all member savings balances.
    pub total_savings: Decimal,
    /// Per-member breakdown.
    pub breakdown: Vec<DividendShare>,
}

/// Result of an executed distribution.
#[derive(Debug, Clone)]
pub struct DistributionResult {
    /// The fan-out journal entry.
    pub entry: journal_entries::Model,
    /// What each member was credited.
    pub breakdown: Vec<DividendShare>,
}

/// Repository for dividend distribution.
#[derive(Clone)]
pub struct DividendRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    audit: Arc<dyn AuditSink>,
}

impl DividendRepository {
    /// Creates a new dividend repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger, audit }
    }

    /// Computes each member's projected dividend from current balances.
    ///
    /// Balances are recomputed from postings on every call; nothing is
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn potential_dividends(&self) -> Result<PotentialDividends, DividendError> {
        let income = self
            .ledger
            .get_or_create_system_account(SystemAccountType::Income)
            .await?;

        let income_totals = self.ledger.account_totals(&self.db, income.id).await?;
        let total_income = income_totals.balance(SystemAccountType::Income.kind());

        let stakes = self.member_stakes().await?;
        let total_savings: Decimal = stakes.iter().map(|s| s.balance).sum();

        Ok(PotentialDividends {
            total_income,
            total_savings,
            breakdown: apportion(total_income, &stakes),
        })
    }

    /// Distributes the full income balance to members pro rata.
    ///
    /// One journal entry debits the income account and credits every
    /// member with a positive share. Shares are floored to whole cents
    /// with the residual assigned by largest remainder, so the credits
    /// sum exactly to the distributed income and the entry always
    /// balances, whatever the member count.
    ///
    /// # Errors
    ///
    /// Returns `DividendError::NothingToDistribute` when the income
    /// balance is not positive.
    pub async fn distribute(
        &self,
        acting_admin: MemberId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<DistributionResult, DividendError> {
        let potential = self.potential_dividends().await?;
        if potential.total_income <= Decimal::ZERO {
            return Err(DividendError::NothingToDistribute(potential.total_income));
        }

        let income = self
            .ledger
            .get_or_create_system_account(SystemAccountType::Income)
            .await?;

        let mut postings = vec![PostingInput::debit(
            AccountId::from_uuid(income.id),
            potential.total_income,
        )];
        for share in &potential.breakdown {
            if share.amount > Decimal::ZERO {
                postings.push(PostingInput::credit(share.account_id, share.amount));
            }
        }

        let distribution_id = Uuid::now_v7();
        let txn = self.db.begin().await.map_err(db_err)?;

        let entry = self
            .ledger
            .post_entry(
                &txn,
                NewJournalEntry {
                    reference_type: ReferenceType::Dividend,
                    reference_id: distribution_id,
                    description: format!(
                        "Dividend distribution for income: {}",
                        potential.total_income
                    ),
                    created_by: acting_admin,
                    idempotency_key,
                    postings,
                },
            )
            .await?;

        txn.commit().await.map_err(db_err)?;

        self.audit.record(AuditEvent::new(
            acting_admin,
            AuditAction::DividendDistributed,
            "dividend",
            distribution_id.to_string(),
        ));

        Ok(DistributionResult {
            entry,
            breakdown: potential.breakdown,
        })
    }

    /// Loads every member savings account with its current balance.
    async fn member_stakes(&self) -> Result<Vec<MemberStake>, DividendError> {
        let savings_accounts = accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(AccountType::MemberSavings))
            .filter(accounts::Column::OwnerId.is_not_null())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut stakes = Vec::with_capacity(savings_accounts.len());
        for account in savings_accounts {
            let totals = self.ledger.account_totals(&self.db, account.id).await?;
            let Some(owner) = account.owner_id else {
                continue;
            };
            stakes.push(MemberStake {
                member_id: MemberId::from_uuid(owner),
                account_id: AccountId::from_uuid(account.id),
                balance: totals.balance(account.account_type.kind()),
            });
        }
        Ok(stakes)
    }
}
