//! Contribution repository: records member savings deposits.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};

use hazina_core::audit::{AuditAction, AuditEvent, AuditSink};
use hazina_core::contribution::{ContributionError, deposit_postings, validate_amount};
use hazina_core::ledger::{NewJournalEntry, ReferenceType, SystemAccountType};
use hazina_shared::types::{AccountId, ContributionId, IdempotencyKey, MemberId};
use hazina_shared::types::{PageRequest, PageResponse};

use crate::entities::contributions;
use crate::entities::sea_orm_active_enums::ContributionStatus;
use crate::repositories::ledger::LedgerRepository;

fn db_err(err: DbErr) -> ContributionError {
    ContributionError::Database(err.to_string())
}

/// Repository for savings contributions.
#[derive(Clone)]
pub struct ContributionRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    audit: Arc<dyn AuditSink>,
}

impl ContributionRepository {
    /// Creates a new contribution repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger, audit }
    }

    /// Records a monthly savings deposit.
    ///
    /// In one database transaction: creates the contribution row and
    /// posts the journal entry debiting the pool and crediting the
    /// member's savings account. There is NO dedup without an
    /// idempotency key: two identical calls produce two contributions
    /// and double the balances.
    ///
    /// # Errors
    ///
    /// Returns `ContributionError::InvalidAmount` for non-positive
    /// amounts and propagates ledger errors (including a reused
    /// idempotency key) unchanged.
    pub async fn deposit(
        &self,
        member_id: MemberId,
        amount: Decimal,
        month: &str,
        recorded_by: MemberId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<contributions::Model, ContributionError> {
        validate_amount(amount)?;

        // Account resolution is an idempotent upsert; it can safely
        // happen before the financial transaction.
        let pool = self
            .ledger
            .get_or_create_system_account(SystemAccountType::SaccoPool)
            .await?;
        let member_account = self.ledger.get_or_create_member_account(member_id).await?;

        let contribution_id = ContributionId::new();
        let txn = self.db.begin().await.map_err(db_err)?;

        let contribution = contributions::ActiveModel {
            id: Set(contribution_id.into_inner()),
            owner_id: Set(member_id.into_inner()),
            amount: Set(amount),
            month: Set(month.to_string()),
            status: Set(ContributionStatus::Confirmed),
            created_at: Set(chrono::Utc::now().into()),
        };
        let contribution = contributions::Entity::insert(contribution)
            .exec_with_returning(&txn)
            .await
            .map_err(db_err)?;

        self.ledger
            .post_entry(
                &txn,
                NewJournalEntry {
                    reference_type: ReferenceType::Contribution,
                    reference_id: contribution_id.into_inner(),
                    description: format!("Monthly contribution for {month}"),
                    created_by: recorded_by,
                    idempotency_key,
                    postings: deposit_postings(
                        AccountId::from_uuid(pool.id),
                        AccountId::from_uuid(member_account.id),
                        amount,
                    ),
                },
            )
            .await?;

        txn.commit().await.map_err(db_err)?;

        self.audit.record(AuditEvent::new(
            recorded_by,
            AuditAction::DepositRecorded,
            "contribution",
            contribution_id.to_string(),
        ));

        Ok(contribution)
    }

    /// Lists all contributions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<contributions::Model>, ContributionError> {
        use sea_orm::PaginatorTrait;

        let total = contributions::Entity::find()
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let rows = contributions::Entity::find()
            .order_by_desc(contributions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }

    /// Lists one member's contributions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<contributions::Model>, ContributionError> {
        contributions::Entity::find()
            .filter(contributions::Column::OwnerId.eq(member_id.into_inner()))
            .order_by_desc(contributions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}
