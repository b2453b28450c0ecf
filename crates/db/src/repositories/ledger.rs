//! Ledger repository: the sole writer of journal entries and postings.
//!
//! Workflow repositories compute amounts and call [`LedgerRepository::post_entry`]
//! inside their own database transaction; the balance invariant is
//! checked here before any row is written.

use std::collections::HashSet;

use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use hazina_core::ledger::{
    AccountTotals, LedgerError, NewJournalEntry, SystemAccountType, validate_postings,
};
use hazina_shared::types::{AccountId, IdempotencyKey, JournalEntryId, MemberId, PostingId};
use hazina_shared::types::{PageRequest, PageResponse};

use crate::entities::sea_orm_active_enums::AccountType;
use crate::entities::{accounts, journal_entries, postings};

fn db_err(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}

/// One line of an account statement.
#[derive(Debug, Clone)]
pub struct StatementLine {
    /// The posting row.
    pub posting: postings::Model,
    /// The journal entry it belongs to.
    pub entry: journal_entries::Model,
}

/// Repository for accounts, journal entries, and postings.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the singleton account for a system type, creating it on
    /// first use.
    ///
    /// Safe under concurrent first-use: the insert is an
    /// `ON CONFLICT DO NOTHING` upsert against the partial unique index,
    /// so both racers end up reading the same row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_or_create_system_account(
        &self,
        account_type: SystemAccountType,
    ) -> Result<accounts::Model, LedgerError> {
        let db_type = AccountType::from(account_type);

        if let Some(account) = self.find_system_account(db_type.clone()).await? {
            return Ok(account);
        }

        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            account_type: Set(db_type.clone()),
            owner_id: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        match accounts::Entity::insert(model)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec(&self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(db_err(err)),
        }

        self.find_system_account(db_type)
            .await?
            .ok_or_else(|| LedgerError::Database("system account upsert left no row".to_string()))
    }

    /// Returns a member's savings account, creating it on first use.
    ///
    /// Same upsert discipline as system accounts, against the
    /// `(owner_id, account_type)` partial unique index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn get_or_create_member_account(
        &self,
        member_id: MemberId,
    ) -> Result<accounts::Model, LedgerError> {
        if let Some(account) = self.find_member_account(member_id).await? {
            return Ok(account);
        }

        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            account_type: Set(AccountType::MemberSavings),
            owner_id: Set(Some(member_id.into_inner())),
            created_at: Set(chrono::Utc::now().into()),
        };

        match accounts::Entity::insert(model)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec(&self.db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(err) => return Err(db_err(err)),
        }

        self.find_member_account(member_id)
            .await?
            .ok_or_else(|| LedgerError::Database("member account upsert left no row".to_string()))
    }

    /// Posts one balanced journal entry with its postings.
    ///
    /// Runs on the caller's connection so workflows can wrap the posting
    /// together with their own rows in one transaction. The balance
    /// invariant is validated before anything is written; a reused
    /// idempotency key fails before anything is written too.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnbalancedEntry` when debits and credits
    /// diverge beyond tolerance, `AccountNotFound` for postings against
    /// unknown accounts, and `DuplicateIdempotencyKey` on key reuse.
    pub async fn post_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        input: NewJournalEntry,
    ) -> Result<journal_entries::Model, LedgerError> {
        validate_postings(&input.postings)?;

        if let Some(key) = input.idempotency_key {
            let existing = journal_entries::Entity::find()
                .filter(journal_entries::Column::IdempotencyKey.eq(key.into_inner()))
                .one(conn)
                .await
                .map_err(db_err)?;
            if existing.is_some() {
                return Err(LedgerError::DuplicateIdempotencyKey(key));
            }
        }

        self.ensure_accounts_exist(conn, &input.postings).await?;

        let entry = journal_entries::ActiveModel {
            id: Set(JournalEntryId::new().into_inner()),
            reference_type: Set(input.reference_type.as_str().to_string()),
            reference_id: Set(input.reference_id),
            description: Set(input.description.clone()),
            idempotency_key: Set(input.idempotency_key.map(IdempotencyKey::into_inner)),
            created_by: Set(input.created_by.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let entry = journal_entries::Entity::insert(entry)
            .exec_with_returning(conn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                    // Lost the race on the idempotency key between check and insert.
                    input.idempotency_key.map_or_else(
                        || db_err(err),
                        LedgerError::DuplicateIdempotencyKey,
                    )
                }
                _ => db_err(err),
            })?;

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let rows: Vec<postings::ActiveModel> = input
            .postings
            .iter()
            .map(|p| postings::ActiveModel {
                id: Set(PostingId::new().into_inner()),
                journal_entry_id: Set(entry.id),
                account_id: Set(p.account_id.into_inner()),
                debit: Set(p.debit),
                credit: Set(p.credit),
                created_at: Set(now),
            })
            .collect();

        postings::Entity::insert_many(rows)
            .exec(conn)
            .await
            .map_err(db_err)?;

        tracing::debug!(
            entry_id = %entry.id,
            reference_type = %entry.reference_type,
            postings = input.postings.len(),
            "journal entry posted"
        );

        Ok(entry)
    }

    /// Sums an account's postings. Balances are never stored; every read
    /// recomputes from this aggregate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn account_totals<C: ConnectionTrait>(
        &self,
        conn: &C,
        account_id: Uuid,
    ) -> Result<AccountTotals, LedgerError> {
        let sums: Option<(Option<Decimal>, Option<Decimal>)> = postings::Entity::find()
            .select_only()
            .column_as(postings::Column::Debit.sum(), "debit")
            .column_as(postings::Column::Credit.sum(), "credit")
            .filter(postings::Column::AccountId.eq(account_id))
            .into_tuple()
            .one(conn)
            .await
            .map_err(db_err)?;

        let (debit, credit) = sums.unwrap_or((None, None));
        Ok(AccountTotals {
            debit: debit.unwrap_or(Decimal::ZERO),
            credit: credit.unwrap_or(Decimal::ZERO),
        })
    }

    /// Computes an account's balance under its own sign convention.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account does not exist.
    pub async fn account_balance(&self, account_id: Uuid) -> Result<Decimal, LedgerError> {
        let account = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::AccountNotFound(AccountId::from_uuid(
                account_id,
            )))?;

        let totals = self.account_totals(&self.db, account_id).await?;
        Ok(totals.balance(account.account_type.kind()))
    }

    /// Lists an account's postings with their journal entries, newest
    /// first. This is the statement/transaction-list read consumed by
    /// report generators.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn account_statement(
        &self,
        account_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<StatementLine>, LedgerError> {
        use sea_orm::PaginatorTrait;

        let total = postings::Entity::find()
            .filter(postings::Column::AccountId.eq(account_id))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        let rows = postings::Entity::find()
            .find_also_related(journal_entries::Entity)
            .filter(postings::Column::AccountId.eq(account_id))
            .order_by_desc(postings::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let lines = rows
            .into_iter()
            .filter_map(|(posting, entry)| entry.map(|entry| StatementLine { posting, entry }))
            .collect();

        Ok(PageResponse::new(lines, page.page, page.per_page, total))
    }

    async fn find_system_account(
        &self,
        account_type: AccountType,
    ) -> Result<Option<accounts::Model>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(account_type))
            .filter(accounts::Column::OwnerId.is_null())
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn find_member_account(
        &self,
        member_id: MemberId,
    ) -> Result<Option<accounts::Model>, LedgerError> {
        accounts::Entity::find()
            .filter(accounts::Column::AccountType.eq(AccountType::MemberSavings))
            .filter(accounts::Column::OwnerId.eq(member_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    async fn ensure_accounts_exist<C: ConnectionTrait>(
        &self,
        conn: &C,
        posting_inputs: &[hazina_core::ledger::PostingInput],
    ) -> Result<(), LedgerError> {
        let wanted: HashSet<Uuid> = posting_inputs
            .iter()
            .map(|p| p.account_id.into_inner())
            .collect();

        let found: HashSet<Uuid> = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(wanted.iter().copied()))
            .all(conn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|a| a.id)
            .collect();

        if let Some(missing) = wanted.difference(&found).next() {
            return Err(LedgerError::AccountNotFound(AccountId::from_uuid(*missing)));
        }
        Ok(())
    }
}
