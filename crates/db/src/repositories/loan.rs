//! Loan repository: application routing and the status state machine.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use hazina_core::audit::{AuditAction, AuditEvent, AuditSink};
use hazina_core::ledger::{NewJournalEntry, PostingInput, ReferenceType, SystemAccountType};
use hazina_core::loan::{LoanApplication, LoanError, LoanStatus};
use hazina_shared::types::{AccountId, IdempotencyKey, LoanId, MemberId};

use crate::entities::loans;
use crate::entities::sea_orm_active_enums::LoanStatus as DbLoanStatus;
use crate::repositories::ledger::LedgerRepository;

fn db_err(err: DbErr) -> LoanError {
    LoanError::Database(err.to_string())
}

/// Repository for loan applications and status transitions.
#[derive(Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    audit: Arc<dyn AuditSink>,
}

impl LoanRepository {
    /// Creates a new loan repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger, audit }
    }

    /// Records a loan application.
    ///
    /// Principals above the committee threshold start in
    /// `COMMITTEE_REVIEW`; everything else starts in `REQUESTED`.
    /// `total_payable` is taken as supplied, not derived.
    ///
    /// # Errors
    ///
    /// Returns `LoanError` if the amounts fail validation or the insert
    /// fails.
    pub async fn apply_for_loan(
        &self,
        member_id: MemberId,
        principal: Decimal,
        rate: Decimal,
        total_payable: Decimal,
    ) -> Result<loans::Model, LoanError> {
        let application = LoanApplication::new(member_id, principal, rate, total_payable)?;

        let loan_id = LoanId::new();
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let loan = loans::ActiveModel {
            id: Set(loan_id.into_inner()),
            owner_id: Set(member_id.into_inner()),
            principal: Set(application.principal),
            rate: Set(application.rate),
            total_payable: Set(application.total_payable),
            status: Set(application.status.into()),
            approved_by: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let loan = loans::Entity::insert(loan)
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        self.audit.record(AuditEvent::new(
            member_id,
            AuditAction::LoanApplied,
            "loan",
            loan_id.to_string(),
        ));

        Ok(loan)
    }

    /// Transitions a loan to a new status.
    ///
    /// The transition must be in the declared table. Entering
    /// `DISBURSED` additionally posts the disbursement entry (debit
    /// loan-receivable, credit pool); the posting is gated on a
    /// conditional `UPDATE ... WHERE status = 'APPROVED'`, so a
    /// concurrent duplicate disbursement loses the race and cannot
    /// double-post. `approved_by` is overwritten with the acting admin
    /// on every status write.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::NotFound` for unknown loans and
    /// `LoanError::InvalidTransition` for edges outside the table,
    /// including transitions lost to a concurrent writer.
    pub async fn update_status(
        &self,
        loan_id: LoanId,
        new_status: LoanStatus,
        acting_admin: MemberId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<loans::Model, LoanError> {
        let loan = self.find_required(loan_id).await?;
        let current: LoanStatus = loan.status.into();

        // Reject illegal edges before touching the database.
        current.transition(new_status)?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let updated = self
            .conditional_status_update(&txn, loan_id, current, new_status, acting_admin)
            .await?;

        if !updated {
            // A concurrent writer moved the loan first; report against
            // its current status.
            txn.rollback().await.map_err(db_err)?;
            let fresh = self.find_required(loan_id).await?;
            return Err(LoanError::InvalidTransition {
                from: fresh.status.into(),
                to: new_status,
            });
        }

        if new_status == LoanStatus::Disbursed {
            self.post_disbursement(&txn, &loan, acting_admin, idempotency_key)
                .await?;
        }

        txn.commit().await.map_err(db_err)?;

        self.audit.record(AuditEvent::new(
            acting_admin,
            AuditAction::LoanStatusChanged(new_status),
            "loan",
            loan_id.to_string(),
        ));

        self.find_required(loan_id).await
    }

    /// Finds a loan, failing if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LoanError::NotFound` if the loan is missing.
    pub async fn find_required(&self, loan_id: LoanId) -> Result<loans::Model, LoanError> {
        loans::Entity::find_by_id(loan_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LoanError::NotFound(loan_id))
    }

    /// Lists loans awaiting treasurer approval, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending(&self) -> Result<Vec<loans::Model>, LoanError> {
        loans::Entity::find()
            .filter(loans::Column::Status.eq(DbLoanStatus::Requested))
            .order_by_desc(loans::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Atomically moves the loan from `current` to `new_status`,
    /// returning whether this call won the write.
    async fn conditional_status_update(
        &self,
        txn: &DatabaseTransaction,
        loan_id: LoanId,
        current: LoanStatus,
        new_status: LoanStatus,
        acting_admin: MemberId,
    ) -> Result<bool, LoanError> {
        let result = loans::Entity::update_many()
            .col_expr(
                loans::Column::Status,
                DbLoanStatus::from(new_status).as_enum(),
            )
            .col_expr(
                loans::Column::ApprovedBy,
                Expr::value(Some(acting_admin.into_inner())),
            )
            .col_expr(
                loans::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(loans::Column::Id.eq(loan_id.into_inner()))
            .filter(loans::Column::Status.eq(DbLoanStatus::from(current)))
            .exec(txn)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    /// Posts the disbursement entry: funds leave the pool, the loan
    /// book grows by the principal.
    async fn post_disbursement(
        &self,
        txn: &DatabaseTransaction,
        loan: &loans::Model,
        acting_admin: MemberId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<(), LoanError> {
        let pool = self
            .ledger
            .get_or_create_system_account(SystemAccountType::SaccoPool)
            .await?;
        let receivable = self
            .ledger
            .get_or_create_system_account(SystemAccountType::LoanReceivable)
            .await?;

        self.ledger
            .post_entry(
                txn,
                NewJournalEntry {
                    reference_type: ReferenceType::Loan,
                    reference_id: loan.id,
                    description: format!("Disbursement of loan {}", loan.id),
                    created_by: acting_admin,
                    idempotency_key,
                    postings: vec![
                        PostingInput::debit(AccountId::from_uuid(receivable.id), loan.principal),
                        PostingInput::credit(AccountId::from_uuid(pool.id), loan.principal),
                    ],
                },
            )
            .await?;

        Ok(())
    }
}
