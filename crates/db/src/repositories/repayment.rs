//! Repayment repository: principal-first repayment recording.

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use hazina_core::audit::{AuditAction, AuditEvent, AuditSink};
use hazina_core::ledger::{NewJournalEntry, PostingInput, ReferenceType, SystemAccountType};
use hazina_core::loan::LoanStatus;
use hazina_core::repayment::{RepaymentError, allocate, closes_loan};
use hazina_shared::types::{AccountId, IdempotencyKey, LoanId, MemberId, RepaymentId};

use crate::entities::sea_orm_active_enums::LoanStatus as DbLoanStatus;
use crate::entities::{loan_repayments, loans};
use crate::repositories::ledger::LedgerRepository;

fn db_err(err: DbErr) -> RepaymentError {
    RepaymentError::Database(err.to_string())
}

/// Repository for loan repayments.
#[derive(Clone)]
pub struct RepaymentRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    audit: Arc<dyn AuditSink>,
}

impl RepaymentRepository {
    /// Creates a new repayment repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        let ledger = LedgerRepository::new(db.clone());
        Self { db, ledger, audit }
    }

    /// Records a repayment installment against a disbursed loan.
    ///
    /// In one database transaction: allocates the amount principal-first,
    /// inserts the repayment row (id generated up front, so the journal
    /// link is real from the start), posts the entry (debit pool; credit
    /// loan-receivable and/or income), and closes the loan when the
    /// cumulative repaid amount reaches the total payable. Overpayment
    /// is accepted; the excess is recognized as interest.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound`, `LoanNotDisbursed` for loans not in
    /// `DISBURSED`, and `InvalidAmount` for non-positive amounts.
    pub async fn repay(
        &self,
        loan_id: LoanId,
        amount: Decimal,
        recorded_by: MemberId,
        idempotency_key: Option<IdempotencyKey>,
    ) -> Result<loan_repayments::Model, RepaymentError> {
        if amount <= Decimal::ZERO {
            return Err(RepaymentError::InvalidAmount(amount));
        }

        let loan = loans::Entity::find_by_id(loan_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(RepaymentError::LoanNotFound(loan_id))?;

        let status: LoanStatus = loan.status.into();
        if status != LoanStatus::Disbursed {
            return Err(RepaymentError::LoanNotDisbursed { status });
        }

        let pool = self
            .ledger
            .get_or_create_system_account(SystemAccountType::SaccoPool)
            .await?;
        let receivable = self
            .ledger
            .get_or_create_system_account(SystemAccountType::LoanReceivable)
            .await?;
        let income = self
            .ledger
            .get_or_create_system_account(SystemAccountType::Income)
            .await?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let prior_repaid = self.total_repaid(&txn, loan_id).await?;
        let split = allocate(loan.principal, prior_repaid, amount);

        let mut postings = vec![PostingInput::debit(AccountId::from_uuid(pool.id), amount)];
        if split.principal_portion > Decimal::ZERO {
            postings.push(PostingInput::credit(
                AccountId::from_uuid(receivable.id),
                split.principal_portion,
            ));
        }
        if split.interest_portion > Decimal::ZERO {
            postings.push(PostingInput::credit(
                AccountId::from_uuid(income.id),
                split.interest_portion,
            ));
        }

        let repayment_id = RepaymentId::new();
        let entry = self
            .ledger
            .post_entry(
                &txn,
                NewJournalEntry {
                    reference_type: ReferenceType::LoanRepayment,
                    reference_id: repayment_id.into_inner(),
                    description: format!(
                        "Loan repayment (P: {}, I: {})",
                        split.principal_portion, split.interest_portion
                    ),
                    created_by: recorded_by,
                    idempotency_key,
                    postings,
                },
            )
            .await?;

        let repayment = loan_repayments::ActiveModel {
            id: Set(repayment_id.into_inner()),
            loan_id: Set(loan_id.into_inner()),
            amount: Set(amount),
            journal_entry_id: Set(entry.id),
            created_at: Set(chrono::Utc::now().into()),
        };
        let repayment = loan_repayments::Entity::insert(repayment)
            .exec_with_returning(&txn)
            .await
            .map_err(db_err)?;

        if closes_loan(prior_repaid, amount, loan.total_payable) {
            self.close_loan(&txn, loan_id).await?;
        }

        txn.commit().await.map_err(db_err)?;

        self.audit.record(AuditEvent::new(
            recorded_by,
            AuditAction::LoanRepayment,
            "loan_repayment",
            repayment_id.to_string(),
        ));

        Ok(repayment)
    }

    /// Lists a loan's repayments, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_loan(
        &self,
        loan_id: LoanId,
    ) -> Result<Vec<loan_repayments::Model>, RepaymentError> {
        loan_repayments::Entity::find()
            .filter(loan_repayments::Column::LoanId.eq(loan_id.into_inner()))
            .order_by_desc(loan_repayments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Sums all prior repayments on a loan.
    async fn total_repaid<C: ConnectionTrait>(
        &self,
        conn: &C,
        loan_id: LoanId,
    ) -> Result<Decimal, RepaymentError> {
        let sum: Option<Option<Decimal>> = loan_repayments::Entity::find()
            .select_only()
            .column_as(loan_repayments::Column::Amount.sum(), "amount")
            .filter(loan_repayments::Column::LoanId.eq(loan_id.into_inner()))
            .into_tuple()
            .one(conn)
            .await
            .map_err(db_err)?;

        Ok(sum.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Marks the loan closed; conditional on it still being disbursed.
    async fn close_loan(
        &self,
        txn: &DatabaseTransaction,
        loan_id: LoanId,
    ) -> Result<(), RepaymentError> {
        loans::Entity::update_many()
            .col_expr(loans::Column::Status, DbLoanStatus::Closed.as_enum())
            .col_expr(
                loans::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(loans::Column::Id.eq(loan_id.into_inner()))
            .filter(loans::Column::Status.eq(DbLoanStatus::Disbursed))
            .exec(txn)
            .await
            .map_err(db_err)?;

        Ok(())
    }
}
