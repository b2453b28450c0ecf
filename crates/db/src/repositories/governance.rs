//! Governance repository: committee voting on large loans.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};

use hazina_core::governance::{GovernanceError, VoteDecision, tally};
use hazina_core::loan::LoanStatus;
use hazina_shared::types::{LoanId, LoanVoteId, MemberId};

use crate::entities::sea_orm_active_enums::LoanStatus as DbLoanStatus;
use crate::entities::{loan_votes, loans};

fn db_err(err: DbErr) -> GovernanceError {
    GovernanceError::Database(err.to_string())
}

/// A loan under review together with its votes.
#[derive(Debug, Clone)]
pub struct LoanUnderReview {
    /// The loan.
    pub loan: loans::Model,
    /// Votes cast so far.
    pub votes: Vec<loan_votes::Model>,
}

/// Repository for committee votes.
#[derive(Debug, Clone)]
pub struct GovernanceRepository {
    db: DatabaseConnection,
}

impl GovernanceRepository {
    /// Creates a new governance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Casts one committee member's vote on a loan under review.
    ///
    /// In one database transaction: inserts the vote, re-tallies, and
    /// applies the quorum outcome (two approvals release the loan to
    /// `REQUESTED`, two rejections move it to `REJECTED`). The unique
    /// index on `(loan_id, voter_id)` makes a concurrent duplicate vote
    /// fail deterministically rather than double-count.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound`, `LoanNotInReview` when the loan has left
    /// committee review (including when quorum was already reached), or
    /// `DuplicateVote` when the member has voted before.
    pub async fn cast_vote(
        &self,
        loan_id: LoanId,
        voter_id: MemberId,
        vote: VoteDecision,
        comment: Option<String>,
    ) -> Result<loan_votes::Model, GovernanceError> {
        let loan = loans::Entity::find_by_id(loan_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(GovernanceError::LoanNotFound(loan_id))?;

        let status: LoanStatus = loan.status.into();
        if status != LoanStatus::CommitteeReview {
            return Err(GovernanceError::LoanNotInReview { status });
        }

        let txn = self.db.begin().await.map_err(db_err)?;

        let row = loan_votes::ActiveModel {
            id: Set(LoanVoteId::new().into_inner()),
            loan_id: Set(loan_id.into_inner()),
            voter_id: Set(voter_id.into_inner()),
            vote: Set(vote.into()),
            comment: Set(comment),
            created_at: Set(chrono::Utc::now().into()),
        };

        let row = loan_votes::Entity::insert(row)
            .exec_with_returning(&txn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => GovernanceError::DuplicateVote {
                    loan_id,
                    voter_id,
                },
                _ => db_err(err),
            })?;

        let decisions: Vec<VoteDecision> = loan_votes::Entity::find()
            .filter(loan_votes::Column::LoanId.eq(loan_id.into_inner()))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|v| v.vote.into())
            .collect();

        if let Some(next) = tally(&decisions).next_status() {
            self.release_from_review(&txn, loan_id, next).await?;
        }

        txn.commit().await.map_err(db_err)?;

        Ok(row)
    }

    /// Lists loans under committee review with their votes, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn loans_for_review(&self) -> Result<Vec<LoanUnderReview>, GovernanceError> {
        let rows = loans::Entity::find()
            .find_with_related(loan_votes::Entity)
            .filter(loans::Column::Status.eq(DbLoanStatus::CommitteeReview))
            .order_by_desc(loans::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(loan, votes)| LoanUnderReview { loan, votes })
            .collect())
    }

    /// Moves the loan out of review. Conditional on the loan still being
    /// in review so a racing quorum cannot flip an already-settled
    /// outcome.
    async fn release_from_review(
        &self,
        txn: &DatabaseTransaction,
        loan_id: LoanId,
        next: LoanStatus,
    ) -> Result<(), GovernanceError> {
        loans::Entity::update_many()
            .col_expr(loans::Column::Status, DbLoanStatus::from(next).as_enum())
            .col_expr(
                loans::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().fixed_offset()),
            )
            .filter(loans::Column::Id.eq(loan_id.into_inner()))
            .filter(loans::Column::Status.eq(DbLoanStatus::CommitteeReview))
            .exec(txn)
            .await
            .map_err(db_err)?;

        Ok(())
    }
}
