//! Initial database migration.
//!
//! Creates the ledger tables, the loan workflow tables, and the
//! uniqueness guarantees the workflows rely on (singleton system
//! accounts, one savings account per member, one vote per voter per
//! loan, unique idempotency keys).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: LEDGER
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(POSTINGS_SQL).await?;

        // ============================================================
        // PART 3: WORKFLOWS
        // ============================================================
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(LOAN_VOTES_SQL).await?;
        db.execute_unprepared(LOAN_REPAYMENTS_SQL).await?;
        db.execute_unprepared(CONTRIBUTIONS_SQL).await?;

        // ============================================================
        // PART 4: INDEXES
        // ============================================================
        db.execute_unprepared(INDEXES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account types: four system singletons plus per-member savings
CREATE TYPE account_type AS ENUM (
    'SACCO_POOL',
    'LOAN_RECEIVABLE',
    'INCOME',
    'EXPENSE',
    'MEMBER_SAVINGS'
);

-- Loan lifecycle
CREATE TYPE loan_status AS ENUM (
    'REQUESTED',
    'COMMITTEE_REVIEW',
    'APPROVED',
    'REJECTED',
    'DISBURSED',
    'CLOSED'
);

-- Committee vote
CREATE TYPE vote_decision AS ENUM ('APPROVE', 'REJECT');

-- Contribution status (only CONFIRMED is produced today)
CREATE TYPE contribution_status AS ENUM ('CONFIRMED');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    account_type account_type NOT NULL,
    owner_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- System accounts are singletons; members own at most one account
    -- per type. Partial unique indexes make get-or-create race-safe.
    CONSTRAINT system_account_has_no_owner CHECK (
        account_type <> 'MEMBER_SAVINGS' OR owner_id IS NOT NULL
    )
);

CREATE UNIQUE INDEX accounts_system_singleton
    ON accounts (account_type) WHERE owner_id IS NULL;
CREATE UNIQUE INDEX accounts_one_per_member
    ON accounts (owner_id, account_type) WHERE owner_id IS NOT NULL;
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    reference_type VARCHAR(32) NOT NULL,
    reference_id UUID NOT NULL,
    description TEXT NOT NULL,
    idempotency_key UUID UNIQUE,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const POSTINGS_SQL: &str = r"
CREATE TABLE postings (
    id UUID PRIMARY KEY,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id),
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(18, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(18, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT posting_amounts_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT posting_moves_money CHECK (debit > 0 OR credit > 0)
);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    principal NUMERIC(18, 4) NOT NULL,
    rate NUMERIC(9, 6) NOT NULL,
    total_payable NUMERIC(18, 4) NOT NULL,
    status loan_status NOT NULL DEFAULT 'REQUESTED',
    approved_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT loan_principal_positive CHECK (principal > 0),
    CONSTRAINT loan_total_payable_positive CHECK (total_payable > 0)
);
";

const LOAN_VOTES_SQL: &str = r"
CREATE TABLE loan_votes (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id),
    voter_id UUID NOT NULL,
    vote vote_decision NOT NULL,
    comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- One vote per member per loan; the second concurrent vote fails here
    CONSTRAINT one_vote_per_voter UNIQUE (loan_id, voter_id)
);
";

const LOAN_REPAYMENTS_SQL: &str = r"
CREATE TABLE loan_repayments (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id),
    amount NUMERIC(18, 4) NOT NULL,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT repayment_amount_positive CHECK (amount > 0)
);
";

const CONTRIBUTIONS_SQL: &str = r"
CREATE TABLE contributions (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    amount NUMERIC(18, 4) NOT NULL,
    month VARCHAR(32) NOT NULL,
    status contribution_status NOT NULL DEFAULT 'CONFIRMED',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT contribution_amount_positive CHECK (amount > 0)
);
";

const INDEXES_SQL: &str = r"
-- Balance reads aggregate postings by account on every call
CREATE INDEX postings_by_account ON postings (account_id);
CREATE INDEX postings_by_entry ON postings (journal_entry_id);
CREATE INDEX postings_by_created_at ON postings (created_at DESC);

CREATE INDEX loans_by_status ON loans (status);
CREATE INDEX loans_by_owner ON loans (owner_id);
CREATE INDEX loan_repayments_by_loan ON loan_repayments (loan_id);
CREATE INDEX contributions_by_owner ON contributions (owner_id);
CREATE INDEX journal_entries_by_reference ON journal_entries (reference_type, reference_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS loan_repayments;
DROP TABLE IF EXISTS loan_votes;
DROP TABLE IF EXISTS contributions;
DROP TABLE IF EXISTS postings;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS loans;
DROP TABLE IF EXISTS accounts;

DROP TYPE IF EXISTS contribution_status;
DROP TYPE IF EXISTS vote_decision;
DROP TYPE IF EXISTS loan_status;
DROP TYPE IF EXISTS account_type;
";
