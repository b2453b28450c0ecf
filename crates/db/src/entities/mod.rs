//! `SeaORM` entity definitions.

pub mod accounts;
pub mod contributions;
pub mod journal_entries;
pub mod loan_repayments;
pub mod loan_votes;
pub mod loans;
pub mod postings;
pub mod sea_orm_active_enums;
