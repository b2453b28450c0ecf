//! Double-entry ledger logic.
//!
//! The ledger is the foundation every workflow posts into: balanced
//! journal entries, account resolution rules, and the per-account-type
//! sign conventions used by every balance read.

pub mod error;
pub mod types;
pub mod validation;

pub use error::LedgerError;
pub use types::{
    AccountKind, AccountTotals, NewJournalEntry, PostingInput, ReferenceType, SystemAccountType,
};
pub use validation::{BALANCE_TOLERANCE, EntryTotals, validate_postings};
