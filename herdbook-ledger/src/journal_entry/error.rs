use rust_decimal::Decimal;
use thiserror::Error;

use crate::primitives::{AccountId, JournalEntryId};

#[derive(Error, Debug)]
pub enum JournalEntryError {
    #[error("JournalEntryError - Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("JournalEntryError - entry {0} not found")]
    NotFound(JournalEntryId),
    #[error("JournalEntryError - entry does not balance: debits {debits}, credits {credits}")]
    Unbalanced { debits: Decimal, credits: Decimal },
    #[error("JournalEntryError - entry {0} has already been approved or rejected")]
    AlreadyFinalized(JournalEntryId),
    #[error("JournalEntryError - line references unknown account {0}")]
    AccountNotFound(AccountId),
    #[error("JournalEntryError - line references inactive account {0}")]
    AccountInactive(AccountId),
}
