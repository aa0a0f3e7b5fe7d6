use thiserror::Error;

use crate::{
    account::error::AccountError, balance::error::BalanceError,
    journal_entry::error::JournalEntryError, store::StoreError,
    transaction::error::TransactionError, voucher::error::VoucherError,
};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("LedgerError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("LedgerError - Config: {0}")]
    ConfigError(String),
    #[error("LedgerError - Store: {0}")]
    Store(#[from] StoreError),
    #[error("LedgerError - AccountError: {0}")]
    AccountError(#[from] AccountError),
    #[error("LedgerError - JournalEntryError: {0}")]
    JournalEntryError(#[from] JournalEntryError),
    #[error("LedgerError - TransactionError: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("LedgerError - VoucherError: {0}")]
    VoucherError(#[from] VoucherError),
    #[error("LedgerError - BalanceError: {0}")]
    BalanceError(#[from] BalanceError),
}
