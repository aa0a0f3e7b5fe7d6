use rust_decimal::Decimal;
use thiserror::Error;

use crate::primitives::AccountId;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("AccountError - Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("AccountError - account {0} not found")]
    NotFound(AccountId),
    #[error("AccountError - no account with code '{0}'")]
    CodeNotFound(String),
    #[error("AccountError - account code '{0}' already exists")]
    DuplicateCode(String),
    #[error("AccountError - account {0} is inactive")]
    Inactive(AccountId),
    #[error("AccountError - account {id} still carries a balance of {balance}")]
    HasOpenBalance { id: AccountId, balance: Decimal },
}
