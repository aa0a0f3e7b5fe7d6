use thiserror::Error;

use crate::primitives::AccountId;

#[derive(Error, Debug)]
pub enum BalanceError {
    #[error("BalanceError - Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("BalanceError - account {0} not found")]
    AccountNotFound(AccountId),
}
