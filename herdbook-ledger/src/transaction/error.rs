use rust_decimal::Decimal;
use thiserror::Error;

use crate::primitives::{AccountId, AccountKind, TransactionId, TransactionType};

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("TransactionError - Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("TransactionError - transaction {0} not found")]
    NotFound(TransactionId),
    #[error("TransactionError - amount {0} must be positive with at most 2 decimal places")]
    InvalidAmount(Decimal),
    #[error("TransactionError - {0} transactions require a payment method")]
    MissingPaymentMethod(TransactionType),
    #[error("TransactionError - entity account {0} not found")]
    UnknownEntity(AccountId),
    #[error("TransactionError - entity account {0} is inactive")]
    InactiveEntity(AccountId),
    #[error(
        "TransactionError - entity account {0} has kind {1}; only supplier or customer accounts can transact"
    )]
    InvalidEntityKind(AccountId, AccountKind),
    #[error("TransactionError - transaction {0} has already been reversed")]
    AlreadyReversed(TransactionId),
    #[error("TransactionError - transaction {0} is itself a reversal")]
    CannotReverseReversal(TransactionId),
}
