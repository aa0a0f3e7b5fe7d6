use thiserror::Error;

use crate::primitives::{TransactionId, VoucherId};

#[derive(Error, Debug)]
pub enum VoucherError {
    #[error("VoucherError - Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("VoucherError - voucher {0} not found")]
    NotFound(VoucherId),
    #[error("VoucherError - no voucher for transaction {0}")]
    NoneForTransaction(TransactionId),
}
