//! Read access to vouchers, the cash-movement documents issued alongside
//! payment and receipt transactions.
pub mod error;

use std::sync::Arc;

use tracing::instrument;

pub use herdbook_core_types::voucher::*;

use crate::{primitives::*, store::LedgerStore};

use error::*;

/// Service for working with `Voucher` entities.
#[derive(Clone)]
pub struct Vouchers {
    store: Arc<dyn LedgerStore>,
}

impl Vouchers {
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "herdbook.vouchers.find_by_id", skip(self), err)]
    pub async fn find_by_id(&self, id: VoucherId) -> Result<VoucherValues, VoucherError> {
        self.store
            .find_voucher(id)
            .await?
            .ok_or(VoucherError::NotFound(id))
    }

    #[instrument(name = "herdbook.vouchers.find_for_transaction", skip(self), err)]
    pub async fn find_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<VoucherValues, VoucherError> {
        self.store
            .find_voucher_for_transaction(transaction_id)
            .await?
            .ok_or(VoucherError::NoneForTransaction(transaction_id))
    }

    #[instrument(name = "herdbook.vouchers.list", skip(self), err)]
    pub async fn list(&self) -> Result<Vec<VoucherValues>, VoucherError> {
        Ok(self.store.list_vouchers().await?)
    }
}
