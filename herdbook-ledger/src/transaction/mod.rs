//! Read access to recorded transactions. Transactions are created through
//! [Ledger::record_transaction](crate::Ledger::record_transaction) and are
//! append-only thereafter.
mod entity;
pub mod error;

use std::sync::Arc;

use tracing::instrument;

use crate::{primitives::*, store::LedgerStore};

pub use entity::*;
use error::*;

/// Service for working with `Transaction` entities.
#[derive(Clone)]
pub struct Transactions {
    store: Arc<dyn LedgerStore>,
}

impl Transactions {
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "herdbook.transactions.find_by_id", skip(self), err)]
    pub async fn find_by_id(
        &self,
        id: TransactionId,
    ) -> Result<TransactionValues, TransactionError> {
        self.store
            .find_transaction(id)
            .await?
            .ok_or(TransactionError::NotFound(id))
    }

    /// The transaction that reversed `id`, if any.
    #[instrument(name = "herdbook.transactions.find_reversal_of", skip(self), err)]
    pub async fn find_reversal_of(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, TransactionError> {
        Ok(self.store.find_reversal_of(id).await?)
    }

    #[instrument(name = "herdbook.transactions.list", skip(self), err)]
    pub async fn list(&self) -> Result<Vec<TransactionValues>, TransactionError> {
        Ok(self.store.list_transactions().await?)
    }
}
