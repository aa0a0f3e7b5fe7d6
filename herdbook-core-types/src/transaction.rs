use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::*;

/// A business-level event (purchase, sale, payment, receipt) against one
/// supplier or customer account.
///
/// Transactions are append-only: corrections happen through a reversing
/// transaction whose `reversal_of` points back at the original, never by
/// mutating history.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionValues {
    pub id: TransactionId,
    pub transaction_number: String,
    pub tx_type: TransactionType,
    pub date: NaiveDate,
    pub entity_id: AccountId,
    pub amount: Decimal,
    pub payment_method: Option<PaymentMethod>,
    pub journal_entry_id: JournalEntryId,
    pub related_type: Option<String>,
    pub related_id: Option<uuid::Uuid>,
    pub reversal_of: Option<TransactionId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionValues {
    pub fn is_reversal(&self) -> bool {
        self.reversal_of.is_some()
    }
}
