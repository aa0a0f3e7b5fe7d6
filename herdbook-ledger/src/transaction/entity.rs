use chrono::NaiveDate;
use derive_builder::Builder;
use rust_decimal::Decimal;

pub use herdbook_core_types::transaction::*;

use crate::primitives::*;

/// Input for recording a business transaction. Validation (positive
/// amount, minor-unit scale, active entity account, payment method on cash
/// movements) happens when the transaction is recorded, not at build time,
/// so callers get typed errors instead of builder strings.
#[derive(Builder, Debug, Clone)]
pub struct TransactionInput {
    pub tx_type: TransactionType,
    #[builder(setter(into))]
    pub entity_id: AccountId,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[builder(setter(strip_option), default)]
    pub payment_method: Option<PaymentMethod>,
    #[builder(setter(strip_option, into), default)]
    pub related_type: Option<String>,
    #[builder(setter(strip_option), default)]
    pub related_id: Option<uuid::Uuid>,
    #[builder(setter(strip_option, into), default)]
    pub notes: Option<String>,
}

impl TransactionInput {
    pub fn builder() -> TransactionInputBuilder {
        TransactionInputBuilder::default()
    }
}
