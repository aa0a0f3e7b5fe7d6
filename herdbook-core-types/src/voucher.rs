use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::*;

/// The cash/bank-movement document accompanying a payment or receipt
/// transaction. Its amount always equals the amount of the transaction it
/// settles, and it is never mutated after creation: cancelling a cash
/// movement issues a second voucher with status `Reversal` alongside the
/// reversing transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoucherValues {
    pub id: VoucherId,
    pub voucher_number: String,
    pub voucher_type: VoucherType,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub entity_id: AccountId,
    pub transaction_id: TransactionId,
    pub payment_method: PaymentMethod,
    pub status: VoucherStatus,
    pub created_at: DateTime<Utc>,
}
