use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::*;

/// A ledger party (supplier, customer, cost center or equity) with its
/// running balance.
///
/// The balance is debit-positive everywhere: it always equals
/// `sum(line.debit) - sum(line.credit)` over the approved journal lines
/// posted against the account. Positive means the counterparty owes the
/// farm, negative means the farm owes the counterparty. No code outside the
/// ledger's atomic posting path writes this field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountValues {
    pub id: AccountId,
    pub code: String,
    pub kind: AccountKind,
    pub name: String,
    pub balance: Decimal,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl AccountValues {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
