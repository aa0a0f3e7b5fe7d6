use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::primitives::*;

/// One dated, described set of debit/credit lines.
///
/// An entry is only `Approved` once its lines have passed the exact
/// debit == credit check and their effects have been applied to account
/// balances; both happen inside a single storage transaction, so an
/// approved-but-unbalanced entry cannot exist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntryValues {
    pub id: JournalEntryId,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub status: JournalEntryStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLineValues>,
}

/// A single debit or credit against one account. Exactly one of `debit` and
/// `credit` is positive, the other is zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JournalLineValues {
    pub id: JournalLineId,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl JournalLineValues {
    /// Signed effect of this line on its account under the debit-positive
    /// convention.
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

impl JournalEntryValues {
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }
}
