use serde::{Deserialize, Serialize};

crate::entity_id! { AccountId }
crate::entity_id! { JournalEntryId }
crate::entity_id! { JournalLineId }
crate::entity_id! { TransactionId }
crate::entity_id! { VoucherId }

/// What a ledger account represents.
///
/// `Supplier` and `Customer` accounts track a party's position against the
/// farm; `CostCenter` accounts absorb the expense/revenue/cash side of
/// postings; the single `Equity` account is the opening-balances
/// counterparty.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountKind {
    Supplier,
    Customer,
    CostCenter,
    Equity,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JournalEntryStatus {
    Draft,
    Approved,
    Rejected,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Sale,
    Payment,
    Receipt,
}

impl TransactionType {
    /// Whether transactions of this type move cash and therefore carry a
    /// voucher.
    pub fn is_cash_movement(&self) -> bool {
        self.voucher_type().is_some()
    }

    /// The voucher document type issued for this transaction type, if it
    /// moves cash.
    pub fn voucher_type(&self) -> Option<VoucherType> {
        match self {
            Self::Payment => Some(VoucherType::Payment),
            Self::Receipt => Some(VoucherType::Receipt),
            Self::Purchase | Self::Sale => None,
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoucherType {
    Receipt,
    Payment,
}

impl VoucherType {
    /// The document type for cash flowing the other way, used when a cash
    /// movement is reversed.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Receipt => Self::Payment,
            Self::Payment => Self::Receipt,
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoucherStatus {
    Issued,
    Reversal,
}

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
}
