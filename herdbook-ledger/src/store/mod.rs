//! Storage port for the ledger core.
//!
//! Everything the ledger persists goes through [LedgerStore]. The one write
//! that touches balances is [LedgerStore::commit_posting]: it applies
//! balance deltas as `balance = balance + delta` inside the same storage
//! transaction that inserts the journal lines, under per-account locking,
//! so a posting is either fully visible or not at all and concurrent
//! postings against one account serialize instead of losing updates.

pub mod error;
mod memory;
mod pg;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::primitives::*;
use herdbook_core_types::{
    account::AccountValues, journal_entry::JournalEntryValues, transaction::TransactionValues,
    voucher::VoucherValues,
};

pub use error::StoreError;
pub use memory::MemoryLedgerStore;
pub use pg::PgLedgerStore;

/// The atomic unit persisted by `commit_posting`.
///
/// `entry` is always present and already `Approved`; `transaction` and
/// `voucher` accompany it for business transactions and cash movements
/// respectively. `account` carries a brand-new account registered together
/// with its opening-balance entry, so neither can exist without the other.
/// `balance_deltas` carry the signed (debit-positive) effect of the entry's
/// lines per account.
#[derive(Debug, Clone)]
pub struct Posting {
    pub account: Option<AccountValues>,
    pub entry: JournalEntryValues,
    pub transaction: Option<TransactionValues>,
    pub voucher: Option<VoucherValues>,
    pub balance_deltas: Vec<(AccountId, Decimal)>,
}

/// Inclusive date range filter. `None` bounds are open.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.until.map_or(true, |u| date <= u)
    }
}

/// A journal line of an approved entry joined with its entry header, as
/// returned by the statement/trial-balance queries.
///
/// Stores return these ordered by entry date, then entry number compared
/// numerically (length before lexicographic order, which is sequence order
/// for the zero-padded `JE-` numbers even past the padding width), then
/// line position. Re-querying yields the same sequence.
#[derive(Debug, Clone)]
pub struct PostedLine {
    pub entry_id: JournalEntryId,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl PostedLine {
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Named monotonic counters backing the human-readable document numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocCounter {
    JournalEntry,
    Transaction,
    Voucher,
}

impl DocCounter {
    pub(crate) fn key(&self) -> &'static str {
        match self {
            Self::JournalEntry => "journal_entry",
            Self::Transaction => "transaction",
            Self::Voucher => "voucher",
        }
    }
}

#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    async fn insert_account(&self, account: &AccountValues) -> Result<(), StoreError>;
    async fn find_account(&self, id: AccountId) -> Result<Option<AccountValues>, StoreError>;
    async fn find_account_by_code(&self, code: &str)
        -> Result<Option<AccountValues>, StoreError>;
    async fn list_accounts(&self) -> Result<Vec<AccountValues>, StoreError>;
    /// Deactivates the account in one conditional write: the status flips
    /// only if the account is still active with an exactly-zero balance at
    /// write time. Fails with [StoreError::StaleWrite] otherwise, so a
    /// posting that lands between the caller's read and this write can
    /// never strand a balance on an inactive account.
    async fn deactivate_account(&self, id: AccountId) -> Result<(), StoreError>;

    async fn insert_draft_entry(&self, entry: &JournalEntryValues) -> Result<(), StoreError>;
    async fn find_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntryValues>, StoreError>;
    async fn list_entries(&self) -> Result<Vec<JournalEntryValues>, StoreError>;
    /// Moves a draft entry to a terminal status and applies the given
    /// balance deltas in one unit. Fails with [StoreError::StaleWrite] if
    /// the entry is no longer in draft, so two concurrent approvals cannot
    /// both apply.
    async fn finalize_entry(
        &self,
        id: JournalEntryId,
        status: JournalEntryStatus,
        balance_deltas: &[(AccountId, Decimal)],
    ) -> Result<(), StoreError>;

    /// Persists a [Posting] all-or-nothing. Every delta account is
    /// re-verified to exist and be active under the same lock that applies
    /// the deltas; an account deactivated since the caller's read fails the
    /// whole posting with [StoreError::StaleWrite].
    async fn commit_posting(&self, posting: Posting) -> Result<(), StoreError>;

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError>;
    async fn find_reversal_of(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError>;
    async fn list_transactions(&self) -> Result<Vec<TransactionValues>, StoreError>;

    async fn find_voucher(&self, id: VoucherId) -> Result<Option<VoucherValues>, StoreError>;
    async fn find_voucher_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<VoucherValues>, StoreError>;
    async fn list_vouchers(&self) -> Result<Vec<VoucherValues>, StoreError>;

    /// Lines of approved entries touching one account, ordered as described
    /// on [PostedLine].
    async fn posted_lines_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<PostedLine>, StoreError>;
    /// Lines of all approved entries dated on or before `as_of`.
    async fn posted_lines_through(&self, as_of: NaiveDate)
        -> Result<Vec<PostedLine>, StoreError>;

    async fn next_seq(&self, counter: DocCounter) -> Result<u64, StoreError>;
}
