//! In-memory adapter for the [LedgerStore] port.
//!
//! All tables live behind a single `tokio::sync::Mutex`, so every store
//! call is one critical section: `commit_posting` and `finalize_entry`
//! validate against the current state first and only then mutate, giving
//! the same all-or-nothing and serialized-per-account guarantees as the
//! Postgres adapter.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{DateRange, DocCounter, LedgerStore, PostedLine, Posting, StoreError};
use crate::primitives::*;
use herdbook_core_types::{
    account::AccountValues, journal_entry::JournalEntryValues, transaction::TransactionValues,
    voucher::VoucherValues,
};

/// Sequence order for zero-padded document numbers: a longer number is a
/// later one, so length compares before the string itself.
fn by_document_number(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, AccountValues>,
    entries: HashMap<JournalEntryId, JournalEntryValues>,
    transactions: HashMap<TransactionId, TransactionValues>,
    vouchers: HashMap<VoucherId, VoucherValues>,
    sequences: HashMap<&'static str, u64>,
}

impl Tables {
    fn posted_lines(
        &self,
        account_id: Option<AccountId>,
        range: DateRange,
    ) -> Vec<PostedLine> {
        let mut entries: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.status == JournalEntryStatus::Approved && range.contains(e.date))
            .collect();
        entries.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| by_document_number(&a.entry_number, &b.entry_number))
        });

        let mut lines = Vec::new();
        for entry in entries {
            for line in &entry.lines {
                if account_id.map_or(true, |id| id == line.account_id) {
                    lines.push(PostedLine {
                        entry_id: entry.id,
                        entry_number: entry.entry_number.clone(),
                        date: entry.date,
                        description: entry.description.clone(),
                        account_id: line.account_id,
                        debit: line.debit,
                        credit: line.credit,
                    });
                }
            }
        }
        lines
    }

    fn apply_deltas(&mut self, deltas: &[(AccountId, Decimal)]) {
        for (account_id, delta) in deltas {
            let account = self
                .accounts
                .get_mut(account_id)
                .expect("accounts checked before applying deltas");
            account.balance += *delta;
        }
    }

    /// Every delta account must exist and be active at write time; a new
    /// account carried by the same posting counts as both.
    fn check_delta_accounts(
        &self,
        deltas: &[(AccountId, Decimal)],
        new_account: Option<&AccountValues>,
    ) -> Result<(), StoreError> {
        for (account_id, _) in deltas {
            if new_account.is_some_and(|a| a.id == *account_id) {
                continue;
            }
            match self.accounts.get(account_id) {
                None => return Err(StoreError::MissingRow("account")),
                Some(account) if !account.is_active() => {
                    return Err(StoreError::StaleWrite("account"))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn check_new_account(&self, account: &AccountValues) -> Result<(), StoreError> {
        if self.accounts.contains_key(&account.id) {
            return Err(StoreError::duplicate("account", account.id.to_string()));
        }
        if self.accounts.values().any(|a| a.code == account.code) {
            return Err(StoreError::duplicate("account_code", account.code.clone()));
        }
        Ok(())
    }
}

pub struct MemoryLedgerStore {
    inner: Mutex<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables::default()),
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn insert_account(&self, account: &AccountValues) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;
        tables.check_new_account(account)?;
        tables.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<AccountValues>, StoreError> {
        Ok(self.inner.lock().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AccountValues>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .accounts
            .values()
            .find(|a| a.code == code)
            .cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountValues>, StoreError> {
        let mut accounts: Vec<_> = self.inner.lock().await.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn deactivate_account(&self, id: AccountId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;
        let account = tables
            .accounts
            .get_mut(&id)
            .ok_or(StoreError::MissingRow("account"))?;
        if !account.is_active() || !account.balance.is_zero() {
            return Err(StoreError::StaleWrite("account"));
        }
        account.status = AccountStatus::Inactive;
        Ok(())
    }

    async fn insert_draft_entry(&self, entry: &JournalEntryValues) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;
        if tables.entries.contains_key(&entry.id) {
            return Err(StoreError::duplicate("journal_entry", entry.id.to_string()));
        }
        tables.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntryValues>, StoreError> {
        Ok(self.inner.lock().await.entries.get(&id).cloned())
    }

    async fn list_entries(&self) -> Result<Vec<JournalEntryValues>, StoreError> {
        let mut entries: Vec<_> = self.inner.lock().await.entries.values().cloned().collect();
        entries.sort_by(|a, b| by_document_number(&a.entry_number, &b.entry_number));
        Ok(entries)
    }

    async fn finalize_entry(
        &self,
        id: JournalEntryId,
        status: JournalEntryStatus,
        balance_deltas: &[(AccountId, Decimal)],
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;
        tables.check_delta_accounts(balance_deltas, None)?;
        let entry = tables
            .entries
            .get_mut(&id)
            .ok_or(StoreError::MissingRow("journal_entry"))?;
        if entry.status != JournalEntryStatus::Draft {
            return Err(StoreError::StaleWrite("journal_entry"));
        }
        entry.status = status;
        tables.apply_deltas(balance_deltas);
        Ok(())
    }

    async fn commit_posting(&self, posting: Posting) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;

        // validate everything up front so a failure leaves no partial state
        if let Some(account) = &posting.account {
            tables.check_new_account(account)?;
        }
        if tables.entries.contains_key(&posting.entry.id) {
            return Err(StoreError::duplicate(
                "journal_entry",
                posting.entry.id.to_string(),
            ));
        }
        tables.check_delta_accounts(&posting.balance_deltas, posting.account.as_ref())?;
        if let Some(transaction) = &posting.transaction {
            if tables.transactions.contains_key(&transaction.id) {
                return Err(StoreError::duplicate(
                    "transaction",
                    transaction.id.to_string(),
                ));
            }
            if let Some(original_id) = transaction.reversal_of {
                if tables
                    .transactions
                    .values()
                    .any(|t| t.reversal_of == Some(original_id))
                {
                    return Err(StoreError::duplicate("reversal", original_id.to_string()));
                }
            }
        }
        if let Some(voucher) = &posting.voucher {
            if tables.vouchers.contains_key(&voucher.id) {
                return Err(StoreError::duplicate("voucher", voucher.id.to_string()));
            }
            if tables
                .vouchers
                .values()
                .any(|v| v.transaction_id == voucher.transaction_id)
            {
                return Err(StoreError::duplicate(
                    "voucher_for_transaction",
                    voucher.transaction_id.to_string(),
                ));
            }
        }

        if let Some(account) = posting.account {
            tables.accounts.insert(account.id, account);
        }
        tables.entries.insert(posting.entry.id, posting.entry);
        if let Some(transaction) = posting.transaction {
            tables.transactions.insert(transaction.id, transaction);
        }
        if let Some(voucher) = posting.voucher {
            tables.vouchers.insert(voucher.id, voucher);
        }
        tables.apply_deltas(&posting.balance_deltas);
        Ok(())
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError> {
        Ok(self.inner.lock().await.transactions.get(&id).cloned())
    }

    async fn find_reversal_of(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .transactions
            .values()
            .find(|t| t.reversal_of == Some(id))
            .cloned())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionValues>, StoreError> {
        let mut transactions: Vec<_> = self
            .inner
            .lock()
            .await
            .transactions
            .values()
            .cloned()
            .collect();
        transactions
            .sort_by(|a, b| by_document_number(&a.transaction_number, &b.transaction_number));
        Ok(transactions)
    }

    async fn find_voucher(&self, id: VoucherId) -> Result<Option<VoucherValues>, StoreError> {
        Ok(self.inner.lock().await.vouchers.get(&id).cloned())
    }

    async fn find_voucher_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<VoucherValues>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .vouchers
            .values()
            .find(|v| v.transaction_id == transaction_id)
            .cloned())
    }

    async fn list_vouchers(&self) -> Result<Vec<VoucherValues>, StoreError> {
        let mut vouchers: Vec<_> = self.inner.lock().await.vouchers.values().cloned().collect();
        vouchers.sort_by(|a, b| by_document_number(&a.voucher_number, &b.voucher_number));
        Ok(vouchers)
    }

    async fn posted_lines_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<PostedLine>, StoreError> {
        Ok(self
            .inner
            .lock()
            .await
            .posted_lines(Some(account_id), range))
    }

    async fn posted_lines_through(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let range = DateRange {
            from: None,
            until: Some(as_of),
        };
        Ok(self.inner.lock().await.posted_lines(None, range))
    }

    async fn next_seq(&self, counter: DocCounter) -> Result<u64, StoreError> {
        let mut tables = self.inner.lock().await;
        let seq = tables.sequences.entry(counter.key()).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }
}
