//! Manual journal entries with the draft -> approved | rejected state
//! machine. Balance effects are applied exactly once, at approval, in the
//! same storage transaction that moves the entry out of draft.
mod entity;
pub mod error;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::{
    primitives::*,
    store::{DocCounter, LedgerStore, StoreError},
};

pub use entity::*;
pub(crate) use entity::{has_minor_unit_scale, synthesized_entry};
use error::*;

/// Service for working with `JournalEntry` entities.
#[derive(Clone)]
pub struct JournalEntries {
    store: Arc<dyn LedgerStore>,
}

impl JournalEntries {
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "herdbook.journal_entries.create_draft", skip(self), err)]
    pub async fn create_draft(
        &self,
        new_entry: NewJournalEntry,
    ) -> Result<JournalEntryValues, JournalEntryError> {
        let seq = self.store.next_seq(DocCounter::JournalEntry).await?;
        let entry = new_entry.into_values(
            JournalEntryId::new(),
            format!("JE-{seq:06}"),
            Utc::now(),
        );
        self.store.insert_draft_entry(&entry).await?;
        Ok(entry)
    }

    /// Approves a draft: verifies every line's account is active, verifies
    /// exact debit/credit equality, then applies the line effects to
    /// account balances atomically with the status change.
    #[instrument(name = "herdbook.journal_entries.approve", skip(self), err)]
    pub async fn approve(
        &self,
        id: JournalEntryId,
    ) -> Result<JournalEntryValues, JournalEntryError> {
        let mut entry = self.find_by_id(id).await?;
        if entry.status != JournalEntryStatus::Draft {
            return Err(JournalEntryError::AlreadyFinalized(id));
        }
        if !entry.is_balanced() {
            return Err(JournalEntryError::Unbalanced {
                debits: entry.total_debit(),
                credits: entry.total_credit(),
            });
        }

        let mut deltas: BTreeMap<AccountId, Decimal> = BTreeMap::new();
        for line in &entry.lines {
            *deltas.entry(line.account_id).or_default() += line.signed_amount();
        }
        for account_id in deltas.keys() {
            let account = self
                .store
                .find_account(*account_id)
                .await?
                .ok_or(JournalEntryError::AccountNotFound(*account_id))?;
            if !account.is_active() {
                return Err(JournalEntryError::AccountInactive(*account_id));
            }
        }

        let deltas: Vec<_> = deltas.into_iter().collect();
        match self
            .store
            .finalize_entry(id, JournalEntryStatus::Approved, &deltas)
            .await
        {
            Err(StoreError::StaleWrite("journal_entry")) => {
                return Err(JournalEntryError::AlreadyFinalized(id))
            }
            other => other?,
        }
        entry.status = JournalEntryStatus::Approved;
        Ok(entry)
    }

    /// Rejects a draft: terminal, no balance effect.
    #[instrument(name = "herdbook.journal_entries.reject", skip(self), err)]
    pub async fn reject(
        &self,
        id: JournalEntryId,
    ) -> Result<JournalEntryValues, JournalEntryError> {
        let mut entry = self.find_by_id(id).await?;
        if entry.status != JournalEntryStatus::Draft {
            return Err(JournalEntryError::AlreadyFinalized(id));
        }
        match self
            .store
            .finalize_entry(id, JournalEntryStatus::Rejected, &[])
            .await
        {
            Err(StoreError::StaleWrite("journal_entry")) => {
                return Err(JournalEntryError::AlreadyFinalized(id))
            }
            other => other?,
        }
        entry.status = JournalEntryStatus::Rejected;
        Ok(entry)
    }

    #[instrument(name = "herdbook.journal_entries.find_by_id", skip(self), err)]
    pub async fn find_by_id(
        &self,
        id: JournalEntryId,
    ) -> Result<JournalEntryValues, JournalEntryError> {
        self.store
            .find_entry(id)
            .await?
            .ok_or(JournalEntryError::NotFound(id))
    }

    #[instrument(name = "herdbook.journal_entries.list", skip(self), err)]
    pub async fn list(&self) -> Result<Vec<JournalEntryValues>, JournalEntryError> {
        Ok(self.store.list_entries().await?)
    }
}
