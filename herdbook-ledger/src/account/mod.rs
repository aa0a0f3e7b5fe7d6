//! Account registry: the only place balances are initialized, and the only
//! writer of account status.
mod entity;
pub mod error;

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::{
    journal_entry::synthesized_entry,
    primitives::*,
    store::{DocCounter, LedgerStore, Posting, StoreError},
};

pub use entity::*;
use error::*;

/// Ids of the bootstrapped accounts the ledger itself posts against:
/// the expense/revenue/cash sides of business transactions and the
/// opening-balances equity account.
#[derive(Debug, Clone, Copy)]
pub struct SystemAccounts {
    pub purchases: AccountId,
    pub sales: AccountId,
    pub cash: AccountId,
    pub opening: AccountId,
}

/// Service for working with `Account` entities.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn LedgerStore>,
    system: SystemAccounts,
}

impl Accounts {
    pub(crate) fn new(store: Arc<dyn LedgerStore>, system: SystemAccounts) -> Self {
        Self { store, system }
    }

    #[instrument(name = "herdbook.accounts.create", skip(self), err)]
    pub async fn create(&self, new_account: NewAccount) -> Result<AccountValues, AccountError> {
        let opening_balance = new_account.opening_balance();
        let mut account = new_account.into_values(Utc::now());

        if opening_balance.is_zero() {
            match self.store.insert_account(&account).await {
                Err(StoreError::Duplicate {
                    entity: "account_code",
                    value,
                }) => return Err(AccountError::DuplicateCode(value)),
                other => other?,
            }
            return Ok(account);
        }

        // the account and its opening entry travel in one posting, so
        // neither can be persisted without the other
        let seq = self.store.next_seq(DocCounter::JournalEntry).await?;
        let (debit_account, credit_account) = if opening_balance.is_sign_positive() {
            (account.id, self.system.opening)
        } else {
            (self.system.opening, account.id)
        };
        let entry = synthesized_entry(
            format!("JE-{seq:06}"),
            Utc::now().date_naive(),
            format!("Opening balance - {}", account.name),
            "registry",
            debit_account,
            credit_account,
            opening_balance.abs(),
        );
        match self
            .store
            .commit_posting(Posting {
                account: Some(account.clone()),
                entry,
                transaction: None,
                voucher: None,
                balance_deltas: vec![
                    (account.id, opening_balance),
                    (self.system.opening, -opening_balance),
                ],
            })
            .await
        {
            Err(StoreError::Duplicate {
                entity: "account_code",
                value,
            }) => return Err(AccountError::DuplicateCode(value)),
            other => other?,
        }
        account.balance = opening_balance;
        Ok(account)
    }

    /// Soft-deactivates an account. Accounts referenced by journal lines are
    /// never deleted; an account can only leave service once its balance is
    /// settled to exactly zero. The store enforces both conditions in the
    /// same write that flips the status, so a posting racing this call
    /// either lands before it (and the deactivation fails) or is refused
    /// against the now-inactive account.
    #[instrument(name = "herdbook.accounts.deactivate", skip(self), err)]
    pub async fn deactivate(&self, id: AccountId) -> Result<AccountValues, AccountError> {
        let mut account = self.find_by_id(id).await?;
        if !account.is_active() {
            return Err(AccountError::Inactive(id));
        }
        if !account.balance.is_zero() {
            return Err(AccountError::HasOpenBalance {
                id,
                balance: account.balance,
            });
        }
        match self.store.deactivate_account(id).await {
            // a posting or deactivation won the race; report fresh state
            Err(StoreError::StaleWrite(_)) => {
                let account = self.find_by_id(id).await?;
                if !account.is_active() {
                    return Err(AccountError::Inactive(id));
                }
                return Err(AccountError::HasOpenBalance {
                    id,
                    balance: account.balance,
                });
            }
            other => other?,
        }
        account.status = AccountStatus::Inactive;
        Ok(account)
    }

    #[instrument(name = "herdbook.accounts.find_by_id", skip(self), err)]
    pub async fn find_by_id(&self, id: AccountId) -> Result<AccountValues, AccountError> {
        self.store
            .find_account(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    #[instrument(name = "herdbook.accounts.find_by_code", skip(self), err)]
    pub async fn find_by_code(&self, code: &str) -> Result<AccountValues, AccountError> {
        self.store
            .find_account_by_code(code)
            .await?
            .ok_or_else(|| AccountError::CodeNotFound(code.to_string()))
    }

    #[instrument(name = "herdbook.accounts.list", skip(self), err)]
    pub async fn list(&self) -> Result<Vec<AccountValues>, AccountError> {
        Ok(self.store.list_accounts().await?)
    }
}
