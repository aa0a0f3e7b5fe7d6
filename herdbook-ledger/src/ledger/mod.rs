pub mod config;
pub mod error;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

pub use config::*;
pub use error::*;

use crate::{
    account::{AccountValues, Accounts, SystemAccounts},
    balance::{AccountStatement, Balances, TrialBalance},
    journal_entry::{has_minor_unit_scale, synthesized_entry, JournalEntries},
    primitives::*,
    store::{DateRange, DocCounter, LedgerStore, PgLedgerStore, Posting, StoreError},
    transaction::{error::TransactionError, TransactionInput, TransactionValues, Transactions},
    voucher::{VoucherValues, Vouchers},
};

/// The ledger core: the sole mutator of account balances.
///
/// Every balance change goes through one of three paths:
/// [record_transaction](Self::record_transaction),
/// [reverse_transaction](Self::reverse_transaction), or the approval of a
/// manual journal entry. Each of them persists a balanced journal entry
/// together with its balance effect in a single storage transaction.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    accounts: Accounts,
    journal_entries: JournalEntries,
    transactions: Transactions,
    vouchers: Vouchers,
    balances: Balances,
    system: SystemAccounts,
}

impl Ledger {
    pub async fn init(config: LedgerConfig) -> Result<Self, LedgerError> {
        let pool = match (config.pool, config.pg_con) {
            (Some(pool), None) => pool,
            (None, Some(pg_con)) => {
                let mut pool_opts = sqlx::postgres::PgPoolOptions::new();
                if let Some(max_connections) = config.max_connections {
                    pool_opts = pool_opts.max_connections(max_connections);
                }
                pool_opts.connect(&pg_con).await?
            }
            _ => {
                return Err(LedgerError::ConfigError(
                    "One of pg_con or pool must be set".to_string(),
                ))
            }
        };
        let store = PgLedgerStore::new(pool);
        if config.exec_migrations {
            store.migrate().await?;
        }
        Self::with_store_and_codes(Arc::new(store), config.system_account_codes).await
    }

    /// Builds a ledger on any [LedgerStore] adapter with the default
    /// system account codes.
    pub async fn with_store(store: Arc<dyn LedgerStore>) -> Result<Self, LedgerError> {
        Self::with_store_and_codes(store, SystemAccountCodes::default()).await
    }

    /// Builds a ledger on any [LedgerStore] adapter and bootstraps the
    /// system accounts (idempotent, keyed by account code).
    pub async fn with_store_and_codes(
        store: Arc<dyn LedgerStore>,
        codes: SystemAccountCodes,
    ) -> Result<Self, LedgerError> {
        let system = SystemAccounts {
            purchases: Self::ensure_system_account(
                &store,
                &codes.purchases,
                AccountKind::CostCenter,
                "Purchases & Inventory",
            )
            .await?,
            sales: Self::ensure_system_account(
                &store,
                &codes.sales,
                AccountKind::CostCenter,
                "Sales Revenue",
            )
            .await?,
            cash: Self::ensure_system_account(
                &store,
                &codes.cash,
                AccountKind::CostCenter,
                "Cash & Bank",
            )
            .await?,
            opening: Self::ensure_system_account(
                &store,
                &codes.opening,
                AccountKind::Equity,
                "Opening Balances",
            )
            .await?,
        };
        Ok(Self {
            accounts: Accounts::new(store.clone(), system),
            journal_entries: JournalEntries::new(store.clone()),
            transactions: Transactions::new(store.clone()),
            vouchers: Vouchers::new(store.clone()),
            balances: Balances::new(store.clone()),
            system,
            store,
        })
    }

    async fn ensure_system_account(
        store: &Arc<dyn LedgerStore>,
        code: &str,
        kind: AccountKind,
        name: &str,
    ) -> Result<AccountId, LedgerError> {
        if let Some(account) = store.find_account_by_code(code).await? {
            return Ok(account.id);
        }
        let account = AccountValues {
            id: AccountId::new(),
            code: code.to_string(),
            kind,
            name: name.to_string(),
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };
        match store.insert_account(&account).await {
            Ok(()) => Ok(account.id),
            // another process won the bootstrap race
            Err(StoreError::Duplicate { .. }) => Ok(store
                .find_account_by_code(code)
                .await?
                .ok_or(StoreError::MissingRow("account"))?
                .id),
            Err(e) => Err(e.into()),
        }
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn journal_entries(&self) -> &JournalEntries {
        &self.journal_entries
    }

    pub fn transactions(&self) -> &Transactions {
        &self.transactions
    }

    pub fn vouchers(&self) -> &Vouchers {
        &self.vouchers
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn system_accounts(&self) -> &SystemAccounts {
        &self.system
    }

    /// Records a business transaction: synthesizes the balanced journal
    /// entry for the transaction type, applies it to balances, and issues a
    /// voucher for cash movements, all in one atomic unit.
    #[instrument(name = "herdbook.ledger.record_transaction", skip(self), err)]
    pub async fn record_transaction(
        &self,
        input: TransactionInput,
    ) -> Result<TransactionValues, LedgerError> {
        if input.amount <= Decimal::ZERO || !has_minor_unit_scale(&input.amount) {
            return Err(TransactionError::InvalidAmount(input.amount).into());
        }
        let entity = self
            .store
            .find_account(input.entity_id)
            .await
            .map_err(TransactionError::from)?
            .ok_or(TransactionError::UnknownEntity(input.entity_id))?;
        if !entity.is_active() {
            return Err(TransactionError::InactiveEntity(entity.id).into());
        }
        // only party accounts transact; cost centers and the equity
        // account are reached through the posting rules, never directly
        if !matches!(entity.kind, AccountKind::Supplier | AccountKind::Customer) {
            return Err(TransactionError::InvalidEntityKind(entity.id, entity.kind).into());
        }

        let voucher_payment_method = match (input.tx_type.voucher_type(), input.payment_method) {
            (Some(_), None) => {
                return Err(TransactionError::MissingPaymentMethod(input.tx_type).into())
            }
            (Some(_), Some(method)) => Some(method),
            (None, _) => None,
        };

        let entry_seq = self.store.next_seq(DocCounter::JournalEntry).await?;
        let tx_seq = self.store.next_seq(DocCounter::Transaction).await?;
        let transaction_number = format!("TXN-{tx_seq:06}");

        let (debit_account, credit_account) = self.posting_accounts(input.tx_type, entity.id);
        let entry = synthesized_entry(
            format!("JE-{entry_seq:06}"),
            input.date,
            format!("{} {} - {}", input.tx_type, transaction_number, entity.name),
            "ledger",
            debit_account,
            credit_account,
            input.amount,
        );

        let transaction = TransactionValues {
            id: TransactionId::new(),
            transaction_number,
            tx_type: input.tx_type,
            date: input.date,
            entity_id: entity.id,
            amount: input.amount,
            payment_method: input.payment_method,
            journal_entry_id: entry.id,
            related_type: input.related_type,
            related_id: input.related_id,
            reversal_of: None,
            notes: input.notes,
            created_at: Utc::now(),
        };

        let voucher = match (input.tx_type.voucher_type(), voucher_payment_method) {
            (Some(voucher_type), Some(payment_method)) => {
                let voucher_seq = self.store.next_seq(DocCounter::Voucher).await?;
                Some(VoucherValues {
                    id: VoucherId::new(),
                    voucher_number: format!("VCH-{voucher_seq:06}"),
                    voucher_type,
                    date: input.date,
                    amount: input.amount,
                    entity_id: entity.id,
                    transaction_id: transaction.id,
                    payment_method,
                    status: VoucherStatus::Issued,
                    created_at: Utc::now(),
                })
            }
            _ => None,
        };

        self.store
            .commit_posting(Posting {
                account: None,
                entry,
                transaction: Some(transaction.clone()),
                voucher,
                balance_deltas: vec![
                    (debit_account, input.amount),
                    (credit_account, -input.amount),
                ],
            })
            .await
            .map_err(TransactionError::from)?;
        Ok(transaction)
    }

    /// Records a reversing transaction that nets the original to zero. The
    /// original is untouched; history is append-only. Reversing a cash
    /// movement issues a voucher of the inverse type with status
    /// `Reversal`.
    #[instrument(name = "herdbook.ledger.reverse_transaction", skip(self), err)]
    pub async fn reverse_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TransactionValues, LedgerError> {
        let original = self
            .store
            .find_transaction(transaction_id)
            .await
            .map_err(TransactionError::from)?
            .ok_or(TransactionError::NotFound(transaction_id))?;
        if original.is_reversal() {
            return Err(TransactionError::CannotReverseReversal(transaction_id).into());
        }
        if self
            .store
            .find_reversal_of(transaction_id)
            .await
            .map_err(TransactionError::from)?
            .is_some()
        {
            return Err(TransactionError::AlreadyReversed(transaction_id).into());
        }

        let entry_seq = self.store.next_seq(DocCounter::JournalEntry).await?;
        let tx_seq = self.store.next_seq(DocCounter::Transaction).await?;
        let date = Utc::now().date_naive();
        let description = format!("Reversal of {}", original.transaction_number);

        // same accounts as the original posting, sides swapped
        let (debit_account, credit_account) =
            self.posting_accounts(original.tx_type, original.entity_id);
        let (debit_account, credit_account) = (credit_account, debit_account);

        let entry = synthesized_entry(
            format!("JE-{entry_seq:06}"),
            date,
            description.clone(),
            "ledger",
            debit_account,
            credit_account,
            original.amount,
        );

        let reversal = TransactionValues {
            id: TransactionId::new(),
            transaction_number: format!("TXN-{tx_seq:06}"),
            tx_type: original.tx_type,
            date,
            entity_id: original.entity_id,
            amount: original.amount,
            payment_method: original.payment_method,
            journal_entry_id: entry.id,
            related_type: original.related_type.clone(),
            related_id: original.related_id,
            reversal_of: Some(original.id),
            notes: Some(description),
            created_at: Utc::now(),
        };

        let voucher = match original.tx_type.voucher_type() {
            Some(original_type) => {
                let payment_method = original
                    .payment_method
                    .ok_or(TransactionError::MissingPaymentMethod(original.tx_type))?;
                let voucher_seq = self.store.next_seq(DocCounter::Voucher).await?;
                Some(VoucherValues {
                    id: VoucherId::new(),
                    voucher_number: format!("VCH-{voucher_seq:06}"),
                    voucher_type: original_type.inverse(),
                    date,
                    amount: original.amount,
                    entity_id: original.entity_id,
                    transaction_id: reversal.id,
                    payment_method,
                    status: VoucherStatus::Reversal,
                    created_at: Utc::now(),
                })
            }
            None => None,
        };

        match self
            .store
            .commit_posting(Posting {
                account: None,
                entry,
                transaction: Some(reversal.clone()),
                voucher,
                balance_deltas: vec![
                    (debit_account, original.amount),
                    (credit_account, -original.amount),
                ],
            })
            .await
        {
            // lost a race against a concurrent reversal of the same original
            Err(StoreError::Duplicate {
                entity: "reversal", ..
            }) => return Err(TransactionError::AlreadyReversed(transaction_id).into()),
            other => other.map_err(TransactionError::from)?,
        }
        Ok(reversal)
    }

    #[instrument(name = "herdbook.ledger.account_statement", skip(self), err)]
    pub async fn account_statement(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountStatement, LedgerError> {
        Ok(self.balances.statement(account_id, range).await?)
    }

    #[instrument(name = "herdbook.ledger.trial_balance", skip(self), err)]
    pub async fn trial_balance(
        &self,
        as_of: chrono::NaiveDate,
    ) -> Result<TrialBalance, LedgerError> {
        Ok(self.balances.trial_balance(as_of).await?)
    }

    fn posting_accounts(
        &self,
        tx_type: TransactionType,
        entity_id: AccountId,
    ) -> (AccountId, AccountId) {
        match tx_type {
            TransactionType::Purchase => (self.system.purchases, entity_id),
            TransactionType::Sale => (entity_id, self.system.sales),
            TransactionType::Payment => (entity_id, self.system.cash),
            TransactionType::Receipt => (self.system.cash, entity_id),
        }
    }
}
