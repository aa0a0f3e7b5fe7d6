//! Balance read models: account statements with running balances, and the
//! ledger-wide trial balance.
pub mod error;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::{
    primitives::*,
    store::{DateRange, LedgerStore},
};

use error::*;

/// One statement row: a journal line touching the account, with the
/// balance after applying it.
#[derive(Debug, Clone, Serialize)]
pub struct StatementLine {
    pub entry_id: JournalEntryId,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub running_balance: Decimal,
}

/// The ordered activity of one account over a date range.
///
/// Lines are ordered by entry date, ties broken by entry number (document
/// numbers are assigned from a monotonic sequence, so this is creation
/// order). Replaying the same range always yields the same statement.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatement {
    pub account_id: AccountId,
    pub opening_balance: Decimal,
    pub lines: Vec<StatementLine>,
    pub closing_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub debit_total: Decimal,
    pub credit_total: Decimal,
    pub balance: Decimal,
}

/// Per-account totals over all approved lines dated on or before `as_of`.
/// `total_debit == total_credit` holds for any as-of date; a difference
/// means the ledger itself is corrupt.
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

/// Read-only service computing balance reports by replaying approved
/// journal lines.
#[derive(Clone)]
pub struct Balances {
    store: Arc<dyn LedgerStore>,
}

impl Balances {
    pub(crate) fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "herdbook.balances.statement", skip(self), err)]
    pub async fn statement(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<AccountStatement, BalanceError> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or(BalanceError::AccountNotFound(account_id))?;

        // one pass over everything up to the range end: lines dated before
        // the range start fold into the opening balance
        let posted = self
            .store
            .posted_lines_for_account(
                account_id,
                DateRange {
                    from: None,
                    until: range.until,
                },
            )
            .await?;

        let mut opening_balance = Decimal::ZERO;
        let mut running = Decimal::ZERO;
        let mut lines = Vec::new();
        for line in posted {
            if range.from.is_some_and(|from| line.date < from) {
                opening_balance += line.signed_amount();
                running = opening_balance;
                continue;
            }
            running += line.signed_amount();
            lines.push(StatementLine {
                entry_id: line.entry_id,
                entry_number: line.entry_number,
                date: line.date,
                description: line.description,
                debit: line.debit,
                credit: line.credit,
                running_balance: running,
            });
        }

        Ok(AccountStatement {
            account_id,
            opening_balance,
            closing_balance: running,
            lines,
        })
    }

    #[instrument(name = "herdbook.balances.trial_balance", skip(self), err)]
    pub async fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalance, BalanceError> {
        let accounts = self.store.list_accounts().await?;
        let posted = self.store.posted_lines_through(as_of).await?;

        let mut totals: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();
        for line in posted {
            let entry = totals.entry(line.account_id).or_default();
            entry.0 += line.debit;
            entry.1 += line.credit;
        }

        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let rows = accounts
            .into_iter()
            .map(|account| {
                let (debit_total, credit_total) =
                    totals.remove(&account.id).unwrap_or_default();
                total_debit += debit_total;
                total_credit += credit_total;
                TrialBalanceRow {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    kind: account.kind,
                    debit_total,
                    credit_total,
                    balance: debit_total - credit_total,
                }
            })
            .collect();

        Ok(TrialBalance {
            as_of,
            rows,
            total_debit,
            total_credit,
        })
    }
}
