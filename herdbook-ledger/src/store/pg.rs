//! Postgres adapter for the [LedgerStore] port.
//!
//! Writes that touch balances run in a single sqlx transaction with the
//! affected account rows locked `FOR UPDATE` in id order, so concurrent
//! postings against the same account serialize at the row level and a
//! rollback leaves nothing behind.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction as DbTransaction};

use super::{DateRange, DocCounter, LedgerStore, Posting, PostedLine, StoreError};
use crate::primitives::*;
use herdbook_core_types::{
    account::AccountValues,
    journal_entry::{JournalEntryValues, JournalLineValues},
    transaction::TransactionValues,
    voucher::VoucherValues,
};

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    async fn lock_accounts(
        tx: &mut DbTransaction<'_, Postgres>,
        deltas: &[(AccountId, Decimal)],
    ) -> Result<(), StoreError> {
        if deltas.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<uuid::Uuid> = deltas.iter().map(|(id, _)| (*id).into()).collect();
        ids.sort();
        ids.dedup();
        let locked = sqlx::query(
            r#"
            SELECT id, status FROM accounts
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await?;
        if locked.len() != ids.len() {
            return Err(StoreError::MissingRow("account"));
        }
        // status is re-read under the lock: a concurrent deactivation fails
        // the whole posting instead of landing a balance on a closed account
        for row in &locked {
            if row.get::<String, _>("status") != AccountStatus::Active.to_string() {
                return Err(StoreError::StaleWrite("account"));
            }
        }
        Ok(())
    }

    async fn apply_deltas(
        tx: &mut DbTransaction<'_, Postgres>,
        deltas: &[(AccountId, Decimal)],
    ) -> Result<(), StoreError> {
        for (account_id, delta) in deltas {
            sqlx::query("UPDATE accounts SET balance = balance + $2 WHERE id = $1")
                .bind(uuid::Uuid::from(account_id))
                .bind(delta)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    async fn insert_account_row<'e, E>(executor: E, account: &AccountValues) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, code, kind, name, balance, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(uuid::Uuid::from(account.id))
        .bind(&account.code)
        .bind(account.kind.to_string())
        .bind(&account.name)
        .bind(account.balance)
        .bind(account.status.to_string())
        .bind(account.created_at)
        .execute(executor)
        .await
        .map_err(|e| map_unique(e, "account_code", &account.code))?;
        Ok(())
    }

    async fn insert_entry_rows(
        tx: &mut DbTransaction<'_, Postgres>,
        entry: &JournalEntryValues,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO journal_entries
            (id, entry_number, entry_date, description, status, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(uuid::Uuid::from(entry.id))
        .bind(&entry.entry_number)
        .bind(entry.date)
        .bind(&entry.description)
        .bind(entry.status.to_string())
        .bind(&entry.created_by)
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_unique(e, "journal_entry", &entry.entry_number))?;

        for (line_no, line) in entry.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO journal_lines
                (id, entry_id, line_no, account_id, debit, credit)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(uuid::Uuid::from(line.id))
            .bind(uuid::Uuid::from(entry.id))
            .bind(line_no as i32)
            .bind(uuid::Uuid::from(line.account_id))
            .bind(line.debit)
            .bind(line.credit)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn load_lines(
        &self,
        entry_ids: &[uuid::Uuid],
    ) -> Result<std::collections::HashMap<JournalEntryId, Vec<JournalLineValues>>, StoreError>
    {
        let rows = sqlx::query(
            r#"
            SELECT id, entry_id, account_id, debit, credit
            FROM journal_lines
            WHERE entry_id = ANY($1)
            ORDER BY entry_id, line_no
            "#,
        )
        .bind(entry_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut lines: std::collections::HashMap<JournalEntryId, Vec<JournalLineValues>> =
            std::collections::HashMap::new();
        for row in rows {
            let entry_id = JournalEntryId::from(row.get::<uuid::Uuid, _>("entry_id"));
            lines.entry(entry_id).or_default().push(JournalLineValues {
                id: JournalLineId::from(row.get::<uuid::Uuid, _>("id")),
                account_id: AccountId::from(row.get::<uuid::Uuid, _>("account_id")),
                debit: row.get("debit"),
                credit: row.get("credit"),
            });
        }
        Ok(lines)
    }
}

fn map_unique(err: sqlx::Error, entity: &'static str, value: &str) -> StoreError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            StoreError::duplicate(entity, value.to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

/// The name of the violated unique constraint, if this is one.
fn unique_constraint(err: &sqlx::Error) -> Option<&str> {
    err.as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| db_err.constraint())
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<AccountValues, StoreError> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    Ok(AccountValues {
        id: AccountId::from(row.get::<uuid::Uuid, _>("id")),
        code: row.get("code"),
        kind: kind
            .parse()
            .map_err(|e| StoreError::decode("account.kind", e))?,
        name: row.get("name"),
        balance: row.get("balance"),
        status: status
            .parse()
            .map_err(|e| StoreError::decode("account.status", e))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn entry_header_from_row(
    row: &sqlx::postgres::PgRow,
    lines: Vec<JournalLineValues>,
) -> Result<JournalEntryValues, StoreError> {
    let status: String = row.get("status");
    Ok(JournalEntryValues {
        id: JournalEntryId::from(row.get::<uuid::Uuid, _>("id")),
        entry_number: row.get("entry_number"),
        date: row.get("entry_date"),
        description: row.get("description"),
        status: status
            .parse()
            .map_err(|e| StoreError::decode("journal_entry.status", e))?,
        created_by: row.get("created_by"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        lines,
    })
}

fn transaction_from_row(row: &sqlx::postgres::PgRow) -> Result<TransactionValues, StoreError> {
    let tx_type: String = row.get("tx_type");
    let payment_method: Option<String> = row.get("payment_method");
    Ok(TransactionValues {
        id: TransactionId::from(row.get::<uuid::Uuid, _>("id")),
        transaction_number: row.get("transaction_number"),
        tx_type: tx_type
            .parse()
            .map_err(|e| StoreError::decode("transaction.tx_type", e))?,
        date: row.get("tx_date"),
        entity_id: AccountId::from(row.get::<uuid::Uuid, _>("entity_id")),
        amount: row.get("amount"),
        payment_method: payment_method
            .map(|m| m.parse())
            .transpose()
            .map_err(|e| StoreError::decode("transaction.payment_method", e))?,
        journal_entry_id: JournalEntryId::from(row.get::<uuid::Uuid, _>("journal_entry_id")),
        related_type: row.get("related_type"),
        related_id: row.get("related_id"),
        reversal_of: row
            .get::<Option<uuid::Uuid>, _>("reversal_of")
            .map(TransactionId::from),
        notes: row.get("notes"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn voucher_from_row(row: &sqlx::postgres::PgRow) -> Result<VoucherValues, StoreError> {
    let voucher_type: String = row.get("voucher_type");
    let payment_method: String = row.get("payment_method");
    let status: String = row.get("status");
    Ok(VoucherValues {
        id: VoucherId::from(row.get::<uuid::Uuid, _>("id")),
        voucher_number: row.get("voucher_number"),
        voucher_type: voucher_type
            .parse()
            .map_err(|e| StoreError::decode("voucher.voucher_type", e))?,
        date: row.get("voucher_date"),
        amount: row.get("amount"),
        entity_id: AccountId::from(row.get::<uuid::Uuid, _>("entity_id")),
        transaction_id: TransactionId::from(row.get::<uuid::Uuid, _>("transaction_id")),
        payment_method: payment_method
            .parse()
            .map_err(|e| StoreError::decode("voucher.payment_method", e))?,
        status: status
            .parse()
            .map_err(|e| StoreError::decode("voucher.status", e))?,
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn posted_line_from_row(row: &sqlx::postgres::PgRow) -> PostedLine {
    PostedLine {
        entry_id: JournalEntryId::from(row.get::<uuid::Uuid, _>("entry_id")),
        entry_number: row.get("entry_number"),
        date: row.get("entry_date"),
        description: row.get("description"),
        account_id: AccountId::from(row.get::<uuid::Uuid, _>("account_id")),
        debit: row.get("debit"),
        credit: row.get("credit"),
    }
}

async fn insert_transaction_row(
    tx: &mut DbTransaction<'_, Postgres>,
    transaction: &TransactionValues,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO transactions
        (id, transaction_number, tx_type, tx_date, entity_id, amount, payment_method,
         journal_entry_id, related_type, related_id, reversal_of, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(uuid::Uuid::from(transaction.id))
    .bind(&transaction.transaction_number)
    .bind(transaction.tx_type.to_string())
    .bind(transaction.date)
    .bind(uuid::Uuid::from(transaction.entity_id))
    .bind(transaction.amount)
    .bind(transaction.payment_method.map(|m| m.to_string()))
    .bind(uuid::Uuid::from(transaction.journal_entry_id))
    .bind(&transaction.related_type)
    .bind(transaction.related_id)
    .bind(transaction.reversal_of.map(uuid::Uuid::from))
    .bind(&transaction.notes)
    .bind(transaction.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| match unique_constraint(&e) {
        // only the partial index on reversal_of means "already reversed";
        // a transaction_number or pkey collision is a plain duplicate
        Some("uq_transactions_reversal_of") => StoreError::duplicate(
            "reversal",
            transaction
                .reversal_of
                .map(|id| id.to_string())
                .unwrap_or_default(),
        ),
        _ => map_unique(e, "transaction", &transaction.transaction_number),
    })?;
    Ok(())
}

async fn insert_voucher_row(
    tx: &mut DbTransaction<'_, Postgres>,
    voucher: &VoucherValues,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO vouchers
        (id, voucher_number, voucher_type, voucher_date, amount, entity_id,
         transaction_id, payment_method, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(uuid::Uuid::from(voucher.id))
    .bind(&voucher.voucher_number)
    .bind(voucher.voucher_type.to_string())
    .bind(voucher.date)
    .bind(voucher.amount)
    .bind(uuid::Uuid::from(voucher.entity_id))
    .bind(uuid::Uuid::from(voucher.transaction_id))
    .bind(voucher.payment_method.to_string())
    .bind(voucher.status.to_string())
    .bind(voucher.created_at)
    .execute(&mut **tx)
    .await
    .map_err(|e| match unique_constraint(&e) {
        Some("vouchers_transaction_id_key") => StoreError::duplicate(
            "voucher_for_transaction",
            voucher.transaction_id.to_string(),
        ),
        _ => map_unique(e, "voucher", &voucher.voucher_number),
    })?;
    Ok(())
}

#[async_trait::async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_account(&self, account: &AccountValues) -> Result<(), StoreError> {
        Self::insert_account_row(&self.pool, account).await
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<AccountValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(uuid::Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_account_by_code(
        &self,
        code: &str,
    ) -> Result<Option<AccountValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_accounts(&self) -> Result<Vec<AccountValues>, StoreError> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(account_from_row).collect()
    }

    async fn deactivate_account(&self, id: AccountId) -> Result<(), StoreError> {
        // conditional write: the zero-balance and active checks happen in
        // the same statement that flips the status
        let result = sqlx::query(
            r#"
            UPDATE accounts SET status = 'inactive'
            WHERE id = $1 AND status = 'active' AND balance = 0
            "#,
        )
        .bind(uuid::Uuid::from(id))
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite("account"));
        }
        Ok(())
    }

    async fn insert_draft_entry(&self, entry: &JournalEntryValues) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::insert_entry_rows(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntryValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM journal_entries WHERE id = $1")
            .bind(uuid::Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let mut lines = self.load_lines(&[uuid::Uuid::from(id)]).await?;
        let entry = entry_header_from_row(&row, lines.remove(&id).unwrap_or_default())?;
        Ok(Some(entry))
    }

    async fn list_entries(&self) -> Result<Vec<JournalEntryValues>, StoreError> {
        let rows =
            sqlx::query("SELECT * FROM journal_entries ORDER BY LENGTH(entry_number), entry_number")
            .fetch_all(&self.pool)
            .await?;
        let ids: Vec<uuid::Uuid> = rows
            .iter()
            .map(|r| r.get::<uuid::Uuid, _>("id"))
            .collect();
        let mut lines = self.load_lines(&ids).await?;
        rows.iter()
            .map(|row| {
                let id = JournalEntryId::from(row.get::<uuid::Uuid, _>("id"));
                entry_header_from_row(row, lines.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn finalize_entry(
        &self,
        id: JournalEntryId,
        status: JournalEntryStatus,
        balance_deltas: &[(AccountId, Decimal)],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_accounts(&mut tx, balance_deltas).await?;
        let result = sqlx::query(
            "UPDATE journal_entries SET status = $2 WHERE id = $1 AND status = 'draft'",
        )
        .bind(uuid::Uuid::from(id))
        .bind(status.to_string())
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite("journal_entry"));
        }
        Self::apply_deltas(&mut tx, balance_deltas).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn commit_posting(&self, posting: Posting) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        // a carried account goes in first so the delta lock below sees it
        if let Some(account) = &posting.account {
            Self::insert_account_row(&mut *tx, account).await?;
        }
        Self::lock_accounts(&mut tx, &posting.balance_deltas).await?;
        Self::insert_entry_rows(&mut tx, &posting.entry).await?;
        if let Some(transaction) = &posting.transaction {
            insert_transaction_row(&mut tx, transaction).await?;
        }
        if let Some(voucher) = &posting.voucher {
            insert_voucher_row(&mut tx, voucher).await?;
        }
        Self::apply_deltas(&mut tx, &posting.balance_deltas).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = $1")
            .bind(uuid::Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn find_reversal_of(
        &self,
        id: TransactionId,
    ) -> Result<Option<TransactionValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM transactions WHERE reversal_of = $1")
            .bind(uuid::Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionValues>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM transactions ORDER BY LENGTH(transaction_number), transaction_number",
        )
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(transaction_from_row).collect()
    }

    async fn find_voucher(&self, id: VoucherId) -> Result<Option<VoucherValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM vouchers WHERE id = $1")
            .bind(uuid::Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(voucher_from_row).transpose()
    }

    async fn find_voucher_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Option<VoucherValues>, StoreError> {
        let row = sqlx::query("SELECT * FROM vouchers WHERE transaction_id = $1")
            .bind(uuid::Uuid::from(transaction_id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(voucher_from_row).transpose()
    }

    async fn list_vouchers(&self) -> Result<Vec<VoucherValues>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM vouchers ORDER BY LENGTH(voucher_number), voucher_number",
        )
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(voucher_from_row).collect()
    }

    async fn posted_lines_for_account(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT l.account_id, l.debit, l.credit,
                   e.id AS entry_id, e.entry_number, e.entry_date, e.description
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE e.status = 'approved'
            AND l.account_id = $1
            AND ($2::date IS NULL OR e.entry_date >= $2)
            AND ($3::date IS NULL OR e.entry_date <= $3)
            ORDER BY e.entry_date, LENGTH(e.entry_number), e.entry_number, l.line_no
            "#,
        )
        .bind(uuid::Uuid::from(account_id))
        .bind(range.from)
        .bind(range.until)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(posted_line_from_row).collect())
    }

    async fn posted_lines_through(
        &self,
        as_of: NaiveDate,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT l.account_id, l.debit, l.credit,
                   e.id AS entry_id, e.entry_number, e.entry_date, e.description
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE e.status = 'approved'
            AND e.entry_date <= $1
            ORDER BY e.entry_date, LENGTH(e.entry_number), e.entry_number, l.line_no
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(posted_line_from_row).collect())
    }

    async fn next_seq(&self, counter: DocCounter) -> Result<u64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO doc_sequences (counter, current) VALUES ($1, 1)
            ON CONFLICT (counter)
            DO UPDATE SET current = doc_sequences.current + 1
            RETURNING current
            "#,
        )
        .bind(counter.key())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("current") as u64)
    }
}
