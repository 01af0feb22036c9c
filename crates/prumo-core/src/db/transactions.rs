//! Transaction operations

use chrono::NaiveDate;
use rusqlite::params;
use serde::Serialize;
use tracing::debug;

use super::{parse_datetime, Database};
use crate::analytics::Window;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, StoredTransaction, Transaction, TransactionKind};

/// Outcome of a bulk import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Rows whose import hash was already stored for the user
    pub duplicates: usize,
}

fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<(StoredFields, String)> {
    let kind: String = row.get(3)?;
    Ok((
        StoredFields {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            category: row.get(4)?,
            amount: row.get(5)?,
            description: row.get(6)?,
            created_at: row.get(7)?,
        },
        kind,
    ))
}

/// Raw column values before the kind is parsed
struct StoredFields {
    id: i64,
    user_id: i64,
    date: String,
    category: String,
    amount: f64,
    description: Option<String>,
    created_at: String,
}

impl StoredFields {
    fn into_stored(self, kind: &str) -> Result<StoredTransaction> {
        let kind: TransactionKind = kind.parse().map_err(Error::InvalidData)?;
        let date = parse_date(&self.date)?;
        Ok(StoredTransaction {
            id: self.id,
            user_id: self.user_id,
            transaction: Transaction::new(kind, self.category, self.amount, date),
            description: self.description,
            created_at: parse_datetime(&self.created_at),
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidData(format!("Bad stored date '{}': {}", s, e)))
}

impl Database {
    /// Insert an imported transaction (skips duplicates based on import_hash)
    ///
    /// Returns the new id, or `None` when the user already has this row.
    pub fn insert_transaction(&self, user_id: i64, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            INSERT INTO transactions (user_id, date, kind, category, amount, description, import_hash, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'import')
            ON CONFLICT(user_id, import_hash) DO NOTHING
            "#,
            params![
                user_id,
                tx.transaction.date.to_string(),
                tx.transaction.kind.as_str(),
                tx.transaction.category,
                tx.transaction.amount,
                tx.description,
                tx.import_hash,
            ],
        )?;

        Ok((changed > 0).then(|| conn.last_insert_rowid()))
    }

    /// Insert a batch of imported transactions in one SQLite transaction
    pub fn import_transactions(&self, user_id: i64, txs: &[NewTransaction]) -> Result<ImportSummary> {
        let mut conn = self.conn()?;
        let db_tx = conn.transaction()?;
        let mut summary = ImportSummary::default();

        {
            let mut stmt = db_tx.prepare(
                r#"
                INSERT INTO transactions (user_id, date, kind, category, amount, description, import_hash, source)
                VALUES (?, ?, ?, ?, ?, ?, ?, 'import')
                ON CONFLICT(user_id, import_hash) DO NOTHING
                "#,
            )?;

            for tx in txs {
                let changed = stmt.execute(params![
                    user_id,
                    tx.transaction.date.to_string(),
                    tx.transaction.kind.as_str(),
                    tx.transaction.category,
                    tx.transaction.amount,
                    tx.description,
                    tx.import_hash,
                ])?;
                if changed > 0 {
                    summary.inserted += 1;
                } else {
                    summary.duplicates += 1;
                }
            }
        }

        db_tx.commit()?;
        debug!(
            user_id,
            inserted = summary.inserted,
            duplicates = summary.duplicates,
            "Imported transactions"
        );
        Ok(summary)
    }

    /// Record a manually entered transaction
    pub fn add_transaction(
        &self,
        user_id: i64,
        tx: &Transaction,
        description: Option<&str>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, date, kind, category, amount, description, source)
            VALUES (?, ?, ?, ?, ?, ?, 'manual')
            "#,
            params![
                user_id,
                tx.date.to_string(),
                tx.kind.as_str(),
                tx.category,
                tx.amount,
                description,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent transactions first
    pub fn list_transactions(&self, user_id: i64, limit: i64) -> Result<Vec<StoredTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, date, kind, category, amount, description, created_at
            FROM transactions
            WHERE user_id = ?
            ORDER BY date DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, limit], row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(fields, kind)| fields.into_stored(&kind))
            .collect()
    }

    /// Transactions inside `window`, oldest first, as the analytics engine consumes them
    pub fn transactions_in(&self, user_id: i64, window: &Window) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut conditions = vec!["user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(start) = window.start {
            conditions.push("date >= ?".to_string());
            params.push(Box::new(start.to_string()));
        }
        if let Some(end) = window.end {
            conditions.push("date <= ?".to_string());
            params.push(Box::new(end.to_string()));
        }

        let sql = format!(
            r#"
            SELECT id, user_id, date, kind, category, amount, description, created_at
            FROM transactions
            WHERE {}
            ORDER BY date ASC, id ASC
            "#,
            conditions.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_refs.as_slice(), row_to_stored)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(fields, kind)| fields.into_stored(&kind).map(|s| s.transaction))
            .collect()
    }

    pub fn count_transactions(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Date of the user's newest transaction
    pub fn latest_transaction_date(&self, user_id: i64) -> Result<Option<NaiveDate>> {
        let conn = self.conn()?;
        let date: Option<String> = conn.query_row(
            "SELECT MAX(date) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        date.as_deref().map(parse_date).transpose()
    }
}
