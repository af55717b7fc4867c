mod schema;

use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, Result};
use crate::models::timestamp::{format_timestamp, parse_timestamp};
use crate::models::*;

const CATEGORY_COLUMNS: &str = "id, name, icon, color, type";
const TRANSACTION_COLUMNS: &str =
    "id, CAST(amount AS TEXT), date, description, categoryId, type";
const BUDGET_COLUMNS: &str =
    "id, name, CAST(amount AS TEXT), CAST(spent AS TEXT), categoryId, startDate, endDate";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| LedgerError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|source| LedgerError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        info!(path = %path.display(), "database ready");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            let tx = self.conn.transaction()?;
            tx.execute_batch(schema::SCHEMA_V1)?;
            tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
            tx.commit()?;
            info!("created schema v1");
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "UPDATE schema_version SET version = ?1",
                    params![from_version + 1],
                )?;
                tx.commit()?;
                info!(from = from_version, to = from_version + 1, "applied migration");
            }
        }

        Ok(())
    }

    /// Returns the number of categories inserted (0 when the table already had rows).
    fn seed_default_categories(&mut self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        for (id, name, icon, color, kind) in schema::DEFAULT_CATEGORIES {
            tx.execute(
                "INSERT OR IGNORE INTO categories (id, name, icon, color, type) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, name, icon, color, kind],
            )?;
        }
        tx.commit()?;
        info!(count = schema::DEFAULT_CATEGORIES.len(), "seeded default categories");
        Ok(schema::DEFAULT_CATEGORIES.len())
    }

    /// Run `f` inside a savepoint: its writes land together or not at all.
    /// A process that dies mid-way leaves nothing committed.
    pub(crate) fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.conn.execute_batch("SAVEPOINT ledger_op")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("RELEASE ledger_op")?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self
                    .conn
                    .execute_batch("ROLLBACK TO ledger_op; RELEASE ledger_op")
                {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<()> {
        Ok(self.conn.execute_batch(sql)?)
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY type, name"
        ))?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: &CategoryId) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
                params![id],
                category_from_row,
            )
            .optional()?)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<()> {
        cat.validate()?;
        self.conn.execute(
            "INSERT INTO categories (id, name, icon, color, type) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![cat.id, cat.name, cat.icon, cat.color, cat.kind],
        )?;
        Ok(())
    }

    pub(crate) fn update_category(&self, cat: &Category) -> Result<usize> {
        cat.validate()?;
        Ok(self.conn.execute(
            "UPDATE categories SET name = ?1, icon = ?2, color = ?3, type = ?4 WHERE id = ?5",
            params![cat.name, cat.icon, cat.color, cat.kind, cat.id],
        )?)
    }

    /// Budgets scoped to the category fall back to all categories (ON DELETE SET NULL).
    pub(crate) fn delete_category(&self, id: &CategoryId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])?)
    }

    // ── Transactions ──────────────────────────────────────────

    /// All transactions, newest first.
    pub(crate) fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY date DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], raw_transaction)?;
        rows.map(|r| r?.into_transaction())
            .collect::<Result<Vec<_>>>()
    }

    pub(crate) fn get_transaction_by_id(&self, id: &TransactionId) -> Result<Option<Transaction>> {
        self.conn
            .query_row(
                &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
                params![id],
                raw_transaction,
            )
            .optional()?
            .map(RawTransaction::into_transaction)
            .transpose()
    }

    pub(crate) fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
        txn.validate()?;
        self.conn.execute(
            "INSERT INTO transactions (id, categoryId, amount, date, description, type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                txn.id,
                txn.category_id,
                txn.amount.to_string(),
                format_timestamp(&txn.date),
                txn.description,
                txn.kind,
            ],
        )?;
        Ok(())
    }

    /// Full-record replace. Returns rows affected; 0 when the id is unknown.
    pub(crate) fn update_transaction(&self, txn: &Transaction) -> Result<usize> {
        txn.validate()?;
        Ok(self.conn.execute(
            "UPDATE transactions
             SET categoryId = ?1, amount = ?2, date = ?3, description = ?4, type = ?5
             WHERE id = ?6",
            params![
                txn.category_id,
                txn.amount.to_string(),
                format_timestamp(&txn.date),
                txn.description,
                txn.kind,
                txn.id,
            ],
        )?)
    }

    pub(crate) fn delete_transaction(&self, id: &TransactionId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?)
    }

    // ── Budgets ───────────────────────────────────────────────

    /// All budgets, ordered by end date.
    pub(crate) fn get_budgets(&self) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets ORDER BY endDate, startDate, id"
        ))?;
        let rows = stmt.query_map([], raw_budget)?;
        rows.map(|r| r?.into_budget()).collect::<Result<Vec<_>>>()
    }

    pub(crate) fn get_budget_by_id(&self, id: &BudgetId) -> Result<Option<Budget>> {
        self.conn
            .query_row(
                &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ?1"),
                params![id],
                raw_budget,
            )
            .optional()?
            .map(RawBudget::into_budget)
            .transpose()
    }

    pub(crate) fn insert_budget(&self, budget: &Budget) -> Result<()> {
        budget.validate()?;
        self.conn.execute(
            "INSERT INTO budgets (id, name, categoryId, amount, spent, startDate, endDate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                budget.id,
                budget.name,
                budget.category_id,
                budget.amount.to_string(),
                budget.spent.to_string(),
                format_timestamp(&budget.start_date),
                format_timestamp(&budget.end_date),
            ],
        )?;
        Ok(())
    }

    /// Replaces everything except `spent`, which belongs to the synchronizer.
    pub(crate) fn update_budget(&self, budget: &Budget) -> Result<usize> {
        budget.validate()?;
        Ok(self.conn.execute(
            "UPDATE budgets
             SET name = ?1, categoryId = ?2, amount = ?3, startDate = ?4, endDate = ?5
             WHERE id = ?6",
            params![
                budget.name,
                budget.category_id,
                budget.amount.to_string(),
                format_timestamp(&budget.start_date),
                format_timestamp(&budget.end_date),
                budget.id,
            ],
        )?)
    }

    pub(crate) fn delete_budget(&self, id: &BudgetId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM budgets WHERE id = ?1", params![id])?)
    }

    /// Write a batch of recomputed `spent` values. All or nothing; nests inside
    /// [`Database::atomically`].
    pub(crate) fn update_budget_spent(&mut self, updates: &[(BudgetId, Decimal)]) -> Result<usize> {
        if updates.is_empty() {
            return Ok(0);
        }
        let sp = self.conn.savepoint()?;
        let mut count = 0;
        for (id, spent) in updates {
            count += sp.execute(
                "UPDATE budgets SET spent = ?1 WHERE id = ?2",
                params![spent.to_string(), id],
            )?;
        }
        sp.commit()?;
        debug!(count, "updated budget spent");
        Ok(count)
    }

    // ── Preferences ───────────────────────────────────────────

    pub(crate) fn get_preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: row.get(2)?,
        color: row.get(3)?,
        kind: row.get(4)?,
    })
}

/// Row as stored; amounts and dates are parsed outside the rusqlite closure
/// so their failures surface as `LedgerError`s.
struct RawTransaction {
    id: TransactionId,
    amount: String,
    date: String,
    description: Option<String>,
    category_id: CategoryId,
    kind: EntryType,
}

fn raw_transaction(row: &Row<'_>) -> rusqlite::Result<RawTransaction> {
    Ok(RawTransaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        date: row.get(2)?,
        description: row.get(3)?,
        category_id: row.get(4)?,
        kind: row.get(5)?,
    })
}

impl RawTransaction {
    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id,
            amount: parse_amount(&self.amount)?,
            date: parse_timestamp(&self.date)?,
            description: self.description,
            category_id: self.category_id,
            kind: self.kind,
        })
    }
}

struct RawBudget {
    id: BudgetId,
    name: String,
    amount: String,
    spent: String,
    category_id: Option<CategoryId>,
    start_date: String,
    end_date: String,
}

fn raw_budget(row: &Row<'_>) -> rusqlite::Result<RawBudget> {
    Ok(RawBudget {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        spent: row.get(3)?,
        category_id: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
    })
}

impl RawBudget {
    fn into_budget(self) -> Result<Budget> {
        Ok(Budget {
            id: self.id,
            name: self.name,
            amount: parse_amount(&self.amount)?,
            spent: parse_amount(&self.spent)?,
            category_id: self.category_id,
            start_date: parse_timestamp(&self.start_date)?,
            end_date: parse_timestamp(&self.end_date)?,
        })
    }
}

/// REAL columns come back through `CAST(... AS TEXT)`; large values may use exponent form.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map(|d| d.normalize())
        .map_err(|_| LedgerError::InvalidAmount(s.to_string()))
}
