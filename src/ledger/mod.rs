//! The session object every front-end command goes through.
//!
//! A `Ledger` opens its database on first use and keeps the handle for the
//! rest of the process. Each command runs to completion, including any budget
//! resync, before returning; `&mut self` keeps commands from interleaving.
//! Failures are logged here and handed back to the caller unchanged.

pub(crate) mod sync;

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use crate::db::Database;
use crate::error::Result;
use crate::export::{self, Snapshot};
use crate::models::timestamp::to_storage_precision;
use crate::models::*;

pub(crate) struct Ledger {
    path: PathBuf,
    db: Option<Database>,
}

impl Ledger {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, db: None }
    }

    #[cfg(test)]
    pub(crate) fn from_database(db: Database) -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            db: Some(db),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Open, migrate and seed the store. Only the first call does any work.
    pub(crate) fn initialize(&mut self) -> Result<&mut Database> {
        let db = match self.db.take() {
            Some(db) => db,
            None => Database::open(&self.path).inspect_err(|err| {
                error!(path = %self.path.display(), error = %err, "failed to initialize database");
            })?,
        };
        Ok(self.db.insert(db))
    }

    fn run<T>(&mut self, op: &'static str, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        self.initialize()
            .and_then(f)
            .inspect_err(|err| error!(op, error = %err, "ledger command failed"))
    }

    /// Like `run`, but every write `f` makes commits together or is rolled back.
    fn run_atomic<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Database) -> Result<T>,
    ) -> Result<T> {
        self.run(op, |db| db.atomically(f))
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn categories(&mut self) -> Result<Vec<Category>> {
        self.run("list categories", |db| db.get_categories())
    }

    pub(crate) fn category(&mut self, id: &CategoryId) -> Result<Option<Category>> {
        self.run("get category", |db| db.get_category_by_id(id))
    }

    pub(crate) fn add_category(&mut self, cat: &Category) -> Result<()> {
        self.run("add category", |db| db.insert_category(cat))
    }

    pub(crate) fn update_category(&mut self, cat: &Category) -> Result<usize> {
        self.run("update category", |db| db.update_category(cat))
    }

    /// Dependent budgets lose their scope and are recomputed over all categories.
    pub(crate) fn delete_category(&mut self, id: &CategoryId) -> Result<usize> {
        self.run_atomic("delete category", |db| {
            let deleted = db.delete_category(id)?;
            if deleted > 0 {
                resync_budgets(db)?;
            }
            Ok(deleted)
        })
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn transactions(&mut self) -> Result<Vec<Transaction>> {
        self.run("list transactions", |db| db.get_transactions())
    }

    pub(crate) fn transaction(&mut self, id: &TransactionId) -> Result<Option<Transaction>> {
        self.run("get transaction", |db| db.get_transaction_by_id(id))
    }

    pub(crate) fn transaction_count(&mut self) -> Result<i64> {
        self.run("count transactions", |db| db.get_transaction_count())
    }

    /// Insert, then add an expense's amount to every budget that tracks it.
    pub(crate) fn add_transaction(&mut self, txn: &Transaction) -> Result<()> {
        self.run_atomic("add transaction", |db| {
            db.insert_transaction(txn)?;
            if txn.is_expense() {
                // match at the precision the row was stored with
                let stored = Transaction {
                    date: to_storage_precision(txn.date),
                    ..txn.clone()
                };
                let budgets = db.get_budgets()?;
                let updates = sync::apply_new_expense(&budgets, &stored)?;
                db.update_budget_spent(&updates)?;
            }
            Ok(())
        })
    }

    /// Full-record replace; any field may have changed, so every budget is recomputed.
    pub(crate) fn update_transaction(&mut self, txn: &Transaction) -> Result<usize> {
        self.run_atomic("update transaction", |db| {
            let updated = db.update_transaction(txn)?;
            if updated == 0 {
                warn!(id = %txn.id, "update matched no transaction");
            } else {
                resync_budgets(db)?;
            }
            Ok(updated)
        })
    }

    pub(crate) fn delete_transaction(&mut self, id: &TransactionId) -> Result<usize> {
        self.run_atomic("delete transaction", |db| {
            let deleted = db.delete_transaction(id)?;
            if deleted == 0 {
                warn!(%id, "delete matched no transaction");
            } else {
                resync_budgets(db)?;
            }
            Ok(deleted)
        })
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn budgets(&mut self) -> Result<Vec<Budget>> {
        self.run("list budgets", |db| db.get_budgets())
    }

    pub(crate) fn budget(&mut self, id: &BudgetId) -> Result<Option<Budget>> {
        self.run("get budget", |db| db.get_budget_by_id(id))
    }

    /// A new budget starts consistent with the transactions already in its range.
    pub(crate) fn add_budget(&mut self, budget: &Budget) -> Result<()> {
        self.run_atomic("add budget", |db| {
            db.insert_budget(budget)?;
            resync_budgets(db)?;
            Ok(())
        })
    }

    pub(crate) fn update_budget(&mut self, budget: &Budget) -> Result<usize> {
        self.run_atomic("update budget", |db| {
            let updated = db.update_budget(budget)?;
            if updated > 0 {
                resync_budgets(db)?;
            }
            Ok(updated)
        })
    }

    pub(crate) fn delete_budget(&mut self, id: &BudgetId) -> Result<usize> {
        self.run("delete budget", |db| db.delete_budget(id))
    }

    // ── Preferences ───────────────────────────────────────────

    pub(crate) fn theme(&mut self) -> Result<Theme> {
        self.run("get theme", |db| {
            Ok(match db.get_preference(Theme::KEY)? {
                Some(value) => Theme::parse(&value).unwrap_or_else(|| {
                    warn!(%value, "unknown stored theme, using default");
                    Theme::default()
                }),
                None => Theme::default(),
            })
        })
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.run("set theme", |db| db.set_preference(Theme::KEY, theme.as_str()))
    }

    // ── Export ────────────────────────────────────────────────

    pub(crate) fn snapshot(&mut self) -> Result<Snapshot> {
        self.run("read snapshot", |db| Snapshot::load(db))
    }

    /// The whole database as pretty-printed JSON.
    pub(crate) fn export_all(&mut self) -> Result<String> {
        self.run("export", |db| Snapshot::load(db)?.to_json())
    }

    pub(crate) fn export_transactions_csv<W: Write>(&mut self, writer: W) -> Result<usize> {
        self.run("export csv", |db| {
            let categories = db.get_categories()?;
            let transactions = db.get_transactions()?;
            export::write_transactions_csv(writer, &transactions, &categories)
        })
    }
}

/// Recompute every budget's `spent` from scratch and write the ones that changed.
fn resync_budgets(db: &mut Database) -> Result<usize> {
    let budgets = db.get_budgets()?;
    let transactions = db.get_transactions()?;
    let updates = sync::recompute_spent(&budgets, &transactions)?;
    let count = db.update_budget_spent(&updates)?;
    debug!(budgets = budgets.len(), changed = count, "resynced budgets");
    Ok(count)
}

#[cfg(test)]
mod tests;
