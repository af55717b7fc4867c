//! Whole-database export.
//!
//! JSON carries every category, transaction and budget for backup or sharing.
//! CSV carries transactions only, with category names resolved, for spreadsheets.

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::aggregate::transaction_category_name;
use crate::db::Database;
use crate::error::Result;
use crate::models::timestamp::format_timestamp;
use crate::models::{Budget, Category, Transaction};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
}

impl Snapshot {
    pub(crate) fn load(db: &Database) -> Result<Self> {
        Ok(Self {
            categories: db.get_categories()?,
            transactions: db.get_transactions()?,
            budgets: db.get_budgets()?,
        })
    }

    pub(crate) fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn parse_export(text: &str) -> Result<Snapshot> {
    Ok(serde_json::from_str(text)?)
}

/// Returns the number of transaction rows written.
pub(crate) fn write_transactions_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
    categories: &[Category],
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["id", "date", "type", "category", "amount", "description"])?;
    for txn in transactions {
        let date = format_timestamp(&txn.date);
        let amount = txn.amount.to_string();
        wtr.write_record([
            txn.id.as_str(),
            date.as_str(),
            txn.kind.as_str(),
            transaction_category_name(categories, &txn.category_id),
            amount.as_str(),
            txn.description.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(transactions.len())
}
