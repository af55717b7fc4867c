use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::MAX_AMOUNT;
use super::{BudgetId, CategoryId, Transaction};
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Budget {
    pub id: BudgetId,
    pub name: String,
    /// Spending cap.
    pub amount: Decimal,
    /// Derived; only the budget synchronizer writes it.
    pub spent: Decimal,
    /// `None` means the budget covers every category.
    pub category_id: Option<CategoryId>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl Budget {
    pub(crate) fn new(
        name: String,
        amount: Decimal,
        category_id: Option<CategoryId>,
        start_date: NaiveDateTime,
        end_date: NaiveDateTime,
    ) -> Self {
        Self {
            id: BudgetId::generate(),
            name,
            amount,
            spent: Decimal::ZERO,
            category_id,
            start_date,
            end_date,
        }
    }

    /// Inclusive on both ends.
    pub(crate) fn covers(&self, date: &NaiveDateTime) -> bool {
        self.start_date <= *date && *date <= self.end_date
    }

    pub(crate) fn matches_category(&self, category_id: &CategoryId) -> bool {
        self.category_id.as_ref().map_or(true, |c| c == category_id)
    }

    /// Whether `txn` counts toward this budget's `spent`.
    pub(crate) fn tracks(&self, txn: &Transaction) -> bool {
        txn.is_expense() && self.covers(&txn.date) && self.matches_category(&txn.category_id)
    }

    pub(crate) fn remaining(&self) -> Decimal {
        self.amount - self.spent
    }

    pub(crate) fn is_active(&self, now: &NaiveDateTime) -> bool {
        self.covers(now)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Validation("budget name must not be empty".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "budget amount must be positive, got {}",
                self.amount
            )));
        }
        if self.amount > MAX_AMOUNT {
            return Err(LedgerError::InvalidAmount(format!(
                "budget amount {} exceeds the maximum of {MAX_AMOUNT}",
                self.amount
            )));
        }
        if self.spent < Decimal::ZERO {
            return Err(LedgerError::Validation("budget spent must not be negative".into()));
        }
        if self.end_date <= self.start_date {
            return Err(LedgerError::Validation(
                "budget end date must be after its start date".into(),
            ));
        }
        Ok(())
    }
}
