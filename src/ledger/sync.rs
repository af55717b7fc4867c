//! Keeps each budget's cached `spent` consistent with the transaction set.

use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{Budget, BudgetId, Transaction};

fn overflow(budget: &Budget) -> LedgerError {
    LedgerError::InvalidAmount(format!("spent for budget {} overflows", budget.id))
}

/// New `spent` values for the budgets a freshly added transaction counts toward.
///
/// Income never moves a budget, so this is empty unless `txn` is an expense.
pub(crate) fn apply_new_expense(
    budgets: &[Budget],
    txn: &Transaction,
) -> Result<Vec<(BudgetId, Decimal)>> {
    budgets
        .iter()
        .filter(|b| b.tracks(txn))
        .map(|b| {
            let spent = b.spent.checked_add(txn.amount).ok_or_else(|| overflow(b))?;
            Ok((b.id.clone(), spent))
        })
        .collect()
}

/// Sum of the expenses `budget` tracks.
pub(crate) fn spent_for(budget: &Budget, transactions: &[Transaction]) -> Result<Decimal> {
    transactions
        .iter()
        .filter(|t| budget.tracks(t))
        .try_fold(Decimal::ZERO, |acc, t| {
            acc.checked_add(t.amount).ok_or_else(|| overflow(budget))
        })
}

/// Full recompute. Returns only the budgets whose stored `spent` is stale.
pub(crate) fn recompute_spent(
    budgets: &[Budget],
    transactions: &[Transaction],
) -> Result<Vec<(BudgetId, Decimal)>> {
    let mut stale = Vec::new();
    for b in budgets {
        let spent = spent_for(b, transactions)?;
        if spent != b.spent {
            stale.push((b.id.clone(), spent));
        }
    }
    Ok(stale)
}
