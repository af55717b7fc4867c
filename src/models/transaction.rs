use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CategoryId, EntryType, TransactionId};
use crate::error::{LedgerError, Result};

/// Largest amount a transaction or budget may carry (one quadrillion).
/// Sums over any realistic number of records stay far inside `Decimal`'s range.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Transaction {
    pub id: TransactionId,
    /// Always positive; the direction comes from `kind`.
    pub amount: Decimal,
    pub date: NaiveDateTime,
    pub description: Option<String>,
    pub category_id: CategoryId,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

impl Transaction {
    pub(crate) fn new(
        amount: Decimal,
        date: NaiveDateTime,
        description: Option<String>,
        category_id: CategoryId,
        kind: EntryType,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            amount,
            date,
            description,
            category_id,
            kind,
        }
    }

    pub(crate) fn is_income(&self) -> bool {
        self.kind == EntryType::Income
    }

    pub(crate) fn is_expense(&self) -> bool {
        self.kind == EntryType::Expense
    }

    /// Amount with the sign it contributes to a balance.
    pub(crate) fn signed_amount(&self) -> Decimal {
        match self.kind {
            EntryType::Income => self.amount,
            EntryType::Expense => -self.amount,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "transaction amount must be positive, got {}",
                self.amount
            )));
        }
        if self.amount > MAX_AMOUNT {
            return Err(LedgerError::InvalidAmount(format!(
                "transaction amount {} exceeds the maximum of {MAX_AMOUNT}",
                self.amount
            )));
        }
        if self.id.as_str().is_empty() {
            return Err(LedgerError::Validation("transaction id must not be empty".into()));
        }
        Ok(())
    }
}
