mod budget;
mod category;
mod entry_type;
mod ids;
mod theme;
pub(crate) mod timestamp;
mod transaction;

pub(crate) use budget::Budget;
pub(crate) use category::Category;
pub(crate) use entry_type::EntryType;
pub(crate) use ids::{BudgetId, CategoryId, TransactionId};
pub(crate) use theme::Theme;
pub(crate) use transaction::{Transaction, MAX_AMOUNT};
