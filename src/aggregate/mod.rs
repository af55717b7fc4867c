use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use crate::models::{Budget, Category, CategoryId, Transaction};

pub(crate) const UNCATEGORIZED: &str = "Uncategorized";
pub(crate) const UNKNOWN_CATEGORY: &str = "Unknown Category";
pub(crate) const ALL_CATEGORIES: &str = "All Categories";

const WARNING_PERCENT: Decimal = Decimal::from_parts(70, 0, 0, false, 0);
const CRITICAL_PERCENT: Decimal = Decimal::from_parts(90, 0, 0, false, 0);

// ── Time windows ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Window {
    Daily,
    /// ISO week, Monday first.
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Window {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "d" => Some(Self::Daily),
            "weekly" | "week" | "w" => Some(Self::Weekly),
            "monthly" | "month" | "m" => Some(Self::Monthly),
            "yearly" | "year" | "y" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// The window of this kind containing `reference`.
    pub(crate) fn bounds(&self, reference: NaiveDateTime) -> WindowBounds {
        let day = reference.date();
        let (first, next) = match self {
            Self::Daily => (day, day + Duration::days(1)),
            Self::Weekly => {
                let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
                (monday, monday + Duration::days(7))
            }
            Self::Monthly => {
                let first = day.with_day(1).unwrap_or(day);
                (first, first_of_next_month(first))
            }
            Self::Yearly => {
                let first = NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day);
                let next = NaiveDate::from_ymd_opt(day.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX);
                (first, next)
            }
        };
        WindowBounds {
            start: first.and_time(NaiveTime::MIN),
            next_start: next.and_time(NaiveTime::MIN),
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn first_of_next_month(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

/// Half-open internally; `end()` reports the inclusive last millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowBounds {
    pub start: NaiveDateTime,
    next_start: NaiveDateTime,
}

impl WindowBounds {
    pub(crate) fn end(&self) -> NaiveDateTime {
        self.next_start - Duration::milliseconds(1)
    }

    pub(crate) fn contains(&self, date: &NaiveDateTime) -> bool {
        self.start <= *date && *date < self.next_start
    }
}

pub(crate) fn filter_by_window(
    transactions: &[Transaction],
    window: Window,
    reference: NaiveDateTime,
) -> Vec<&Transaction> {
    let bounds = window.bounds(reference);
    transactions
        .iter()
        .filter(|t| bounds.contains(&t.date))
        .collect()
}

// ── Totals ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

pub(crate) fn totals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Totals {
    let (income, expense) = transactions
        .into_iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(inc, exp), t| {
            if t.is_income() {
                (inc.saturating_add(t.amount), exp)
            } else {
                (inc, exp.saturating_add(t.amount))
            }
        });
    Totals {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryTotal {
    pub category_id: CategoryId,
    pub amount: Decimal,
}

/// Sums amounts per category regardless of type, in first-seen order.
/// Callers filter by type beforehand when they want e.g. an expense breakdown.
pub(crate) fn category_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> Vec<CategoryTotal> {
    let mut result: Vec<CategoryTotal> = Vec::new();
    for t in transactions {
        match result.iter_mut().find(|c| c.category_id == t.category_id) {
            Some(entry) => entry.amount = entry.amount.saturating_add(t.amount),
            None => result.push(CategoryTotal {
                category_id: t.category_id.clone(),
                amount: t.amount,
            }),
        }
    }
    result
}

/// `amount` as a percentage of `total`; 0 when the total is not positive.
/// A ratio too large to represent saturates at `Decimal::MAX`.
pub(crate) fn share_of(amount: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount
        .checked_div(total)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}

/// Overflow-free sum for display totals.
pub(crate) fn saturating_sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |acc, a| acc.saturating_add(a))
}

// ── Budget progress ───────────────────────────────────────────

/// `spent / amount` as a percentage, capped at 100. Zero for a non-positive cap.
pub(crate) fn progress_percentage(budget: &Budget) -> Decimal {
    share_of(budget.spent, budget.amount).min(Decimal::ONE_HUNDRED)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BudgetHealth {
    Healthy,
    Warning,
    Critical,
}

impl BudgetHealth {
    pub(crate) fn from_percentage(pct: Decimal) -> Self {
        if pct < WARNING_PERCENT {
            Self::Healthy
        } else if pct < CRITICAL_PERCENT {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub(crate) fn of(budget: &Budget) -> Self {
        Self::from_percentage(progress_percentage(budget))
    }

    pub(crate) fn is_near_limit(&self) -> bool {
        !matches!(self, Self::Healthy)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "ok",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

// ── Labels ────────────────────────────────────────────────────

pub(crate) fn transaction_category_name<'a>(categories: &'a [Category], id: &CategoryId) -> &'a str {
    Category::find_by_id(categories, id).map_or(UNCATEGORIZED, |c| c.name.as_str())
}

pub(crate) fn budget_scope_name<'a>(categories: &'a [Category], id: Option<&CategoryId>) -> &'a str {
    match id {
        None => ALL_CATEGORIES,
        Some(id) => Category::find_by_id(categories, id).map_or(UNKNOWN_CATEGORY, |c| c.name.as_str()),
    }
}
