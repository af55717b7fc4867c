use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use clap::Subcommand;
use rust_decimal::Decimal;
use std::fs::File;
use std::io;

use super::{parse_date, parse_end_date, parse_entry_type, parse_window};
use crate::aggregate::{
    budget_scope_name, category_totals, filter_by_window, progress_percentage, saturating_sum,
    share_of, totals, transaction_category_name, BudgetHealth, Window,
};
use crate::display::{format_amount, format_signed, health_marker, progress_bar, truncate};
use crate::ledger::Ledger;
use crate::models::timestamp::now;
use crate::models::*;

const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    /// List categories grouped by type
    List {
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
    },
    /// Add a category; its id is derived from the name
    Add {
        name: String,
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        kind: EntryType,
        #[arg(short, long, default_value = "")]
        icon: String,
        /// Hex color such as #10b981
        #[arg(short, long, default_value = "")]
        color: String,
    },
    /// Edit a category by id or name
    Edit {
        category: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
    },
    /// Delete a category; budgets scoped to it widen to all categories
    Delete { category: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TxnCommand {
    /// List transactions, newest first
    List {
        /// Only show this window (monthly when only --on is given)
        #[arg(short, long, value_parser = parse_window)]
        window: Option<Window>,
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDateTime>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Record a transaction
    Add {
        #[arg(short, long)]
        amount: Decimal,
        /// Category id or name
        #[arg(short, long)]
        category: String,
        /// Defaults to the category's type
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
        /// Defaults to now
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDateTime>,
        #[arg(short = 'm', long)]
        description: Option<String>,
    },
    /// Replace fields of an existing transaction
    Edit {
        id: String,
        #[arg(short, long)]
        amount: Option<Decimal>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short = 't', long = "type", value_parser = parse_entry_type)]
        kind: Option<EntryType>,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDateTime>,
        /// An empty string clears the description
        #[arg(short = 'm', long)]
        description: Option<String>,
    },
    /// Delete a transaction
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum BudgetCommand {
    /// List budgets with progress
    List {
        /// Only budgets whose range includes today
        #[arg(long)]
        active: bool,
    },
    /// Create a budget over a date range
    Add {
        name: String,
        #[arg(short, long)]
        amount: Decimal,
        /// Category id or name; omit to track every category
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_date)]
        start: NaiveDateTime,
        /// A bare date means the end of that day
        #[arg(long, value_parser = parse_end_date)]
        end: NaiveDateTime,
    },
    /// Replace fields of an existing budget
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        amount: Option<Decimal>,
        #[arg(short, long, conflicts_with = "all_categories")]
        category: Option<String>,
        /// Track every category
        #[arg(long)]
        all_categories: bool,
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_end_date)]
        end: Option<NaiveDateTime>,
    },
    /// Delete a budget
    Delete { id: String },
}

// ── Commands ──────────────────────────────────────────────────

pub(super) fn init(ledger: &mut Ledger) -> Result<()> {
    let path = ledger.path().display().to_string();
    ledger
        .initialize()
        .with_context(|| format!("Failed to initialize {path}"))?;
    let snapshot = ledger.snapshot()?;
    println!("Database ready at {path}");
    println!(
        "  {} categories, {} transactions, {} budgets",
        snapshot.categories.len(),
        snapshot.transactions.len(),
        snapshot.budgets.len()
    );
    Ok(())
}

pub(super) fn category(cmd: CategoryCommand, ledger: &mut Ledger) -> Result<()> {
    match cmd {
        CategoryCommand::List { kind } => {
            let categories = ledger.categories()?;
            let kinds = match kind {
                Some(k) => vec![k],
                None => EntryType::all().to_vec(),
            };
            for k in kinds {
                println!("{}", k.as_str().to_uppercase());
                for c in categories.iter().filter(|c| c.kind == k) {
                    println!(
                        "  {:<18} {:<24} {:<14} {}",
                        c.id.as_str(),
                        truncate(&c.name, 24),
                        truncate(&c.icon, 14),
                        c.color
                    );
                }
            }
        }
        CategoryCommand::Add {
            name,
            kind,
            icon,
            color,
        } => {
            let cat = Category::new(name, icon, color, kind);
            ledger.add_category(&cat).map_err(|err| {
                if err.is_constraint() {
                    anyhow!("Category '{}' already exists", cat.name)
                } else {
                    anyhow::Error::new(err).context(format!("Failed to add category '{}'", cat.name))
                }
            })?;
            println!("Added category {cat} ({})", cat.id);
        }
        CategoryCommand::Edit {
            category,
            name,
            icon,
            color,
            kind,
        } => {
            let mut cat = find_category(ledger, &category)?;
            if let Some(name) = name {
                cat.name = name;
            }
            if let Some(icon) = icon {
                cat.icon = icon;
            }
            if let Some(color) = color {
                cat.color = color;
            }
            if let Some(kind) = kind {
                cat.kind = kind;
            }
            let count = ledger
                .update_category(&cat)
                .with_context(|| format!("Failed to update category '{category}'"))?;
            report(count, "Updated", "category", cat.id.as_str());
        }
        CategoryCommand::Delete { category } => {
            let cat = find_category(ledger, &category)?;
            report(ledger.delete_category(&cat.id)?, "Deleted", "category", cat.id.as_str());
        }
    }
    Ok(())
}

pub(super) fn txn(cmd: TxnCommand, ledger: &mut Ledger) -> Result<()> {
    match cmd {
        TxnCommand::List { window, on, limit } => {
            let categories = ledger.categories()?;
            let all = ledger.transactions()?;
            let shown: Vec<&Transaction> = match (window, on) {
                (None, None) => all.iter().collect(),
                (window, on) => {
                    filter_by_window(&all, window.unwrap_or_default(), on.unwrap_or_else(now))
                }
            };
            let shown: Vec<&Transaction> =
                shown.into_iter().take(limit.unwrap_or(usize::MAX)).collect();
            if shown.is_empty() {
                println!("No transactions");
                return Ok(());
            }

            println!(
                "{:<24} {:<10} {:<8} {:<20} {:>14}  Description",
                "ID", "Date", "Type", "Category", "Amount"
            );
            println!("{}", "─".repeat(100));
            for t in &shown {
                println!(
                    "{:<24} {:<10} {:<8} {:<20} {:>14}  {}",
                    t.id.as_str(),
                    t.date.format(DAY_FORMAT).to_string(),
                    t.kind.as_str(),
                    truncate(transaction_category_name(&categories, &t.category_id), 20),
                    format_signed(t),
                    truncate(t.description.as_deref().unwrap_or(""), 30),
                );
            }
            let net = saturating_sum(shown.iter().map(|t| t.signed_amount()));
            println!("{} transactions, net {}", shown.len(), format_amount(net));
        }
        TxnCommand::Add {
            amount,
            category,
            kind,
            date,
            description,
        } => {
            let cat = find_category(ledger, &category)?;
            let txn = Transaction::new(
                amount,
                date.unwrap_or_else(now),
                description.filter(|d| !d.is_empty()),
                cat.id.clone(),
                kind.unwrap_or(cat.kind),
            );
            ledger
                .add_transaction(&txn)
                .context("Failed to add transaction")?;
            println!(
                "Added {} {} in {cat} ({})",
                txn.kind,
                format_amount(txn.amount),
                txn.id
            );
        }
        TxnCommand::Edit {
            id,
            amount,
            category,
            kind,
            date,
            description,
        } => {
            let id = TransactionId::new(id);
            let Some(mut txn) = ledger.transaction(&id)? else {
                println!("No transaction with id {id}");
                return Ok(());
            };
            if let Some(amount) = amount {
                txn.amount = amount;
            }
            if let Some(key) = category {
                txn.category_id = find_category(ledger, &key)?.id;
            }
            if let Some(kind) = kind {
                txn.kind = kind;
            }
            if let Some(date) = date {
                txn.date = date;
            }
            if let Some(description) = description {
                txn.description = (!description.is_empty()).then_some(description);
            }
            let count = ledger
                .update_transaction(&txn)
                .with_context(|| format!("Failed to update transaction {id}"))?;
            report(count, "Updated", "transaction", id.as_str());
        }
        TxnCommand::Delete { id } => {
            let id = TransactionId::new(id);
            report(ledger.delete_transaction(&id)?, "Deleted", "transaction", id.as_str());
        }
    }
    Ok(())
}

pub(super) fn budget(cmd: BudgetCommand, ledger: &mut Ledger) -> Result<()> {
    match cmd {
        BudgetCommand::List { active } => {
            let categories = ledger.categories()?;
            let today = now();
            let budgets: Vec<Budget> = ledger
                .budgets()?
                .into_iter()
                .filter(|b| !active || b.is_active(&today))
                .collect();
            if budgets.is_empty() {
                println!("No budgets");
                return Ok(());
            }
            for b in &budgets {
                let pct = progress_percentage(b);
                println!(
                    "{:<24} {:<20} {} {:>6}{}",
                    truncate(&b.name, 24),
                    truncate(budget_scope_name(&categories, b.category_id.as_ref()), 20),
                    progress_bar(pct, 20),
                    format!("{pct:.1}%"),
                    health_marker(BudgetHealth::of(b)),
                );
                println!(
                    "  {} of {} spent, {} left | {} to {} | {}{}",
                    format_amount(b.spent),
                    format_amount(b.amount),
                    format_amount(b.remaining()),
                    b.start_date.format(DAY_FORMAT),
                    b.end_date.format(DAY_FORMAT),
                    b.id,
                    if b.is_active(&today) { " (active)" } else { "" },
                );
            }
        }
        BudgetCommand::Add {
            name,
            amount,
            category,
            start,
            end,
        } => {
            let category_id = match category {
                Some(key) => Some(find_category(ledger, &key)?.id),
                None => None,
            };
            let budget = Budget::new(name, amount, category_id, start, end);
            ledger
                .add_budget(&budget)
                .with_context(|| format!("Failed to add budget '{}'", budget.name))?;
            let spent = ledger
                .budget(&budget.id)?
                .map_or(Decimal::ZERO, |b| b.spent);
            println!(
                "Added budget {} ({}), {} already spent",
                budget.name,
                budget.id,
                format_amount(spent)
            );
        }
        BudgetCommand::Edit {
            id,
            name,
            amount,
            category,
            all_categories,
            start,
            end,
        } => {
            let id = BudgetId::new(id);
            let Some(mut budget) = ledger.budget(&id)? else {
                println!("No budget with id {id}");
                return Ok(());
            };
            if let Some(name) = name {
                budget.name = name;
            }
            if let Some(amount) = amount {
                budget.amount = amount;
            }
            if all_categories {
                budget.category_id = None;
            } else if let Some(key) = category {
                budget.category_id = Some(find_category(ledger, &key)?.id);
            }
            if let Some(start) = start {
                budget.start_date = start;
            }
            if let Some(end) = end {
                budget.end_date = end;
            }
            let count = ledger
                .update_budget(&budget)
                .with_context(|| format!("Failed to update budget {id}"))?;
            report(count, "Updated", "budget", id.as_str());
        }
        BudgetCommand::Delete { id } => {
            let id = BudgetId::new(id);
            report(ledger.delete_budget(&id)?, "Deleted", "budget", id.as_str());
        }
    }
    Ok(())
}

pub(super) fn summary(window: Window, on: Option<NaiveDateTime>, ledger: &mut Ledger) -> Result<()> {
    let reference = on.unwrap_or_else(now);
    let bounds = window.bounds(reference);
    let all = ledger.transactions()?;
    let in_window = filter_by_window(&all, window, reference);
    let t = totals(in_window.iter().copied());

    println!(
        "WealthWise {window} summary: {} to {}",
        bounds.start.format(DAY_FORMAT),
        bounds.end().format(DAY_FORMAT)
    );
    println!("{}", "─".repeat(40));
    println!("  Income:     {}", format_amount(t.income));
    println!("  Expenses:   {}", format_amount(t.expense));
    println!("  Balance:    {}", format_amount(t.balance));
    println!(
        "  Txns:       {} of {}",
        in_window.len(),
        ledger.transaction_count()?
    );

    let budgets = ledger.budgets()?;
    let near_limit: Vec<&Budget> = budgets
        .iter()
        .filter(|b| b.is_active(&reference) && BudgetHealth::of(b).is_near_limit())
        .collect();
    if !near_limit.is_empty() {
        println!();
        println!("Budgets near their limit:");
        for b in near_limit {
            let pct = progress_percentage(b);
            println!(
                "  {:<24} {:>6} {}",
                truncate(&b.name, 24),
                format!("{pct:.1}%"),
                BudgetHealth::of(b).as_str()
            );
        }
    }
    Ok(())
}

pub(super) fn breakdown(
    window: Window,
    on: Option<NaiveDateTime>,
    kind: EntryType,
    ledger: &mut Ledger,
) -> Result<()> {
    let reference = on.unwrap_or_else(now);
    let categories = ledger.categories()?;
    let all = ledger.transactions()?;
    let selected: Vec<&Transaction> = filter_by_window(&all, window, reference)
        .into_iter()
        .filter(|t| t.kind == kind)
        .collect();

    let mut rows = category_totals(selected.iter().copied());
    if rows.is_empty() {
        println!("No {kind} transactions in this {window} window");
        return Ok(());
    }
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    let total = saturating_sum(rows.iter().map(|r| r.amount));

    println!("{} by category ({window})", capitalize(kind.as_str()));
    for row in &rows {
        let share = share_of(row.amount, total);
        println!(
            "  {:<24} {:>14} {:>6}",
            truncate(transaction_category_name(&categories, &row.category_id), 24),
            format_amount(row.amount),
            format!("{share:.1}%"),
        );
    }
    println!("  {:<24} {:>14}", "Total", format_amount(total));
    Ok(())
}

pub(super) fn export(output: Option<&str>, csv: bool, ledger: &mut Ledger) -> Result<()> {
    match (output, csv) {
        (Some(path), true) => {
            let path = shellexpand(path);
            let file = File::create(&path).with_context(|| format!("Failed to create {path}"))?;
            let count = ledger.export_transactions_csv(file)?;
            println!("Exported {count} transactions to {path}");
        }
        (Some(path), false) => {
            let path = shellexpand(path);
            let json = ledger.export_all()?;
            std::fs::write(&path, json).with_context(|| format!("Failed to write {path}"))?;
            println!("Exported database to {path}");
        }
        (None, true) => {
            ledger.export_transactions_csv(io::stdout().lock())?;
        }
        (None, false) => {
            println!("{}", ledger.export_all()?);
        }
    }
    Ok(())
}

pub(super) fn theme(value: Option<Theme>, ledger: &mut Ledger) -> Result<()> {
    match value {
        Some(theme) => {
            ledger.set_theme(theme)?;
            println!("Theme set to {theme}");
        }
        None => println!("{}", ledger.theme()?),
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

/// Look a category up by id, then by name (case-insensitive).
fn find_category(ledger: &mut Ledger, key: &str) -> Result<Category> {
    if let Some(cat) = ledger.category(&CategoryId::from(key))? {
        return Ok(cat);
    }
    Category::find_by_name(&ledger.categories()?, key)
        .cloned()
        .ok_or_else(|| anyhow!("Category '{key}' not found"))
}

fn report(count: usize, verb: &str, what: &str, id: &str) {
    if count == 0 {
        println!("No {what} with id {id}");
    } else {
        println!("{verb} {what} {id}");
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
