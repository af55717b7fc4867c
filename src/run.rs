mod cli;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::aggregate::Window;
use crate::ledger::Ledger;
use crate::models::timestamp::{parse_end_timestamp, parse_timestamp};
use crate::models::{EntryType, Theme};

pub(crate) use cli::{BudgetCommand, CategoryCommand, TxnCommand};

/// WealthWise: local personal finance ledger
#[derive(Parser, Debug)]
#[command(name = "wealthwise", version)]
pub(crate) struct Cli {
    /// Database file (default: platform data directory)
    #[arg(long, global = true, env = "WEALTHWISE_DB")]
    pub db: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the database and seed default categories
    Init,

    /// Manage categories
    #[command(subcommand, alias = "cat")]
    Category(CategoryCommand),

    /// Manage transactions
    #[command(subcommand, alias = "transaction")]
    Txn(TxnCommand),

    /// Manage budgets
    #[command(subcommand)]
    Budget(BudgetCommand),

    /// Income, expense and balance for a time window
    #[command(alias = "s")]
    Summary {
        /// daily, weekly, monthly or yearly
        #[arg(short, long, default_value = "monthly", value_parser = parse_window)]
        window: Window,
        /// Reference date inside the window (default: now)
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDateTime>,
    },

    /// Per-category totals for a time window
    Breakdown {
        #[arg(short, long, default_value = "monthly", value_parser = parse_window)]
        window: Window,
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDateTime>,
        /// Which side of the ledger to break down
        #[arg(short = 't', long = "type", default_value = "expense", value_parser = parse_entry_type)]
        kind: EntryType,
    },

    /// Export the whole database as JSON (or transactions as CSV)
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
        /// Write transactions as CSV instead of the full JSON export
        #[arg(long)]
        csv: bool,
    },

    /// Show or set the UI theme preference
    Theme {
        /// light, dark or system
        #[arg(value_parser = parse_theme)]
        value: Option<Theme>,
    },
}

pub(crate) fn as_cli(command: Command, ledger: &mut Ledger) -> Result<()> {
    match command {
        Command::Init => cli::init(ledger),
        Command::Category(cmd) => cli::category(cmd, ledger),
        Command::Txn(cmd) => cli::txn(cmd, ledger),
        Command::Budget(cmd) => cli::budget(cmd, ledger),
        Command::Summary { window, on } => cli::summary(window, on, ledger),
        Command::Breakdown { window, on, kind } => cli::breakdown(window, on, kind, ledger),
        Command::Export { output, csv } => cli::export(output.as_deref(), csv, ledger),
        Command::Theme { value } => cli::theme(value, ledger),
    }
}

// ── Argument parsers ──────────────────────────────────────────

fn parse_window(s: &str) -> Result<Window, String> {
    Window::parse(s).ok_or_else(|| format!("unknown window '{s}' (daily, weekly, monthly, yearly)"))
}

fn parse_entry_type(s: &str) -> Result<EntryType, String> {
    EntryType::parse(s).ok_or_else(|| format!("unknown type '{s}' (income, expense)"))
}

fn parse_theme(s: &str) -> Result<Theme, String> {
    Theme::parse(s).ok_or_else(|| format!("unknown theme '{s}' (light, dark, system)"))
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| e.to_string())
}

/// A bare date is taken as the end of that day.
fn parse_end_date(s: &str) -> Result<NaiveDateTime, String> {
    parse_end_timestamp(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_txn_add() {
        let cli = Cli::try_parse_from([
            "wealthwise", "--db", "/tmp/x.db", "txn", "add", "--amount", "12.50", "--category",
            "food", "--date", "2024-03-15",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::Txn(TxnCommand::Add { .. })));
    }

    #[test]
    fn test_parse_summary_window() {
        let cli = Cli::try_parse_from(["wealthwise", "-vv", "summary", "--window", "w"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Summary {
                window: Window::Weekly,
                on: None
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_window() {
        assert!(Cli::try_parse_from(["wealthwise", "summary", "--window", "hourly"]).is_err());
    }

    #[test]
    fn test_end_date_is_end_of_day() {
        let end = parse_end_date("2024-03-31").unwrap();
        assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
    }
}
