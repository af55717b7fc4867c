mod aggregate;
mod config;
mod db;
mod display;
mod error;
mod export;
mod ledger;
mod models;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

fn main() -> Result<()> {
    let cli = run::Cli::parse();
    config::init_logging(cli.verbose);

    let db_path = match cli.db {
        Some(path) => path,
        None => config::default_db_path()?,
    };
    debug!(path = %db_path.display(), "using database");

    let mut ledger = ledger::Ledger::new(db_path);
    run::as_cli(cli.command, &mut ledger)
}
