pub mod accounts;
pub mod book;
pub mod categories;
pub mod transactions;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::book::Book;
use crate::error::{MigrateError, Result};
use crate::settings::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "move2gnucash", version, about = "Migrate Quicken CSV exports into a GnuCash book.")]
pub struct Cli {
    /// The csv file containing the input data. Typical extension: '.csv'
    pub input_file: PathBuf,
    /// The GnuCash file to create or add to. Typical extension: '.gnucash'
    pub output_file: PathBuf,
    /// ACCTS for accounts and balances, CATS for categories, IE for income and expense transactions
    #[arg(value_enum)]
    pub action: Action,
    /// Run without writing a GnuCash file
    #[arg(short = 'd', long)]
    pub dry_run: bool,
    /// Replace the output file instead of adding to it
    #[arg(long)]
    pub overwrite: bool,
    /// Settings file (default: ~/.config/move2gnucash/settings.json)
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    #[value(name = "ACCTS")]
    Accts,
    #[value(name = "CATS")]
    Cats,
    #[value(name = "IE")]
    Ie,
}

/// Loads settings and picks the book, once the input is known to exist.
pub fn prepare_run(cli: &Cli) -> Result<(Settings, Book)> {
    if !cli.input_file.exists() {
        return Err(MigrateError::MissingFile(cli.input_file.clone()));
    }
    let settings = load_settings(cli.settings.as_deref())?;
    let book = book::get_book(&cli.output_file, cli.dry_run, cli.overwrite, &settings.currency)?;
    Ok((settings, book))
}
