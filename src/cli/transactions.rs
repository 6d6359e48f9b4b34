use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::book::Book;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::fetch_transactions;
use crate::mapper::mapped_transactions;
use crate::preparation::prepared_transactions;
use crate::resolver::{AccountChooser, PromptChooser};
use crate::settings::Settings;

/// Income and expense transactions, asking on the terminal when an account is ambiguous.
pub fn run(input: &Path, book: &mut Book, settings: &Settings) -> Result<()> {
    run_with(input, book, settings, &mut PromptChooser)
}

pub fn run_with(input: &Path, book: &mut Book, settings: &Settings, chooser: &mut dyn AccountChooser) -> Result<()> {
    let rows = fetch_transactions(input)?;
    let existing = book.account_full_names(true)?;
    let earliest = book.earliest_post_date()?;
    let prepared = prepared_transactions(&existing, earliest, &rows, settings, chooser)?;

    let transactions = mapped_transactions(
        &prepared.non_invest,
        chrono::Local::now().naive_local(),
        &settings.currency,
    );
    let added = book.add_transactions(&transactions)?;
    book.save()?;

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Splits", "Amount"]);
    for txn in &transactions {
        // Every amount appears once on each side.
        let moved = txn.splits.iter().map(|s| s.value.abs()).sum::<Decimal>() / Decimal::TWO;
        table.add_row(vec![
            Cell::new(txn.post_date),
            Cell::new(&txn.description),
            Cell::new(txn.splits.len()),
            Cell::new(money(moved, &settings.currency)),
        ]);
    }
    println!("Transactions\n{table}");
    println!("{}", format!("Income and expense transactions imported: {added}.").green());
    if !prepared.invest.is_empty() {
        println!(
            "{}",
            format!("{} investment transactions were not imported.", prepared.invest.len()).yellow()
        );
    }
    Ok(())
}
