use std::collections::HashSet;
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::book::Book;
use crate::error::Result;
use crate::fmt::money;
use crate::importer::fetch_accounts;
use crate::mapper::{mapped_accounts, mapped_transactions, opening_transactions};
use crate::preparation::prepared_balances;
use crate::settings::Settings;

/// Accounts and their opening balances from a net worth report.
pub fn run(input: &Path, book: &mut Book, settings: &Settings) -> Result<()> {
    let report = fetch_accounts(input)?;
    let prepared = prepared_balances(&report, settings)?;

    let existing: HashSet<String> = book.account_full_names(false)?.into_iter().collect();
    let needs_equity = !existing.contains(&settings.opening_balances_account);
    let accounts = mapped_accounts(&prepared, needs_equity, settings);

    // Accounts already in the book keep the balance they have.
    let (openings, kept): (Vec<_>, Vec<_>) = opening_transactions(&prepared)
        .into_iter()
        .partition(|t| !existing.contains(&t.acct_from));
    if !kept.is_empty() {
        log::warn!("Skipping {} opening balances for accounts already in the book", kept.len());
    }
    let transactions = mapped_transactions(&openings, chrono::Local::now().naive_local(), &settings.currency);

    let created = book.create_accounts(&accounts)?;
    let added = book.add_transactions(&transactions)?;
    book.save()?;

    let mut table = Table::new();
    table.set_header(vec!["Account Type", "Balance"]);
    for (account_type, total) in book.totals_by_type()? {
        table.add_row(vec![
            Cell::new(account_type),
            Cell::new(money(total, &settings.currency)),
        ]);
    }
    println!("Balances as of {}\n{table}", report.as_of_date);
    println!(
        "{}",
        format!("Accounts and opening balances imported: {created} accounts, {added} transactions.").green()
    );
    Ok(())
}
