use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::book::Book;
use crate::error::Result;
use crate::importer::fetch_categories;
use crate::mapper::mapped_accounts;
use crate::preparation::prepared_category_accounts;
use crate::settings::Settings;

/// Income and expense categories, added to the book as accounts.
pub fn run(input: &Path, book: &mut Book, settings: &Settings) -> Result<()> {
    let rows = fetch_categories(input)?;
    let prepared = prepared_category_accounts(&rows, settings)?;
    let accounts = mapped_accounts(&prepared, false, settings);

    let created = book.create_accounts(&accounts)?;
    book.save()?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Type", "Placeholder"]);
    for account in &prepared {
        table.add_row(vec![
            Cell::new(&account.path_and_name),
            Cell::new(account.account_type),
            Cell::new(if account.placeholder { "yes" } else { "" }),
        ]);
    }
    println!("Categories\n{table}");
    println!("{}", format!("Categories imported as accounts: {created} created.").green());
    Ok(())
}
