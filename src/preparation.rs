use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::account_names::{name_of, parent_of, reconstruct_paths};
use crate::error::{MigrateError, Result};
use crate::importer::{parse_amount, parse_date};
use crate::models::{
    AccountType, AccountsReport, NamedAccount, PreparedAccount, PreparedTransaction,
    PreparedTransactions, RawAccountRow, RawTransactionRow,
};
use crate::resolver::{AccountChooser, AccountResolver};
use crate::settings::Settings;
use crate::utils::combined_strings_by;

const OPENING_DESCRIPTION: &str = "Opening Balance";
const OPENING_NUM: &str = "1";

// ---------------------------------------------------------------------------
// Accounts and categories
// ---------------------------------------------------------------------------

fn prepared_accounts_from(rows: &[RawAccountRow], settings: &Settings) -> Result<Vec<(PreparedAccount, Option<Decimal>)>> {
    let classifier = settings.classifier()?;
    reconstruct_paths(rows)
        .into_iter()
        .map(|NamedAccount { path_and_name, balance }| {
            let placeholder = balance.is_none();
            let account_type = classifier.classify(&path_and_name, placeholder)?;
            let account = PreparedAccount {
                name: name_of(&path_and_name).to_string(),
                parent: parent_of(&path_and_name),
                placeholder,
                account_type,
                commodity: settings.currency.clone(),
                description: settings.default_memo.clone(),
                opening: None,
                path_and_name,
            };
            Ok((account, balance))
        })
        .collect()
}

/// Accounts from a net worth report, each non-placeholder carrying its opening balance.
pub fn prepared_balances(report: &AccountsReport, settings: &Settings) -> Result<Vec<PreparedAccount>> {
    log::info!("Preparing accounts and balances as of {}", report.as_of_date);
    let accounts = prepared_accounts_from(&report.rows, settings)?
        .into_iter()
        .map(|(mut account, balance)| {
            account.opening = balance.map(|balance| {
                // Share balances are not carried over.
                let amount = if account.account_type == AccountType::Stock {
                    Decimal::ZERO
                } else {
                    -balance
                };
                PreparedTransaction {
                    split: false,
                    date: report.as_of_date,
                    description: OPENING_DESCRIPTION.to_string(),
                    acct_from: account.path_and_name.clone(),
                    acct_to: settings.opening_balances_account.clone(),
                    amount,
                    memo: settings.default_memo.clone(),
                    num: OPENING_NUM.to_string(),
                }
            });
            account
        })
        .collect();
    Ok(accounts)
}

pub fn prepared_category_accounts(rows: &[RawAccountRow], settings: &Settings) -> Result<Vec<PreparedAccount>> {
    log::info!("Preparing category accounts");
    Ok(prepared_accounts_from(rows, settings)?
        .into_iter()
        .map(|(account, _)| account)
        .collect())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

fn required<'r>(row: &'r RawTransactionRow, header: &str) -> Result<&'r str> {
    row.get(header)
        .map(String::as_str)
        .ok_or_else(|| MigrateError::MissingColumn(header.to_string()))
}

fn optional<'r>(row: &'r RawTransactionRow, header: &str) -> &'r str {
    row.get(header).map(String::as_str).unwrap_or_default()
}

/// Quicken writes transfer targets as `[Account Name]`.
fn transfer_target(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .unwrap_or(raw)
}

/// Turns exported transaction rows into prepared rows whose accounts exist in the book.
///
/// Rows dated on or before `earliest_date` are already covered by the opening
/// balances and are dropped, except investment activity, which is kept whatever
/// its date. Investment rows resolve only their "from" account.
pub fn prepared_transactions(
    book_accounts: &[String],
    earliest_date: Option<NaiveDate>,
    rows: &[RawTransactionRow],
    settings: &Settings,
    chooser: &mut dyn AccountChooser,
) -> Result<PreparedTransactions> {
    let fields = &settings.transaction_fields;
    let mut resolver = AccountResolver::new(book_accounts.to_vec(), chooser);
    let mut prepared = PreparedTransactions::default();
    let mut skipped = 0;

    for row in rows {
        let date = parse_date(required(row, &fields.date)?, &settings.date_format)?;
        let transfer = optional(row, &fields.transfer);
        let acct_to = if transfer.trim().is_empty() {
            required(row, &fields.to)?.trim()
        } else {
            transfer_target(transfer)
        };
        let is_invest = acct_to.starts_with(&settings.investment_prefix);

        if let Some(cutoff) = earliest_date {
            if !is_invest && date <= cutoff {
                skipped += 1;
                continue;
            }
        }

        let acct_from = resolver.resolve(required(row, &fields.from)?.trim())?;
        let amount = -parse_amount(required(row, &fields.amount)?)?;
        let txn = PreparedTransaction {
            split: optional(row, &fields.split).trim() == settings.split_marker,
            date,
            description: optional(row, &fields.description).to_string(),
            acct_to: if is_invest {
                acct_to.to_string()
            } else {
                resolver.resolve(acct_to)?
            },
            acct_from,
            amount,
            memo: combined_strings_by(optional(row, &fields.memo), optional(row, &fields.tags), ";"),
            num: optional(row, &fields.fitid).to_string(),
        };
        if is_invest {
            prepared.invest.push(txn);
        } else {
            prepared.non_invest.push(txn);
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} transactions dated on or before the opening balances");
    }
    log::info!(
        "Prepared {} transactions and {} investment transactions",
        prepared.non_invest.len(),
        prepared.invest.len()
    );
    Ok(prepared)
}
