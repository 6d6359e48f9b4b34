use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{MigrateError, Result};
use crate::models::{AccountsReport, RawAccountRow, RawTransactionRow};
use crate::utils::string_trimmed_after;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parses a Quicken amount: `"1,234.56"`, `$12.00` and `(5.00)` are all accepted.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    let invalid = || MigrateError::InvalidAmount(raw.to_string());
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Decimal::from_str(inner.trim()).map(|d| -d).map_err(|_| invalid());
    }
    Decimal::from_str(s).map_err(|_| invalid())
}

pub fn parse_date(raw: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format)
        .map_err(|_| MigrateError::InvalidDate(raw.to_string()))
}

/// Net worth reports are saved as `YYYY_MM_DD_<anything>.csv`; the prefix is the balance date.
pub fn as_of_date_from(file_path: &Path) -> Result<NaiveDate> {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let date_part = string_trimmed_after(&stem, "_", Some(3));
    parse_date(&date_part, "%Y_%m_%d")
}

fn open_csv(file_path: &Path, has_headers: bool) -> Result<csv::Reader<std::io::BufReader<std::fs::File>>> {
    if !file_path.exists() {
        return Err(MigrateError::MissingFile(file_path.to_path_buf()));
    }
    let file = std::fs::File::open(file_path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file)))
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Account and category reports
// ---------------------------------------------------------------------------

fn read_account_rows(file_path: &Path) -> Result<Vec<RawAccountRow>> {
    let mut rdr = open_csv(file_path, false)?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let balance = match cell(&record, 2) {
            Some(raw) => Some(parse_amount(&raw)?),
            None => None,
        };
        rows.push(RawAccountRow {
            root: cell(&record, 0),
            account: cell(&record, 1),
            balance,
        });
    }
    Ok(rows)
}

/// Reads a headerless root/account/balance net worth report.
pub fn fetch_accounts(file_path: &Path) -> Result<AccountsReport> {
    let rows = read_account_rows(file_path)?;
    let as_of_date = as_of_date_from(file_path)?;
    log::info!("Read {} account rows as of {as_of_date}", rows.len());
    Ok(AccountsReport { as_of_date, rows })
}

/// Reads a category report, which has the same shape as the net worth report.
pub fn fetch_categories(file_path: &Path) -> Result<Vec<RawAccountRow>> {
    let rows = read_account_rows(file_path)?;
    log::info!("Read {} category rows", rows.len());
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Reads a headed transaction export, one header-to-value map per record.
pub fn fetch_transactions(file_path: &Path) -> Result<Vec<RawTransactionRow>> {
    let mut rdr = open_csv(file_path, true)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let row: RawTransactionRow = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| v.trim().to_string()))
            .collect();
        rows.push(row);
    }
    log::info!("Read {} transaction rows", rows.len());
    Ok(rows)
}
