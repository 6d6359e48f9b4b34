use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::db::{
    gdate_text, get_connection, init_db, new_guid, post_date_text, timestamp_text, SLOT_TYPE_GDATE,
    SLOT_TYPE_STRING,
};
use crate::error::{MigrateError, Result};
use crate::models::{AccountToMove, AccountType, Parent, TransactionToMove};
use crate::utils::{hierarchy_from, string_trimmed_before, ACCOUNT_SEPARATOR};

// ---------------------------------------------------------------------------
// Opening and creating books
// ---------------------------------------------------------------------------

/// A GnuCash book stored in SQLite.
pub struct Book {
    conn: Connection,
    root_guid: String,
    path: Option<PathBuf>,
}

pub fn create_book(path: &Path, currency: &str, overwrite: bool) -> Result<Book> {
    if path.exists() {
        if !overwrite {
            return Err(MigrateError::BookExists(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
    }
    let mut conn = get_connection(path)?;
    init_db(&mut conn, currency)?;
    log::info!("Created book {}", path.display());
    Book::from_connection(conn, Some(path.to_path_buf()))
}

pub fn open_book(path: &Path) -> Result<Book> {
    if !path.exists() {
        return Err(MigrateError::BookNotFound(path.to_path_buf()));
    }
    let conn = get_connection(path)?;
    log::info!("Opened book {}", path.display());
    Book::from_connection(conn, Some(path.to_path_buf()))
}

/// An empty book that lives only in memory, for dry runs.
pub fn memory_book(currency: &str) -> Result<Book> {
    let mut conn = Connection::open_in_memory()?;
    init_db(&mut conn, currency)?;
    Book::from_connection(conn, None)
}

// ---------------------------------------------------------------------------
// Reading the chart of accounts
// ---------------------------------------------------------------------------

struct BookAccount {
    guid: String,
    full_name: String,
    placeholder: bool,
}

/// Every account under the root, with its colon-joined full name.
fn load_accounts(conn: &Connection, root_guid: &str) -> Result<Vec<BookAccount>> {
    let mut stmt = conn.prepare(
        "SELECT guid, name, parent_guid, COALESCE(placeholder, 0) FROM accounts WHERE account_type != 'ROOT' ORDER BY rowid",
    )?;
    let rows: Vec<(String, String, Option<String>, bool)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let by_guid: HashMap<&str, (&str, Option<&str>)> = rows
        .iter()
        .map(|(guid, name, parent, _)| (guid.as_str(), (name.as_str(), parent.as_deref())))
        .collect();

    let mut accounts = Vec::with_capacity(rows.len());
    for (guid, _, _, placeholder) in &rows {
        let mut names = Vec::new();
        let mut current = Some(guid.as_str());
        // Walk up until the root; an account outside the tree has no full name.
        let mut under_root = false;
        while let Some(g) = current {
            if g == root_guid {
                under_root = true;
                break;
            }
            match by_guid.get(g) {
                Some((name, parent)) if names.len() <= rows.len() => {
                    names.push(*name);
                    current = *parent;
                }
                _ => break,
            }
        }
        if !under_root {
            continue;
        }
        names.reverse();
        accounts.push(BookAccount {
            guid: guid.clone(),
            full_name: names.join(":"),
            placeholder: *placeholder,
        });
    }
    Ok(accounts)
}

fn commodity(conn: &Connection, mnemonic: &str) -> Result<(String, i64)> {
    conn.query_row(
        "SELECT guid, fraction FROM commodities WHERE mnemonic = ?1",
        [mnemonic],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?
    .ok_or_else(|| MigrateError::UnknownCommodity(mnemonic.to_string()))
}

/// Finds a split's account by full name, falling back to a unique short name.
fn split_account_guid(accounts: &[BookAccount], reference: &str) -> Result<String> {
    if let Some(a) = accounts.iter().find(|a| a.full_name == reference) {
        return Ok(a.guid.clone());
    }
    let short = string_trimmed_before(reference, ":", None);
    let mut by_short = accounts
        .iter()
        .filter(|a| a.full_name.rsplit(ACCOUNT_SEPARATOR).next() == Some(short.as_str()));
    match (by_short.next(), by_short.next()) {
        (Some(a), None) => Ok(a.guid.clone()),
        _ => Err(MigrateError::UnknownAccount(reference.to_string())),
    }
}

fn to_fraction(value: Decimal, fraction: i64) -> Result<i64> {
    (value * Decimal::from(fraction))
        .round()
        .to_i64()
        .ok_or_else(|| MigrateError::InvalidAmount(value.to_string()))
}

fn insert_slot_string(tx: &Transaction, obj_guid: &str, name: &str, value: &str) -> Result<()> {
    tx.execute(
        "INSERT INTO slots (obj_guid, name, slot_type, string_val) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![obj_guid, name, SLOT_TYPE_STRING, value],
    )?;
    Ok(())
}

fn insert_slot_gdate(tx: &Transaction, obj_guid: &str, name: &str, date: NaiveDate) -> Result<()> {
    tx.execute(
        "INSERT INTO slots (obj_guid, name, slot_type, gdate_val) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![obj_guid, name, SLOT_TYPE_GDATE, gdate_text(date)],
    )?;
    Ok(())
}

impl Book {
    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        let root_guid: String = conn
            .query_row("SELECT root_account_guid FROM books LIMIT 1", [], |row| row.get(0))
            .optional()?
            .ok_or_else(|| MigrateError::BookNotFound(path.clone().unwrap_or_default()))?;
        Ok(Self { conn, root_guid, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    pub fn account_full_names(&self, non_placeholder_only: bool) -> Result<Vec<String>> {
        Ok(load_accounts(&self.conn, &self.root_guid)?
            .into_iter()
            .filter(|a| !(non_placeholder_only && a.placeholder))
            .map(|a| a.full_name)
            .collect())
    }

    pub fn earliest_post_date(&self) -> Result<Option<NaiveDate>> {
        let earliest: Option<String> =
            self.conn
                .query_row("SELECT MIN(post_date) FROM transactions", [], |row| row.get(0))?;
        earliest
            .map(|text| {
                let day = text.get(..10).unwrap_or(&text);
                NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| MigrateError::InvalidDate(text.clone()))
            })
            .transpose()
    }

    pub fn account_count(&self) -> Result<usize> {
        let n: i64 = self.conn.query_row(
            "SELECT count(*) FROM accounts WHERE account_type != 'ROOT'",
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn transaction_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT count(*) FROM transactions", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Sum of split values per account type, for the types that have any splits.
    /// GnuCash types this tool never creates, such as `CHECKING`, are left out.
    pub fn totals_by_type(&self) -> Result<Vec<(AccountType, Decimal)>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.account_type, s.value_num, s.value_denom
             FROM splits s JOIN accounts a ON a.guid = s.account_guid",
        )?;
        let rows: Vec<(String, i64, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut totals: HashMap<AccountType, Decimal> = HashMap::new();
        for (type_name, num, denom) in rows {
            let Ok(account_type) = type_name.parse::<AccountType>() else {
                log::debug!("Leaving {type_name} splits out of the totals");
                continue;
            };
            let value = Decimal::from(num) / Decimal::from(denom.max(1));
            *totals.entry(account_type).or_default() += value;
        }
        Ok(AccountType::ALL
            .iter()
            .filter_map(|t| totals.get(t).map(|v| (*t, *v)))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Adds accounts in order, so a parent must come before its children.
    ///
    /// Accounts already in the book are left alone. The batch is written in
    /// one database transaction. Returns how many accounts were created.
    pub fn create_accounts(&mut self, accounts: &[AccountToMove]) -> Result<usize> {
        let mut guids: HashMap<String, String> = load_accounts(&self.conn, &self.root_guid)?
            .into_iter()
            .map(|a| (a.full_name, a.guid))
            .collect();
        let mut commodities: HashMap<String, (String, i64)> = HashMap::new();

        let tx = self.conn.transaction()?;
        let mut created = 0;
        for account in accounts {
            let (full_name, parent_guid) = match &account.parent {
                Parent::Root => (account.name.clone(), self.root_guid.clone()),
                Parent::Path(parent) => {
                    let Some(guid) = guids.get(parent) else {
                        let missing = hierarchy_from(parent)
                            .into_iter()
                            .map(|(path, _)| path)
                            .find(|path| !guids.contains_key(path))
                            .unwrap_or_else(|| parent.clone());
                        return Err(MigrateError::UnknownAccount(missing));
                    };
                    (format!("{parent}:{}", account.name), guid.clone())
                }
            };
            if guids.contains_key(&full_name) {
                log::warn!("Account {full_name} already exists, skipping");
                continue;
            }

            if !commodities.contains_key(&account.commodity) {
                let found = commodity(&tx, &account.commodity)?;
                commodities.insert(account.commodity.clone(), found);
            }
            let (commodity_guid, fraction) = &commodities[&account.commodity];

            let guid = new_guid();
            tx.execute(
                "INSERT INTO accounts (guid, name, account_type, commodity_guid, commodity_scu, non_std_scu, parent_guid, code, description, hidden, placeholder)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, '', ?7, 0, ?8)",
                rusqlite::params![
                    guid,
                    account.name,
                    account.account_type.as_str(),
                    commodity_guid,
                    fraction,
                    parent_guid,
                    account.description,
                    account.placeholder,
                ],
            )?;
            log::debug!("Created account {full_name} ({})", account.account_type);
            guids.insert(full_name, guid);
            created += 1;
        }
        tx.commit()?;
        log::info!("Created {created} accounts");
        Ok(created)
    }

    /// Adds balanced transactions. The batch is written in one database transaction.
    pub fn add_transactions(&mut self, transactions: &[TransactionToMove]) -> Result<usize> {
        let accounts = load_accounts(&self.conn, &self.root_guid)?;
        let mut currencies: HashMap<String, (String, i64)> = HashMap::new();

        let tx = self.conn.transaction()?;
        for txn in transactions {
            if !txn.is_balanced() {
                return Err(MigrateError::Unbalanced {
                    description: txn.description.clone(),
                    imbalance: txn.imbalance(),
                });
            }
            if !currencies.contains_key(&txn.currency) {
                let found = commodity(&tx, &txn.currency)?;
                currencies.insert(txn.currency.clone(), found);
            }
            let (currency_guid, fraction) = &currencies[&txn.currency];

            let guid = new_guid();
            tx.execute(
                "INSERT INTO transactions (guid, currency_guid, num, post_date, enter_date, description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    guid,
                    currency_guid,
                    txn.num,
                    post_date_text(txn.post_date),
                    timestamp_text(txn.enter_date),
                    txn.description,
                ],
            )?;
            insert_slot_gdate(&tx, &guid, "date-posted", txn.post_date)?;
            if !txn.notes.is_empty() {
                insert_slot_string(&tx, &guid, "notes", &txn.notes)?;
            }

            for split in &txn.splits {
                let account_guid = split_account_guid(&accounts, &split.account)?;
                let value = to_fraction(split.value, *fraction)?;
                tx.execute(
                    "INSERT INTO splits (guid, tx_guid, account_guid, memo, action, reconcile_state, reconcile_date,
                                         value_num, value_denom, quantity_num, quantity_denom, lot_guid)
                     VALUES (?1, ?2, ?3, ?4, '', 'n', NULL, ?5, ?6, ?5, ?6, NULL)",
                    rusqlite::params![new_guid(), guid, account_guid, split.memo, value, fraction],
                )?;
            }
            log::debug!("Added transaction {} on {}", txn.description, txn.post_date);
        }
        tx.commit()?;
        log::info!("Added {} transactions", transactions.len());
        Ok(transactions.len())
    }

    /// Commits anything a caller left open on the connection.
    pub fn save(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        if let Some(path) = &self.path {
            log::info!("Saved book {}", path.display());
        }
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.save()?;
        self.conn.close().map_err(|(_, e)| MigrateError::Db(e))
    }
}
