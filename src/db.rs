use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use crate::error::Result;

/// Tables of GnuCash's SQLite backend that this tool reads or writes.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gnclock (
    hostname VARCHAR(255),
    pid INT
);

CREATE TABLE IF NOT EXISTS versions (
    table_name TEXT(50) PRIMARY KEY NOT NULL,
    table_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS books (
    guid TEXT(32) PRIMARY KEY NOT NULL,
    root_account_guid TEXT(32) NOT NULL,
    root_template_guid TEXT(32) NOT NULL
);

CREATE TABLE IF NOT EXISTS commodities (
    guid TEXT(32) PRIMARY KEY NOT NULL,
    namespace TEXT(2048) NOT NULL,
    mnemonic TEXT(2048) NOT NULL,
    fullname TEXT(2048),
    cusip TEXT(2048),
    fraction INTEGER NOT NULL,
    quote_flag INTEGER NOT NULL,
    quote_source TEXT(2048),
    quote_tz TEXT(2048)
);

CREATE TABLE IF NOT EXISTS accounts (
    guid TEXT(32) PRIMARY KEY NOT NULL,
    name TEXT(2048) NOT NULL,
    account_type TEXT(2048) NOT NULL,
    commodity_guid TEXT(32),
    commodity_scu INTEGER NOT NULL,
    non_std_scu INTEGER NOT NULL,
    parent_guid TEXT(32),
    code TEXT(2048),
    description TEXT(2048),
    hidden INTEGER,
    placeholder INTEGER
);

CREATE TABLE IF NOT EXISTS transactions (
    guid TEXT(32) PRIMARY KEY NOT NULL,
    currency_guid TEXT(32) NOT NULL,
    num TEXT(2048) NOT NULL,
    post_date TEXT(19),
    enter_date TEXT(19),
    description TEXT(2048)
);
CREATE INDEX IF NOT EXISTS tx_post_date_index ON transactions (post_date);

CREATE TABLE IF NOT EXISTS splits (
    guid TEXT(32) PRIMARY KEY NOT NULL,
    tx_guid TEXT(32) NOT NULL,
    account_guid TEXT(32) NOT NULL,
    memo TEXT(2048) NOT NULL,
    action TEXT(2048) NOT NULL,
    reconcile_state TEXT(1) NOT NULL,
    reconcile_date TEXT(19),
    value_num BIGINT NOT NULL,
    value_denom BIGINT NOT NULL,
    quantity_num BIGINT NOT NULL,
    quantity_denom BIGINT NOT NULL,
    lot_guid TEXT(32)
);
CREATE INDEX IF NOT EXISTS splits_tx_guid_index ON splits (tx_guid);
CREATE INDEX IF NOT EXISTS splits_account_guid_index ON splits (account_guid);

CREATE TABLE IF NOT EXISTS slots (
    id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    obj_guid TEXT(32) NOT NULL,
    name TEXT(4096) NOT NULL,
    slot_type INTEGER NOT NULL,
    int64_val BIGINT,
    string_val TEXT(4096),
    double_val FLOAT8,
    timespec_val TEXT(19),
    guid_val TEXT(32),
    numeric_val_num BIGINT,
    numeric_val_denom BIGINT,
    gdate_val TEXT(8)
);
CREATE INDEX IF NOT EXISTS slots_guid_index ON slots (obj_guid);
";

const TABLE_VERSIONS: &[(&str, i64)] = &[
    ("Gnucash", 3_000_000),
    ("Gnucash-Resave", 19_920),
    ("books", 1),
    ("commodities", 1),
    ("accounts", 1),
    ("transactions", 4),
    ("splits", 5),
    ("slots", 4),
];

pub const SLOT_TYPE_STRING: i64 = 4;
pub const SLOT_TYPE_GDATE: i64 = 10;

/// Smallest currency unit: amounts are stored in hundredths.
pub const CURRENCY_FRACTION: i64 = 100;

const ROOT_ACCOUNT: &str = "Root Account";
const TEMPLATE_ROOT: &str = "Template Root";

/// GnuCash identifiers are 16 random bytes written as 32 lower-case hex digits.
pub fn new_guid() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// GnuCash stores posted dates at 10:59 UTC so they read as the same day in any time zone.
pub fn post_date_text(date: NaiveDate) -> String {
    format!("{} 10:59:00", date.format("%Y-%m-%d"))
}

pub fn timestamp_text(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn gdate_text(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    Ok(Connection::open(db_path)?)
}

/// Creates an empty book: schema, the currency, both root accounts and the book record.
pub fn init_db(conn: &mut Connection, currency: &str) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA)?;

    for (table, version) in TABLE_VERSIONS {
        tx.execute(
            "INSERT OR REPLACE INTO versions (table_name, table_version) VALUES (?1, ?2)",
            rusqlite::params![table, version],
        )?;
    }

    let commodity_guid = new_guid();
    tx.execute(
        "INSERT INTO commodities (guid, namespace, mnemonic, fullname, cusip, fraction, quote_flag, quote_source, quote_tz)
         VALUES (?1, 'CURRENCY', ?2, ?2, '', ?3, 1, 'currency', '')",
        rusqlite::params![commodity_guid, currency, CURRENCY_FRACTION],
    )?;

    let root_guid = new_guid();
    tx.execute(
        "INSERT INTO accounts (guid, name, account_type, commodity_guid, commodity_scu, non_std_scu, parent_guid, code, description, hidden, placeholder)
         VALUES (?1, ?2, 'ROOT', ?3, ?4, 0, NULL, '', '', 0, 0)",
        rusqlite::params![root_guid, ROOT_ACCOUNT, commodity_guid, CURRENCY_FRACTION],
    )?;
    let template_guid = new_guid();
    tx.execute(
        "INSERT INTO accounts (guid, name, account_type, commodity_guid, commodity_scu, non_std_scu, parent_guid, code, description, hidden, placeholder)
         VALUES (?1, ?2, 'ROOT', NULL, 0, 0, NULL, '', '', 0, 0)",
        rusqlite::params![template_guid, TEMPLATE_ROOT],
    )?;

    tx.execute(
        "INSERT INTO books (guid, root_account_guid, root_template_guid) VALUES (?1, ?2, ?3)",
        rusqlite::params![new_guid(), root_guid, template_guid],
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = get_connection(&dir.path().join("test.gnucash")).unwrap();
        init_db(&mut conn, "USD").unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["versions", "books", "commodities", "accounts", "transactions", "splits", "slots"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_seeds_book() {
        let (_dir, conn) = test_db();
        let (root_name, root_type): (String, String) = conn
            .query_row(
                "SELECT a.name, a.account_type FROM books b JOIN accounts a ON a.guid = b.root_account_guid",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(root_name, "Root Account");
        assert_eq!(root_type, "ROOT");

        let (mnemonic, fraction): (String, i64) = conn
            .query_row("SELECT mnemonic, fraction FROM commodities", [], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap();
        assert_eq!(mnemonic, "USD");
        assert_eq!(fraction, 100);
    }

    #[test]
    fn test_guids_are_hex_and_unique() {
        let a = new_guid();
        let b = new_guid();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_date_text() {
        let date = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap();
        assert_eq!(post_date_text(date), "2016-12-31 10:59:00");
        assert_eq!(gdate_text(date), "20161231");
        assert_eq!(timestamp_text(date.and_hms_opt(8, 5, 3).unwrap()), "2016-12-31 08:05:03");
    }
}
