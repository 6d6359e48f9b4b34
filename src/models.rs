use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MigrateError;

/// GnuCash account types this tool can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
    Cash,
    Bank,
    Credit,
    Payable,
    Receivable,
    Stock,
    Mutual,
    Trading,
}

impl AccountType {
    pub const ALL: [AccountType; 13] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
        Self::Cash,
        Self::Bank,
        Self::Credit,
        Self::Payable,
        Self::Receivable,
        Self::Stock,
        Self::Mutual,
        Self::Trading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Equity => "EQUITY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Cash => "CASH",
            Self::Bank => "BANK",
            Self::Credit => "CREDIT",
            Self::Payable => "PAYABLE",
            Self::Receivable => "RECEIVABLE",
            Self::Stock => "STOCK",
            Self::Mutual => "MUTUAL",
            Self::Trading => "TRADING",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| MigrateError::Settings(format!("unknown account type: {s}")))
    }
}

/// Parent of an account: the book root or a full colon-delimited path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    Root,
    Path(String),
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::Path(p) => f.write_str(p),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw rows, as read from Quicken's CSV reports
// ---------------------------------------------------------------------------

/// One line of a Quicken net worth or category report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAccountRow {
    pub root: Option<String>,
    pub account: Option<String>,
    pub balance: Option<Decimal>,
}

/// A net worth report along with the date its balances were taken.
#[derive(Debug, Clone)]
pub struct AccountsReport {
    pub as_of_date: NaiveDate,
    pub rows: Vec<RawAccountRow>,
}

/// One record of a Quicken transaction export, keyed by column header.
pub type RawTransactionRow = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Prepared rows
// ---------------------------------------------------------------------------

/// Fully qualified account path reconstructed from an indented report.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAccount {
    pub path_and_name: String,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAccount {
    pub path_and_name: String,
    pub name: String,
    pub parent: Parent,
    pub placeholder: bool,
    pub account_type: AccountType,
    pub commodity: String,
    pub description: String,
    pub opening: Option<PreparedTransaction>,
}

/// Canonical transaction row shared by the balances and transactions pipelines.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTransaction {
    pub split: bool,
    pub date: NaiveDate,
    pub description: String,
    pub acct_from: String,
    pub acct_to: String,
    pub amount: Decimal,
    pub memo: String,
    pub num: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreparedTransactions {
    pub non_invest: Vec<PreparedTransaction>,
    pub invest: Vec<PreparedTransaction>,
}

// ---------------------------------------------------------------------------
// Records handed to the book
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AccountToMove {
    pub name: String,
    pub account_type: AccountType,
    pub parent: Parent,
    pub commodity: String,
    pub placeholder: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitToMove {
    pub account: String,
    pub value: Decimal,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionToMove {
    pub post_date: NaiveDate,
    pub enter_date: NaiveDateTime,
    pub currency: String,
    pub description: String,
    pub notes: String,
    /// Check number or FITID.
    pub num: String,
    pub splits: Vec<SplitToMove>,
}

impl TransactionToMove {
    pub fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|s| s.value).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }
}
