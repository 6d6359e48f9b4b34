use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::{default_keywords, Classifier, KeywordTable};
use crate::error::{MigrateError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mnemonic of the single currency every account and transaction uses.
    pub currency: String,
    /// Description for migrated accounts and memo for opening balances.
    pub default_memo: String,
    pub opening_balances_account: String,
    /// Transactions whose category starts with this are investment activity.
    pub investment_prefix: String,
    /// Value of the split column that marks one leg of a multi-split transaction.
    pub split_marker: String,
    pub date_format: String,
    pub transaction_fields: FieldMappings,
    /// Replaces the built-in account type keywords when present.
    pub account_keywords: Option<KeywordTable>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            default_memo: "Migrated by Move2GnuCash".to_string(),
            opening_balances_account: "Equity:Opening Balances".to_string(),
            investment_prefix: "Investments:".to_string(),
            split_marker: "S".to_string(),
            date_format: "%m/%d/%Y".to_string(),
            transaction_fields: FieldMappings::default(),
            account_keywords: None,
        }
    }
}

impl Settings {
    pub fn classifier(&self) -> Result<Classifier> {
        match &self.account_keywords {
            Some(table) => Classifier::new(table),
            None => Classifier::new(&default_keywords()),
        }
    }
}

/// Column headers of Quicken's transaction export, keyed by what they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMappings {
    pub date: String,
    pub description: String,
    /// Category, the account the money goes to.
    pub to: String,
    pub transfer: String,
    pub amount: String,
    pub memo: String,
    pub tags: String,
    /// The Quicken account the transaction was recorded in.
    pub from: String,
    pub split: String,
    pub fitid: String,
}

impl Default for FieldMappings {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            description: "Payee".to_string(),
            to: "Category".to_string(),
            transfer: "Transfer".to_string(),
            amount: "Amount".to_string(),
            memo: "Memo/Notes".to_string(),
            tags: "Tags".to_string(),
            from: "Account".to_string(),
            split: "Split".to_string(),
            fitid: "FITID".to_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("move2gnucash")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Loads settings from `path`, or from the default location when `path` is `None`.
///
/// A missing default file yields the defaults; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(p) if !p.exists() => return Err(MigrateError::MissingFile(p.to_path_buf())),
        Some(p) => p.to_path_buf(),
        None => settings_path(),
    };
    if !path.exists() {
        log::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    log::info!("Loaded settings from {}", path.display());
    Ok(settings)
}
