use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("No account type keyword found in '{0}'")]
    UnclassifiedAccount(String),

    #[error("Failure. Missing account for '{0}'")]
    MissingAccount(String),

    #[error("'{choice}' is not one of the candidates for '{candidate}'")]
    InvalidChoice { candidate: String, choice: String },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown commodity: {0}")]
    UnknownCommodity(String),

    #[error("Book already exists: {}", .0.display())]
    BookExists(PathBuf),

    #[error("Book not found: {}", .0.display())]
    BookNotFound(PathBuf),

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Missing column '{0}' in transactions file")]
    MissingColumn(String),

    #[error("Transaction '{description}' is not balanced (off by {imbalance})")]
    Unbalanced {
        description: String,
        imbalance: Decimal,
    },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, MigrateError>;
