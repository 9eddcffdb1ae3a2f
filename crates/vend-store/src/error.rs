use std::fmt;

use vend_core::SaleError;

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Sale(SaleError),
    InvalidData(String),
    AlreadyInitialised,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(e) => write!(f, "SQLite error: {e}"),
            StoreError::Sale(e) => write!(f, "{e}"),
            StoreError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            StoreError::AlreadyInitialised => write!(f, "sale already initialised"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Sqlite(e)
    }
}

impl From<SaleError> for StoreError {
    fn from(e: SaleError) -> Self {
        StoreError::Sale(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
