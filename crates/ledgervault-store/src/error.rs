//! Error types for the store module.

use ledgervault_core::{Address, Classified, ErrorKind};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during data server operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vault already exists")]
    VaultExists(Address),

    #[error("vault does not exist")]
    VaultNotFound(Address),

    #[error("file does not exist")]
    FileNotFound(String),

    /// Append is defined for strings and arrays only.
    #[error("cannot append {data} data to a {existing} file")]
    NotAppendable {
        existing: &'static str,
        data: &'static str,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored data could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A thread panicked while holding the store's lock.
    #[error("storage lock poisoned")]
    Poisoned,

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl Classified for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::VaultExists(_)
            | StoreError::VaultNotFound(_)
            | StoreError::NotAppendable { .. } => ErrorKind::Vault,
            StoreError::FileNotFound(_) => ErrorKind::FileSystem,
            StoreError::Database(_)
            | StoreError::Serialization(_)
            | StoreError::Poisoned
            | StoreError::Migration(_) => ErrorKind::Internal,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            StoreError::VaultExists(contract) | StoreError::VaultNotFound(contract) => {
                Some(Value::String(contract.to_hex()))
            }
            StoreError::FileNotFound(file) => Some(Value::String(file.clone())),
            _ => None,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
