//! Error types for the permissions module.

use ledgervault_core::{Classified, CoreError, ErrorKind};
use thiserror::Error;

/// Errors raised by ledger queries and permission assertions.
///
/// Messages are exactly what a rejected client sees.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The signatory is not the contract owner.
    #[error("owner does not match")]
    NotOwner,

    #[error("contract has expired")]
    Expired,

    #[error("contract has not expired")]
    NotExpired,

    /// Access refused, either by the permission bits or by a structural rule
    /// such as writing to a directory.
    #[error("{0}")]
    Permission(String),

    #[error("bytecode does not match")]
    BytecodeMismatch,

    /// The ledger could not answer.
    #[error("{0}")]
    Ledger(String),

    /// A permissions byte given as a string was not `0x` + 2 hex digits.
    #[error("invalid string representation of permissions byte")]
    InvalidPermissions(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl PermsError {
    /// The plain `permission denied` rejection.
    pub fn permission_denied() -> Self {
        PermsError::Permission("permission denied".into())
    }
}

impl Classified for PermsError {
    fn kind(&self) -> ErrorKind {
        match self {
            PermsError::NotOwner => ErrorKind::ContractOwner,
            PermsError::Expired | PermsError::NotExpired => ErrorKind::ContractExpiry,
            PermsError::Permission(_) => ErrorKind::Permission,
            PermsError::BytecodeMismatch => ErrorKind::ContractType,
            PermsError::Ledger(_) => ErrorKind::Blockchain,
            PermsError::InvalidPermissions(_) => ErrorKind::Type,
            PermsError::Core(e) => e.kind(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PermsError::InvalidPermissions(given) => Some(serde_json::Value::String(given.clone())),
            PermsError::Core(e) => e.details(),
            _ => None,
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
