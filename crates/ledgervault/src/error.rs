//! Error types for the vault keeper and client.

use ledgervault_comms::CommsError;
use ledgervault_core::{Classified, CoreError, ErrorKind};
use ledgervault_perms::PermsError;
use ledgervault_store::StoreError;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by vault operations.
///
/// Component errors pass through unchanged so that their wire name and
/// message survive the trip to the client.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Perms(#[from] PermsError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Comms(#[from] CommsError),

    /// A request of one operation was routed to another, or names no known operation.
    #[error("{0}")]
    InvalidTransaction(String),

    /// The envelope did not carry a `VaultRequest`.
    #[error("{0}")]
    Request(String),

    /// A [`RemoteVault`](crate::RemoteVault) could not be built.
    #[error("Failed to construct vault: {message}")]
    Construction {
        message: String,
        details: Option<Value>,
    },

    /// An error reported by the remote server.
    #[error("{message}")]
    Remote {
        kind: ErrorKind,
        message: String,
        details: Option<Value>,
    },

    /// A failure with no better classification, such as a panic inside a handler.
    #[error("{0}")]
    Internal(String),
}

impl VaultError {
    /// Wrap any classified error as a construction failure, keeping its details.
    pub(crate) fn construction<E: Classified>(error: E) -> Self {
        VaultError::Construction {
            message: error.to_string(),
            details: error.details(),
        }
    }

    /// True for faults inside the keeper or its backends, as opposed to
    /// requests that were refused.
    pub fn is_failure(&self) -> bool {
        matches!(self, VaultError::Internal(_)) || self.kind() == ErrorKind::Internal
    }
}

impl Classified for VaultError {
    fn kind(&self) -> ErrorKind {
        match self {
            VaultError::Core(e) => e.kind(),
            VaultError::Perms(e) => e.kind(),
            VaultError::Store(e) => e.kind(),
            VaultError::Comms(e) => e.kind(),
            VaultError::InvalidTransaction(_) => ErrorKind::InvalidTransaction,
            VaultError::Request(_) => ErrorKind::Request,
            VaultError::Construction { .. } => ErrorKind::Vault,
            VaultError::Remote { kind, .. } => *kind,
            VaultError::Internal(_) => ErrorKind::Transaction,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            VaultError::Core(e) => e.details(),
            VaultError::Perms(e) => e.details(),
            VaultError::Store(e) => e.details(),
            VaultError::Comms(e) => e.details(),
            VaultError::Construction { details, .. } | VaultError::Remote { details, .. } => {
                details.clone()
            }
            _ => None,
        }
    }
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
