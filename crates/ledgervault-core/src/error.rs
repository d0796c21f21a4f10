//! Error types for LedgerVault Core.
//!
//! Every error raised anywhere in LedgerVault maps onto one [`ErrorKind`].
//! The kind carries the stable name that travels over the wire inside an
//! error `VaultResponse`, and a parent so callers can match on whole
//! families (`kind.is_a(ErrorKind::Blockchain)`).

use serde_json::Value;
use thiserror::Error;

/// The closed taxonomy of wire-visible error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Root of the hierarchy. Also used for names a peer sends that we do not know.
    General,
    /// A low-level software fault that should never happen.
    Internal,
    Developer,
    Argument,
    Type,
    InvalidHash,
    Cryptographic,
    InvalidSignature,
    Hashing,
    Blockchain,
    ContractOwner,
    ContractType,
    ContractExpiry,
    Permission,
    Transaction,
    InvalidTransaction,
    MalformedTransaction,
    Communication,
    Request,
    Vault,
    FileSystem,
}

impl ErrorKind {
    /// All kinds, root first.
    pub const ALL: [ErrorKind; 21] = [
        ErrorKind::General,
        ErrorKind::Internal,
        ErrorKind::Developer,
        ErrorKind::Argument,
        ErrorKind::Type,
        ErrorKind::InvalidHash,
        ErrorKind::Cryptographic,
        ErrorKind::InvalidSignature,
        ErrorKind::Hashing,
        ErrorKind::Blockchain,
        ErrorKind::ContractOwner,
        ErrorKind::ContractType,
        ErrorKind::ContractExpiry,
        ErrorKind::Permission,
        ErrorKind::Transaction,
        ErrorKind::InvalidTransaction,
        ErrorKind::MalformedTransaction,
        ErrorKind::Communication,
        ErrorKind::Request,
        ErrorKind::Vault,
        ErrorKind::FileSystem,
    ];

    /// The wire name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::General => "Error",
            ErrorKind::Internal => "InternalError",
            ErrorKind::Developer => "DeveloperError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Type => "TypeError",
            ErrorKind::InvalidHash => "InvalidHashError",
            ErrorKind::Cryptographic => "CryptographicError",
            ErrorKind::InvalidSignature => "InvalidSignatureError",
            ErrorKind::Hashing => "HashingError",
            ErrorKind::Blockchain => "BlockchainError",
            ErrorKind::ContractOwner => "ContractOwnerError",
            ErrorKind::ContractType => "ContractTypeError",
            ErrorKind::ContractExpiry => "ContractExpiryError",
            ErrorKind::Permission => "PermissionError",
            ErrorKind::Transaction => "TransactionError",
            ErrorKind::InvalidTransaction => "InvalidTransactionError",
            ErrorKind::MalformedTransaction => "MalformedTransactionError",
            ErrorKind::Communication => "CommunicationError",
            ErrorKind::Request => "RequestError",
            ErrorKind::Vault => "VaultError",
            ErrorKind::FileSystem => "FileSystemError",
        }
    }

    /// Look up a kind by wire name. Unknown names fall back to [`ErrorKind::General`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .unwrap_or(ErrorKind::General)
    }

    /// The immediate parent kind, or `None` for the root.
    pub const fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::General => None,
            ErrorKind::Argument | ErrorKind::Type | ErrorKind::InvalidHash => {
                Some(ErrorKind::Developer)
            }
            ErrorKind::InvalidSignature | ErrorKind::Hashing => Some(ErrorKind::Cryptographic),
            ErrorKind::ContractOwner
            | ErrorKind::ContractType
            | ErrorKind::ContractExpiry
            | ErrorKind::Permission => Some(ErrorKind::Blockchain),
            ErrorKind::InvalidTransaction
            | ErrorKind::MalformedTransaction
            | ErrorKind::Communication
            | ErrorKind::Request => Some(ErrorKind::Transaction),
            _ => Some(ErrorKind::General),
        }
    }

    /// True if `self` is `ancestor` or descends from it.
    pub fn is_a(self, ancestor: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An error that can be reported to a remote peer.
///
/// The `Display` output of the error is the human-readable message that is
/// sent on the wire, so implementors keep it free of prefixes.
pub trait Classified: std::error::Error {
    /// The wire-visible kind.
    fn kind(&self) -> ErrorKind;

    /// Optional structured details.
    fn details(&self) -> Option<Value> {
        None
    }
}

/// Core errors raised by identity, signing and envelope operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A caller passed something that is not a 64-char hex hash.
    #[error("{0}")]
    InvalidHash(String),

    /// A caller passed something that is not a `0x` + 40 hex address.
    #[error("{0}: invalid type. Expected address")]
    InvalidAddress(String),

    #[error("{0}: invalid type. Expected hex string of length 64")]
    InvalidPrivateKey(String),

    #[error("{0}")]
    InvalidSignature(String),

    #[error("{0}")]
    Cryptographic(String),

    #[error("{0}")]
    Argument(String),

    #[error("{message}")]
    MalformedTransaction {
        message: String,
        details: Option<Value>,
    },

    #[error("{message}")]
    Transaction {
        message: String,
        details: Option<Value>,
    },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Shorthand for a malformed transaction without details.
    pub fn malformed(message: impl Into<String>) -> Self {
        CoreError::MalformedTransaction {
            message: message.into(),
            details: None,
        }
    }

    /// Shorthand for a transaction error without details.
    pub fn transaction(message: impl Into<String>) -> Self {
        CoreError::Transaction {
            message: message.into(),
            details: None,
        }
    }
}

impl Classified for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidHash(_) => ErrorKind::InvalidHash,
            CoreError::InvalidAddress(_) | CoreError::InvalidPrivateKey(_) => ErrorKind::Type,
            CoreError::InvalidSignature(_) => ErrorKind::InvalidSignature,
            CoreError::Cryptographic(_) | CoreError::Encryption(_) | CoreError::Decryption(_) => {
                ErrorKind::Cryptographic
            }
            CoreError::Argument(_) => ErrorKind::Argument,
            CoreError::MalformedTransaction { .. } => ErrorKind::MalformedTransaction,
            CoreError::Transaction { .. } => ErrorKind::Transaction,
            CoreError::Serialization(_) => ErrorKind::Internal,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            CoreError::MalformedTransaction { details, .. }
            | CoreError::Transaction { details, .. } => details.clone(),
            _ => None,
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
