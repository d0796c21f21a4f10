//! Error types for the comms module.

use ledgervault_core::{Classified, ErrorKind};
use thiserror::Error;

/// Errors raised while reaching a remote server or serving connections.
#[derive(Debug, Error)]
pub enum CommsError {
    /// A URL string that is not `scheme://host:port`.
    #[error("{0}: invalid url. Expected scheme://host:port")]
    InvalidUrl(String),

    #[error("Unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    /// No reply within the configured connection timeout.
    #[error("Connection timeout")]
    Timeout,

    #[error("Failed to send transaction: {0}")]
    Send(String),

    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    MessageTooLarge { size: usize, limit: usize },

    /// I/O error on the listening side.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classified for CommsError {
    fn kind(&self) -> ErrorKind {
        match self {
            CommsError::InvalidUrl(_) => ErrorKind::Type,
            CommsError::UnsupportedScheme(_) => ErrorKind::Request,
            CommsError::Timeout
            | CommsError::Send(_)
            | CommsError::MessageTooLarge { .. }
            | CommsError::Io(_) => ErrorKind::Communication,
        }
    }
}

/// Result type for comms operations.
pub type Result<T> = std::result::Result<T, CommsError>;
