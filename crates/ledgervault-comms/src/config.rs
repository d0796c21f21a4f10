//! Client and server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default limit on a single envelope, in bytes.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Settings for outbound sends.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on a whole exchange: connect, send and reply.
    pub connection_timeout: Duration,
    /// Replies larger than this are rejected.
    pub max_message_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_millis(3000),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Settings for [`VaultServer`](crate::VaultServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// How long a client has to deliver its whole request.
    pub read_timeout: Duration,
    /// How long a client has to take the whole reply.
    pub write_timeout: Duration,
    /// Requests larger than this are dropped unanswered.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8124)),
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}
