//! # LedgerVault Comms
//!
//! Moving signed envelopes between clients and vault servers.
//!
//! ## Overview
//!
//! The protocol is one envelope out, one envelope back, per connection. This
//! crate carries those bytes and nothing else: it does not sign, decode or
//! authorize. The URL scheme selects the carrier:
//!
//! | Scheme | Transport |
//! |---|---|
//! | `file` | [`TcpTransport`] - raw stream, half-close delimits the request |
//! | `ws`, `wss` | [`WebSocketTransport`] - one text frame each way |
//! | `http`, `https` | [`HttpTransport`] - POST body and response body |
//!
//! Every send is bounded by [`ClientConfig::connection_timeout`]. There is no
//! retry.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgervault_comms::{connect, ClientConfig, ServerUrl};
//!
//! async fn example(envelope: String) {
//!     let url: ServerUrl = "file://localhost:8124".parse().unwrap();
//!     let transport = connect(&url, &ClientConfig::default()).unwrap();
//!     let reply = transport.send(envelope).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod transport;
pub mod url;

pub use config::{ClientConfig, ServerConfig};
pub use error::{CommsError, Result};
pub use server::{ServerHandle, VaultServer};
pub use transport::{
    connect, HttpTransport, LoopbackTransport, RequestHandler, TcpTransport, Transport,
    WebSocketTransport,
};
pub use url::{Scheme, ServerUrl};
