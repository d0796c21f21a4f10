//! # LedgerVault
//!
//! Data vaults whose access rules live on a ledger.
//!
//! ## Overview
//!
//! A vault server holds data on behalf of a contract owner. Who may read,
//! write or append each object is recorded in the contract, not on the
//! server. Every request travels as a signed envelope, so the server knows
//! who is asking and can check the contract before it touches any data.
//!
//! - **[`VaultKeeper`]**: the server engine. Decodes a request, enforces the
//!   contract, calls the data server and signs the reply. It never fails.
//! - **[`RemoteVault`]**: the client. Signs requests, checks that the reply
//!   came from the expected server and turns error responses back into errors.
//!
//! ## Access Rules
//!
//! | Operation | Allowed when |
//! |---|---|
//! | `create` | signatory owns the contract and it has not expired |
//! | `write` | signatory can write the object and the contract has not expired |
//! | `append` | signatory can append to the object and the contract has not expired |
//! | `read` | signatory can read the object and the contract has not expired |
//! | `delete` | signatory owns the contract and it has expired |
//!
//! Objects inside a directory (`0x..02/notes.txt`) take their permissions
//! from the directory. Reading a directory by its bare address returns a
//! listing of its objects.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ledgervault::{RemoteVault, VaultKeeper};
//! use ledgervault::comms::{ServerConfig, VaultServer};
//! use ledgervault::core::Key;
//! use ledgervault::perms::MemoryLedger;
//! use ledgervault::store::SqliteDataServer;
//! use serde_json::json;
//!
//! async fn example(owner: Key, contract: &str) {
//!     // Server side
//!     let store = SqliteDataServer::open("vaults.db").unwrap();
//!     let keeper = Arc::new(VaultKeeper::new(store, MemoryLedger::new(), Key::generate()));
//!     let server_address = keeper.address().to_hex();
//!     let server = VaultServer::bind(ServerConfig::default(), keeper).await.unwrap();
//!     let handle = server.spawn().unwrap();
//!
//!     // Client side
//!     let vault = RemoteVault::new("file://localhost:8124", contract, owner, &server_address).unwrap();
//!     vault.create().await.unwrap();
//!     vault.write(json!("Hello World!"), None).await.unwrap();
//!
//!     handle.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ledgervault::core` - Keys, addresses, envelopes and messages
//! - `ledgervault::perms` - Permissions, filenames and the ledger traits
//! - `ledgervault::store` - The data server trait and implementations
//! - `ledgervault::comms` - Transports and the TCP vault server

pub mod error;
pub mod keeper;
pub mod remote;

// Re-export component crates
pub use ledgervault_comms as comms;
pub use ledgervault_core as core;
pub use ledgervault_perms as perms;
pub use ledgervault_store as store;

pub use error::{Result, VaultError};
pub use keeper::{KeeperConfig, VaultKeeper};
pub use remote::RemoteVault;

pub use ledgervault_core::{Address, Classified, ErrorKind, Key, VaultRequest, VaultResponse};
