//! # LedgerVault Store
//!
//! Data servers: where authorized vault contents live.
//!
//! ## Overview
//!
//! A vault server keeps one vault per ledger contract. Each vault holds JSON
//! values under vault filenames. The [`DataServer`] trait is the boundary the
//! keeper calls once a request has passed its ledger checks.
//!
//! ## Key Types
//!
//! - [`DataServer`] - The async trait for vault storage
//! - [`SqliteDataServer`] - SQLite-based persistent storage
//! - [`MemoryDataServer`] - In-memory storage
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgervault_core::Address;
//! use ledgervault_store::{DataServer, SqliteDataServer};
//! use serde_json::json;
//!
//! async fn example(contract: Address) {
//!     let store = SqliteDataServer::open("vaults.db").unwrap();
//!     store.create(&contract, None).await.unwrap();
//!
//!     let root = Address::ZERO.to_hex();
//!     store.write(&contract, &root, &json!("Hello World!"), None).await.unwrap();
//!     let data = store.read(&contract, &root, None).await.unwrap();
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryDataServer;
pub use sqlite::SqliteDataServer;
pub use traits::DataServer;
