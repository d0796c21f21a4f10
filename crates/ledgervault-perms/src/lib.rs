//! # LedgerVault Permissions
//!
//! Access control as recorded on a ledger contract.
//!
//! ## Overview
//!
//! A vault does not keep its own access lists. Every request is checked
//! against a contract that records the vault's owner, an expiry condition,
//! and a permissions byte per (requester, object) pair. This crate holds the
//! vocabulary for those checks:
//!
//! - [`Permissions`] - The decoded permissions byte (`d---_rwa`)
//! - [`VaultFilename`] - The `[directory/]file` object name grammar
//! - [`LedgerContract`] - Queries against one contract
//! - [`LedgerContractExt`] - Assertions that fail with the client-visible error
//! - [`SubscriptionRegistry`] - Notification of matching deployments
//! - [`MemoryLedger`] - A ledger held in memory
//!
//! ## Directory Inheritance
//!
//! Objects inside a directory have no permissions of their own. The
//! permission for `0x..02/passport.png` is the permission on `0x..02`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgervault_perms::{Ledger, LedgerContractExt, MemoryLedger, Permissions, VaultFilename};
//! # async fn example(owner: ledgervault_core::Address, reader: ledgervault_core::Address) {
//! let ledger = MemoryLedger::new();
//! let contract = ledger.deploy(&owner, "6080").await.unwrap();
//!
//! let name = VaultFilename::parse("0x0000000000000000000000000000000000000002/notes.txt");
//! let dir = name.permission_address().unwrap();
//! ledger
//!     .set_permissions(&owner, &contract, &reader, &dir, Permissions::DIRECTORY.with(Permissions::READ))
//!     .unwrap();
//!
//! let handle = ledger.contract(&contract);
//! handle.assert_can_read(&reader, &dir).await.unwrap();
//! # }
//! ```

pub mod error;
pub mod filename;
pub mod ledger;
pub mod memory;
pub mod permissions;
pub mod subscription;

pub use error::{PermsError, Result};
pub use filename::VaultFilename;
pub use ledger::{bytecode_hash, Ledger, LedgerContract, LedgerContractExt};
pub use memory::{MemoryContract, MemoryLedger};
pub use permissions::Permissions;
pub use subscription::{
    DeploymentCallback, SubscriptionFilter, SubscriptionId, SubscriptionRegistry,
};
