//! # LedgerVault Testkit
//!
//! Testing utilities for LedgerVault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Well-known keys and a test contract with a fixed permission layout
//! - **Generators**: Proptest strategies for keys, addresses, payloads and filenames
//! - **Golden vectors**: Hashes and addresses every implementation must reproduce
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ledgervault_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{}: got {}", name, actual);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use ledgervault_perms::MemoryLedger;
//! use ledgervault_testkit::fixtures::{TestContract, ROOT};
//!
//! async fn example() {
//!     let ledger = MemoryLedger::new();
//!     let contract = TestContract::deploy(&ledger).await.unwrap();
//!     // owner:rwa, requester:r on the vault root
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{symbolic_permissions, TestContract, TestKeys};
pub use generators::{json_payload, key};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
