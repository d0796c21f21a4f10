//! # LedgerVault Core
//!
//! Pure primitives for LedgerVault: identities, the signed envelope codec,
//! and the protocol messages exchanged with vault servers.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Key`] - A secp256k1 identity: private key, public key, address
//! - [`Address`] - A 20-byte ledger address (`0x` + 40 hex)
//! - [`Keccak256Hash`] - A 32-byte digest (64 hex, no prefix)
//! - [`RecoverableSignature`] - 65 bytes, `r ‖ s ‖ recovery_id`
//! - [`VaultRequest`] / [`VaultResponse`] - Protocol messages
//! - [`ErrorKind`] - The wire-visible error taxonomy
//!
//! ## Envelopes
//!
//! ```rust,no_run
//! use ledgervault_core::{envelope, Key};
//! use serde_json::json;
//!
//! let key = Key::generate();
//! let wire = envelope::encode(&json!({"hello": "world"}), &key).unwrap();
//! let decoded = envelope::decode(&wire).unwrap();
//! assert_eq!(decoded.signatory, key.address());
//! ```
//!
//! Payloads are hashed over their canonical JSON form. See [`canonical`].

pub mod canonical;
pub mod cipher;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod message;
pub mod types;

pub use canonical::{canonical_json, canonical_string};
pub use cipher::{SealedPayload, SharedKey};
pub use crypto::{calculate_contract_address, generate_key, hash, recover, sign, verify, Key};
pub use envelope::{decode, encode, encode_value, validate_response, Decoded};
pub use error::{Classified, CoreError, ErrorKind, Result};
pub use message::{
    create_error_response, create_success_response, ErrorObject, RequestType, ResponseType,
    VaultRequest, VaultResponse, GENERAL_RESPONSE, VAULT_REQUEST, VAULT_RESPONSE,
};
pub use types::{Address, Keccak256Hash, PublicKey, RecoverableSignature};
