//! Strong type definitions for LedgerVault.
//!
//! Addresses, hashes and signatures travel as hex strings on the wire. Inside
//! the process they are fixed-size newtypes so that length invariants hold
//! by construction.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Length of the textual form of an address: `0x` + 40 hex chars.
pub const ADDRESS_STR_LEN: usize = 42;

/// A 20-byte ledger address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Also names a vault's root object.
    pub const ZERO: Self = Self([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse `0x` followed by exactly 40 hex digits, in any case.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.strip_prefix("0x")?;
        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut arr = [0u8; 20];
        hex::decode_to_slice(digits, &mut arr).ok()?;
        Some(Self(arr))
    }

    /// True if `s` is a syntactically valid address.
    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_some()
    }

    /// Parse, naming the offending argument on failure.
    pub fn parse_named(s: &str, name: &str) -> Result<Self, CoreError> {
        Self::parse(s).ok_or_else(|| CoreError::InvalidAddress(name.to_string()))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_named(s, "address")
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 32-byte keccak256 digest. Textual form is 64 hex chars with no prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keccak256Hash(pub [u8; 32]);

impl Keccak256Hash {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse exactly 64 hex digits.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if s.len() != 64 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidHash("hash is missing or invalid".into()));
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)
            .map_err(|e| CoreError::InvalidHash(format!("hash is invalid: {}", e)))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keccak256Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Keccak256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Keccak256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 65-byte recoverable ECDSA signature: `r ‖ s ‖ recovery_id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature(pub [u8; 65]);

impl RecoverableSignature {
    pub const fn from_bytes(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// The trailing recovery byte as transmitted.
    pub const fn recovery_byte(&self) -> u8 {
        self.0[64]
    }

    /// 130 lowercase hex chars.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidSignature(
                "signature: invalid type. Expected hex string".into(),
            ));
        }
        if s.len() != 130 {
            return Err(CoreError::InvalidSignature(format!(
                "signature must be 65 bytes, got {} hex chars",
                s.len()
            )));
        }
        let mut arr = [0u8; 65];
        hex::decode_to_slice(s, &mut arr)
            .map_err(|e| CoreError::InvalidSignature(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({}...)", &self.to_hex()[..16])
    }
}

/// An uncompressed secp256k1 public key without the leading `0x04` tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 64]);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 128 hex chars, or 130 with a leading `04` tag.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let body = match s.len() {
            130 if s.starts_with("04") => &s[2..],
            _ => s,
        };
        if body.len() != 128 {
            return Err(CoreError::Argument(
                "publicKey: invalid type. Expected hex string of length 128".into(),
            ));
        }
        let mut arr = [0u8; 64];
        hex::decode_to_slice(body, &mut arr).map_err(|e| CoreError::Argument(e.to_string()))?;
        Ok(Self(arr))
    }

    /// SEC1 uncompressed encoding (`0x04 ‖ x ‖ y`).
    pub fn to_sec1(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..].copy_from_slice(&self.0);
        out
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", &self.to_hex()[..16])
    }
}

// Hex-string serde for the fixed-size newtypes.
macro_rules! hex_string_serde {
    ($ty:ty, $parse:expr) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let parse: fn(&str) -> Result<$ty, CoreError> = $parse;
                parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_string_serde!(Address, |s| Address::parse_named(s, "address"));
hex_string_serde!(Keccak256Hash, Keccak256Hash::from_hex);
hex_string_serde!(RecoverableSignature, RecoverableSignature::from_hex);
hex_string_serde!(PublicKey, PublicKey::from_hex);
