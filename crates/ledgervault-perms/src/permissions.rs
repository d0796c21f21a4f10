//! The permissions byte a ledger contract holds per (requester, file) pair.
//!
//! ```text
//!   bit 7     bits 6-3    bit 2   bit 1   bit 0
//! directory   reserved    read    write   append
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{PermsError, Result};

/// A decoded permissions byte. Reserved bits are kept but ignored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Permissions(u8);

impl Permissions {
    pub const NONE: Self = Self(0x00);
    pub const APPEND: Self = Self(0x01);
    pub const WRITE: Self = Self(0x02);
    pub const READ: Self = Self(0x04);
    pub const DIRECTORY: Self = Self(0x80);
    /// Read, write and append.
    pub const ALL: Self = Self(0x07);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Parse the `0x`-prefixed two-digit string form returned by ledger calls.
    pub fn from_hex_str(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .filter(|d| d.len() == 2 && d.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| PermsError::InvalidPermissions(s.to_string()))?;
        u8::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| PermsError::InvalidPermissions(s.to_string()))
    }

    pub const fn can_read(self) -> bool {
        self.0 & Self::READ.0 != 0
    }

    pub const fn can_write(self) -> bool {
        self.0 & Self::WRITE.0 != 0
    }

    pub const fn can_append(self) -> bool {
        self.0 & Self::APPEND.0 != 0
    }

    pub const fn is_directory(self) -> bool {
        self.0 & Self::DIRECTORY.0 != 0
    }

    /// Bitwise union.
    pub const fn with(self, other: Permissions) -> Self {
        Self(self.0 | other.0)
    }
}

impl From<u8> for Permissions {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl FromStr for Permissions {
    type Err = PermsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex_str(s)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "Permissions({}{}{}{})",
            flag(self.is_directory(), 'd'),
            flag(self.can_read(), 'r'),
            flag(self.can_write(), 'w'),
            flag(self.can_append(), 'a'),
        )
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_bits() {
        assert!(Permissions::READ.can_read());
        assert!(!Permissions::READ.can_write());
        assert!(Permissions::WRITE.can_write());
        assert!(Permissions::APPEND.can_append());
        assert!(Permissions::DIRECTORY.is_directory());
        assert!(!Permissions::NONE.can_read());
        let all = Permissions::ALL;
        assert!(all.can_read() && all.can_write() && all.can_append() && !all.is_directory());
    }

    #[test]
    fn test_from_hex_str() {
        assert_eq!(Permissions::from_hex_str("0x84").unwrap().bits(), 0x84);
        assert_eq!(Permissions::from_hex_str("0xFF").unwrap().bits(), 0xff);
        assert!(Permissions::from_hex_str("84").is_err());
        assert!(Permissions::from_hex_str("0x8").is_err());
        assert!(Permissions::from_hex_str("0x084").is_err());
        assert!(Permissions::from_hex_str("0xzz").is_err());
        assert!(Permissions::from_hex_str("0x+1").is_err());
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let p = Permissions::from_bits(0x78);
        assert!(!p.can_read() && !p.can_write() && !p.can_append() && !p.is_directory());
    }

    #[test]
    fn test_display_and_debug() {
        let p = Permissions::DIRECTORY.with(Permissions::READ);
        assert_eq!(p.to_string(), "0x84");
        assert_eq!(format!("{:?}", p), "Permissions(dr--)");
    }

    proptest! {
        #[test]
        fn bits_decode_independently(b in any::<u8>()) {
            let p = Permissions::from(b);
            prop_assert_eq!(p.can_read(), b & 0x04 != 0);
            prop_assert_eq!(p.can_write(), b & 0x02 != 0);
            prop_assert_eq!(p.can_append(), b & 0x01 != 0);
            prop_assert_eq!(p.is_directory(), b & 0x80 != 0);
        }

        #[test]
        fn string_and_number_forms_agree(b in any::<u8>()) {
            let from_str = Permissions::from_hex_str(&format!("0x{:02x}", b)).unwrap();
            prop_assert_eq!(from_str, Permissions::from(b));
        }
    }
}
