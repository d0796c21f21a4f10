//! Names of objects inside a vault.
//!
//! ```text
//! [directory/]file
//! ```
//!
//! Without a directory the name must itself be an address
//! (`0x0000000000000000000000000000000000000001`). With one, the directory
//! is an address and the file part is any POSIX file name except `.` and
//! `..` (`0x0000000000000000000000000000000000000002/my_file.txt`). Nested
//! directories are not permitted.
//!
//! Permission for `dir/file` is looked up on the ledger under `dir`.

use ledgervault_core::types::ADDRESS_STR_LEN;
use ledgervault_core::Address;

/// A parsed vault object name. Parsing never fails; check [`is_valid`](Self::is_valid).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultFilename {
    full_filename: String,
    directory: Option<Address>,
    file: String,
    is_valid: bool,
}

impl VaultFilename {
    pub fn parse(name: &str) -> Self {
        if name.len() <= ADDRESS_STR_LEN {
            return Self {
                full_filename: name.to_string(),
                directory: None,
                file: name.to_string(),
                is_valid: Address::is_valid(name),
            };
        }

        let directory = name.get(..ADDRESS_STR_LEN).and_then(Address::parse);
        let separator_ok = name.as_bytes()[ADDRESS_STR_LEN] == b'/';
        let file = name.get(ADDRESS_STR_LEN + 1..).unwrap_or_default();

        match directory {
            Some(directory) => Self {
                full_filename: name.to_string(),
                directory: Some(directory),
                file: file.to_string(),
                is_valid: separator_ok && is_posix_file_component(file),
            },
            // A name whose prefix is not an address has no directory at all.
            None => Self {
                full_filename: name.to_string(),
                directory: None,
                file: name.to_string(),
                is_valid: false,
            },
        }
    }

    /// The vault's root object (the zero address).
    pub fn root() -> Self {
        Self::parse(&Address::ZERO.to_hex())
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn has_directory(&self) -> bool {
        self.directory.is_some()
    }

    pub fn directory(&self) -> Option<Address> {
        self.directory
    }

    /// The file part: the whole name for root objects, the component after
    /// the `/` otherwise.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn full_filename(&self) -> &str {
        &self.full_filename
    }

    /// The name with its address part in lowercase, so that differently
    /// cased spellings of one object share a storage key. `None` if invalid.
    pub fn canonical_name(&self) -> Option<String> {
        if !self.is_valid {
            return None;
        }
        match self.directory {
            Some(directory) => Some(format!("{}/{}", directory, self.file)),
            None => Address::parse(&self.file).map(|a| a.to_hex()),
        }
    }

    /// The address permissions are looked up under: the directory when
    /// present, the object's own address otherwise. `None` if invalid.
    pub fn permission_address(&self) -> Option<Address> {
        if !self.is_valid {
            return None;
        }
        match self.directory {
            Some(directory) => Some(directory),
            None => Address::parse(&self.file),
        }
    }
}

fn is_posix_file_component(file: &str) -> bool {
    !file.is_empty() && file != "." && file != ".." && !file.contains(['\0', '/'])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_1: &str = "0x0000000000000000000000000000000000000001";
    const DIR_2: &str = "0x0000000000000000000000000000000000000002";

    #[test]
    fn test_plain_address() {
        let name = VaultFilename::parse(FILE_1);
        assert!(name.is_valid());
        assert!(!name.has_directory());
        assert_eq!(name.file(), FILE_1);
        assert_eq!(name.full_filename(), FILE_1);
        assert_eq!(name.permission_address(), Address::parse(FILE_1));
    }

    #[test]
    fn test_file_in_directory() {
        let full = format!("{}/my_file.txt", DIR_2);
        let name = VaultFilename::parse(&full);
        assert!(name.is_valid());
        assert!(name.has_directory());
        assert_eq!(name.directory(), Address::parse(DIR_2));
        assert_eq!(name.file(), "my_file.txt");
        assert_eq!(name.full_filename(), full);
        assert_eq!(name.permission_address(), Address::parse(DIR_2));
    }

    #[test]
    fn test_special_components_rejected() {
        for bad in ["..", ".", ""] {
            let name = VaultFilename::parse(&format!("{}/{}", DIR_2, bad));
            assert!(!name.is_valid(), "{:?} accepted", bad);
        }
        assert!(VaultFilename::parse(&format!("{}/...", DIR_2)).is_valid());
        assert!(VaultFilename::parse(&format!("{}/.hidden", DIR_2)).is_valid());
    }

    #[test]
    fn test_invalid_file_keeps_directory() {
        let name = VaultFilename::parse(&format!("{}/..", DIR_2));
        assert!(!name.is_valid());
        assert!(name.has_directory());
        assert_eq!(name.directory(), Address::parse(DIR_2));
        assert_eq!(name.permission_address(), None);
    }

    #[test]
    fn test_nested_directories_rejected() {
        let name = VaultFilename::parse(&format!("{}/{}/my_file.txt", DIR_2, FILE_1));
        assert!(!name.is_valid());
    }

    #[test]
    fn test_nul_rejected() {
        assert!(!VaultFilename::parse(&format!("{}/a\0b", DIR_2)).is_valid());
    }

    #[test]
    fn test_wrong_separator() {
        let name = VaultFilename::parse(&format!("{}\\my_file.txt", DIR_2));
        assert!(!name.is_valid());
    }

    #[test]
    fn test_non_address_names() {
        assert!(!VaultFilename::parse("my_file.txt").is_valid());
        assert!(!VaultFilename::parse("").is_valid());
        let long = VaultFilename::parse("this-is-a-long-name-that-is-not-an-address/file");
        assert!(!long.is_valid());
        assert!(!long.has_directory());
    }

    #[test]
    fn test_multibyte_names_do_not_panic() {
        let name = VaultFilename::parse(&"é".repeat(30));
        assert!(!name.is_valid());
        let name = VaultFilename::parse(&format!("{}/ファイル", DIR_2));
        assert!(name.is_valid());
        assert_eq!(name.file(), "ファイル");
    }

    #[test]
    fn test_canonical_name() {
        let upper = VaultFilename::parse("0x00000000000000000000000000000000000000AB/Notes.txt");
        assert_eq!(
            upper.canonical_name().as_deref(),
            Some("0x00000000000000000000000000000000000000ab/Notes.txt")
        );
        assert_eq!(VaultFilename::parse(FILE_1).canonical_name().as_deref(), Some(FILE_1));
        assert_eq!(VaultFilename::parse("nope").canonical_name(), None);
    }

    #[test]
    fn test_root() {
        let root = VaultFilename::root();
        assert!(root.is_valid());
        assert_eq!(root.permission_address(), Some(Address::ZERO));
    }
}
