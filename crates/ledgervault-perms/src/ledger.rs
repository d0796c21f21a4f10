//! The ledger contract capability.
//!
//! A vault consults an on-chain contract for three facts: who owns it,
//! whether it has expired, and what permissions an address holds on an
//! object. How those facts are fetched (RPC, cache, in-memory) is up to the
//! implementation; the keeper only sees this trait.

use std::sync::Arc;

use async_trait::async_trait;
use ledgervault_core::{hash, Address, Keccak256Hash};

use crate::error::{PermsError, Result};
use crate::permissions::Permissions;

/// Read-only queries against one deployed contract.
///
/// `file` arguments are permission addresses: the directory for objects
/// inside a directory, the object's own address otherwise. See
/// [`VaultFilename::permission_address`](crate::VaultFilename::permission_address).
#[async_trait]
pub trait LedgerContract: Send + Sync {
    /// The contract's address.
    fn address(&self) -> Address;

    async fn owner(&self) -> Result<Address>;

    async fn has_expired(&self) -> Result<bool>;

    /// The permissions byte held by `requester` on `file`.
    async fn get_permissions(&self, requester: &Address, file: &Address) -> Result<Permissions>;

    /// Runtime bytecode, hex without `0x`.
    async fn bytecode(&self) -> Result<String>;
}

/// Resolves contract handles by address.
pub trait Ledger: Send + Sync {
    /// A handle bound to `address`. No query is made until the handle is used.
    fn contract(&self, address: &Address) -> Arc<dyn LedgerContract>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn contract(&self, address: &Address) -> Arc<dyn LedgerContract> {
        (**self).contract(address)
    }
}

/// Assertions built on [`LedgerContract`] queries.
///
/// Each assertion fails with the error a rejected client receives.
pub trait LedgerContractExt: LedgerContract {
    /// Fail with `ContractOwnerError` unless `signatory` owns the contract.
    fn assert_owner(
        &self,
        signatory: &Address,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fail with `ContractExpiryError` if the contract has expired.
    fn assert_not_expired(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fail with `ContractExpiryError` unless the contract has expired.
    fn assert_has_expired(&self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fail with `PermissionError` unless `requester` may read `file`.
    /// Returns the permissions so callers can inspect the directory bit.
    fn assert_can_read(
        &self,
        requester: &Address,
        file: &Address,
    ) -> impl std::future::Future<Output = Result<Permissions>> + Send;

    fn assert_can_write(
        &self,
        requester: &Address,
        file: &Address,
    ) -> impl std::future::Future<Output = Result<Permissions>> + Send;

    fn assert_can_append(
        &self,
        requester: &Address,
        file: &Address,
    ) -> impl std::future::Future<Output = Result<Permissions>> + Send;

    fn can_read(
        &self,
        requester: &Address,
        file: &Address,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Fail with `ContractTypeError` unless the deployed bytecode equals
    /// `expected`. A leading `0x` on `expected` is ignored.
    fn assert_bytecode(
        &self,
        expected: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl<C: LedgerContract + ?Sized> LedgerContractExt for C {
    async fn assert_owner(&self, signatory: &Address) -> Result<()> {
        if self.owner().await? != *signatory {
            return Err(PermsError::NotOwner);
        }
        Ok(())
    }

    async fn assert_not_expired(&self) -> Result<()> {
        if self.has_expired().await? {
            return Err(PermsError::Expired);
        }
        Ok(())
    }

    async fn assert_has_expired(&self) -> Result<()> {
        if !self.has_expired().await? {
            return Err(PermsError::NotExpired);
        }
        Ok(())
    }

    async fn assert_can_read(&self, requester: &Address, file: &Address) -> Result<Permissions> {
        let permissions = self.get_permissions(requester, file).await?;
        permitted(permissions, permissions.can_read())
    }

    async fn assert_can_write(&self, requester: &Address, file: &Address) -> Result<Permissions> {
        let permissions = self.get_permissions(requester, file).await?;
        permitted(permissions, permissions.can_write())
    }

    async fn assert_can_append(&self, requester: &Address, file: &Address) -> Result<Permissions> {
        let permissions = self.get_permissions(requester, file).await?;
        permitted(permissions, permissions.can_append())
    }

    async fn can_read(&self, requester: &Address, file: &Address) -> Result<bool> {
        Ok(self.get_permissions(requester, file).await?.can_read())
    }

    async fn assert_bytecode(&self, expected: &str) -> Result<()> {
        let expected = expected.strip_prefix("0x").unwrap_or(expected);
        if self.bytecode().await? != expected {
            return Err(PermsError::BytecodeMismatch);
        }
        Ok(())
    }
}

fn permitted(permissions: Permissions, allowed: bool) -> Result<Permissions> {
    if allowed {
        Ok(permissions)
    } else {
        Err(PermsError::permission_denied())
    }
}

/// The hash subscribers use to identify a contract type: keccak256 of the
/// bytecode's hex text without `0x`.
pub fn bytecode_hash(bytecode: &str) -> Keccak256Hash {
    hash(bytecode.strip_prefix("0x").unwrap_or(bytecode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervault_core::{Classified, ErrorKind};

    struct FixedContract {
        owner: Address,
        expired: bool,
        permissions: Permissions,
    }

    #[async_trait]
    impl LedgerContract for FixedContract {
        fn address(&self) -> Address {
            Address::from_bytes([9; 20])
        }

        async fn owner(&self) -> Result<Address> {
            Ok(self.owner)
        }

        async fn has_expired(&self) -> Result<bool> {
            Ok(self.expired)
        }

        async fn get_permissions(&self, _: &Address, _: &Address) -> Result<Permissions> {
            Ok(self.permissions)
        }

        async fn bytecode(&self) -> Result<String> {
            Ok("6080".into())
        }
    }

    fn contract(expired: bool, permissions: Permissions) -> FixedContract {
        FixedContract {
            owner: Address::from_bytes([1; 20]),
            expired,
            permissions,
        }
    }

    #[tokio::test]
    async fn test_assert_owner() {
        let c = contract(false, Permissions::NONE);
        assert!(c.assert_owner(&Address::from_bytes([1; 20])).await.is_ok());
        let err = c.assert_owner(&Address::from_bytes([2; 20])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractOwner);
        assert_eq!(err.to_string(), "owner does not match");
    }

    #[tokio::test]
    async fn test_expiry_assertions() {
        let live = contract(false, Permissions::NONE);
        assert!(live.assert_not_expired().await.is_ok());
        let err = live.assert_has_expired().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractExpiry);
        assert_eq!(err.to_string(), "contract has not expired");

        let dead = contract(true, Permissions::NONE);
        assert!(dead.assert_has_expired().await.is_ok());
        assert_eq!(
            dead.assert_not_expired().await.unwrap_err().to_string(),
            "contract has expired"
        );
    }

    #[tokio::test]
    async fn test_permission_assertions() {
        let who = Address::from_bytes([2; 20]);
        let file = Address::ZERO;
        let c = contract(false, Permissions::DIRECTORY.with(Permissions::READ));

        let p = c.assert_can_read(&who, &file).await.unwrap();
        assert!(p.is_directory());
        assert!(c.can_read(&who, &file).await.unwrap());

        let err = c.assert_can_write(&who, &file).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(err.to_string(), "permission denied");
        assert!(c.assert_can_append(&who, &file).await.is_err());
    }

    #[tokio::test]
    async fn test_assert_bytecode() {
        let c = contract(false, Permissions::NONE);
        assert!(c.assert_bytecode("6080").await.is_ok());
        assert!(c.assert_bytecode("0x6080").await.is_ok());
        let err = c.assert_bytecode("6081").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractType);
    }

    #[tokio::test]
    async fn test_assertions_through_trait_object() {
        let c: Arc<dyn LedgerContract> = Arc::new(contract(true, Permissions::ALL));
        assert!(c.assert_has_expired().await.is_ok());
        assert!(c
            .assert_can_write(&Address::ZERO, &Address::ZERO)
            .await
            .is_ok());
    }

    #[test]
    fn test_bytecode_hash_ignores_prefix() {
        assert_eq!(bytecode_hash("0x6080"), bytecode_hash("6080"));
        assert_eq!(bytecode_hash("6080"), hash("6080"));
    }
}
