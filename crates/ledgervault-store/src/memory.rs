//! In-memory implementation of the DataServer trait.
//!
//! Same semantics as SQLite, nothing persisted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use ledgervault_core::Address;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::traits::{appended, list_directory, DataServer};

type Vault = BTreeMap<String, Value>;

/// In-memory data server. Thread-safe via RwLock.
#[derive(Debug, Default)]
pub struct MemoryDataServer {
    vaults: RwLock<HashMap<Address, Vault>>,
}

impl MemoryDataServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live vaults.
    pub fn vault_count(&self) -> Result<usize> {
        Ok(self.read_lock()?.len())
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, HashMap<Address, Vault>>> {
        self.vaults.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, HashMap<Address, Vault>>> {
        self.vaults.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl DataServer for MemoryDataServer {
    async fn create(&self, contract: &Address, _options: Option<&Value>) -> Result<()> {
        let mut vaults = self.write_lock()?;
        if vaults.contains_key(contract) {
            return Err(StoreError::VaultExists(*contract));
        }
        vaults.insert(*contract, Vault::new());
        Ok(())
    }

    async fn delete(&self, contract: &Address, _options: Option<&Value>) -> Result<()> {
        self.write_lock()?
            .remove(contract)
            .map(|_| ())
            .ok_or(StoreError::VaultNotFound(*contract))
    }

    async fn write(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        _options: Option<&Value>,
    ) -> Result<()> {
        let mut vaults = self.write_lock()?;
        let vault = vaults
            .get_mut(contract)
            .ok_or(StoreError::VaultNotFound(*contract))?;
        vault.insert(file.to_string(), data.clone());
        Ok(())
    }

    async fn append(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        _options: Option<&Value>,
    ) -> Result<()> {
        let mut vaults = self.write_lock()?;
        let vault = vaults
            .get_mut(contract)
            .ok_or(StoreError::VaultNotFound(*contract))?;
        let updated = appended(vault.get(file).cloned(), data)?;
        vault.insert(file.to_string(), updated);
        Ok(())
    }

    async fn read(&self, contract: &Address, file: &str, _options: Option<&Value>) -> Result<Value> {
        let vaults = self.read_lock()?;
        let vault = vaults
            .get(contract)
            .ok_or(StoreError::VaultNotFound(*contract))?;
        vault
            .get(file)
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound(file.to_string()))
    }

    async fn read_dir(
        &self,
        contract: &Address,
        dir: &Address,
        _options: Option<&Value>,
    ) -> Result<String> {
        let vaults = self.read_lock()?;
        let vault = vaults
            .get(contract)
            .ok_or(StoreError::VaultNotFound(*contract))?;
        Ok(list_directory(vault.keys().map(String::as_str), dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgervault_core::{Classified, ErrorKind};
    use serde_json::json;

    fn contract() -> Address {
        Address::from_bytes([0xc0; 20])
    }

    fn root() -> String {
        Address::ZERO.to_hex()
    }

    #[tokio::test]
    async fn test_create_write_read() {
        let server = MemoryDataServer::new();
        server.create(&contract(), None).await.unwrap();
        server.write(&contract(), &root(), &json!("Hello World!"), None).await.unwrap();
        assert_eq!(server.read(&contract(), &root(), None).await.unwrap(), json!("Hello World!"));
    }

    #[tokio::test]
    async fn test_create_twice() {
        let server = MemoryDataServer::new();
        server.create(&contract(), None).await.unwrap();
        let err = server.create(&contract(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Vault);
        assert_eq!(err.to_string(), "vault already exists");
    }

    #[tokio::test]
    async fn test_missing_vault_and_file() {
        let server = MemoryDataServer::new();
        let err = server.read(&contract(), &root(), None).await.unwrap_err();
        assert_eq!(err.to_string(), "vault does not exist");
        assert!(server.write(&contract(), &root(), &json!(1), None).await.is_err());
        assert!(server.delete(&contract(), None).await.is_err());

        server.create(&contract(), None).await.unwrap();
        let err = server.read(&contract(), &root(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileSystem);
        assert_eq!(err.to_string(), "file does not exist");
    }

    #[tokio::test]
    async fn test_append_keeps_failed_file() {
        let server = MemoryDataServer::new();
        server.create(&contract(), None).await.unwrap();
        server.append(&contract(), &root(), &json!("fish"), None).await.unwrap();
        server.append(&contract(), &root(), &json!(" and mushy peas"), None).await.unwrap();
        assert!(server.append(&contract(), &root(), &json!(3), None).await.is_err());
        assert_eq!(
            server.read(&contract(), &root(), None).await.unwrap(),
            json!("fish and mushy peas")
        );
    }

    #[tokio::test]
    async fn test_read_dir_and_delete() {
        let server = MemoryDataServer::new();
        let dir = Address::from_bytes([2; 20]);
        server.create(&contract(), None).await.unwrap();
        server
            .append(&contract(), &format!("{}/passport.png", dir), &json!("My passport"), None)
            .await
            .unwrap();
        assert_eq!(server.read_dir(&contract(), &dir, None).await.unwrap(), "passport.png");

        server.delete(&contract(), None).await.unwrap();
        assert_eq!(server.vault_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_reported() {
        let server = MemoryDataServer::new();
        server.create(&contract(), None).await.unwrap();
        std::thread::scope(|scope| {
            let holder = scope.spawn(|| {
                let _guard = server.vaults.write().unwrap();
                panic!("writer died");
            });
            assert!(holder.join().is_err());
        });

        let err = server.read(&contract(), &root(), None).await.unwrap_err();
        assert!(matches!(err, StoreError::Poisoned));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "storage lock poisoned");
        assert!(server.vault_count().is_err());
    }
}
