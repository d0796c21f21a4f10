//! In-memory ledger for tests and local deployments.
//!
//! Contracts are deployed at the address a real chain would assign
//! (`calculate_contract_address(owner, nonce)`), so fixtures line up with
//! on-chain vectors.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use ledgervault_core::{calculate_contract_address, Address};

use crate::error::{PermsError, Result};
use crate::ledger::{bytecode_hash, Ledger, LedgerContract};
use crate::permissions::Permissions;
use crate::subscription::SubscriptionRegistry;

#[derive(Debug)]
struct ContractState {
    owner: Address,
    bytecode: String,
    terminated: bool,
    /// Keyed by (requester, file).
    permissions: HashMap<(Address, Address), Permissions>,
}

#[derive(Debug, Default)]
struct Inner {
    contracts: HashMap<Address, ContractState>,
    nonces: HashMap<Address, u64>,
}

/// A ledger held in process memory.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<RwLock<Inner>>,
    registry: Option<Arc<SubscriptionRegistry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inform `registry` of every deployment made through this ledger.
    pub fn with_registry(mut self, registry: Arc<SubscriptionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Deploy a contract owned by `owner`. Returns its address.
    pub async fn deploy(&self, owner: &Address, bytecode: &str) -> Result<Address> {
        self.deploy_with_permissions(owner, bytecode, &[]).await
    }

    /// Deploy a contract whose constructor grants `(requester, file, permissions)`
    /// for each entry of `grants`. Subscribers are informed once the grants are
    /// in place, so permitted-address filters see the initial permissions.
    pub async fn deploy_with_permissions(
        &self,
        owner: &Address,
        bytecode: &str,
        grants: &[(Address, Address, Permissions)],
    ) -> Result<Address> {
        let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode).to_string();
        let hash = bytecode_hash(&bytecode);
        let address = {
            let mut inner = self.write()?;
            let nonce = inner.nonces.entry(*owner).or_insert(0);
            let address = calculate_contract_address(owner, *nonce);
            *nonce += 1;
            let permissions = grants
                .iter()
                .map(|(requester, file, permissions)| ((*requester, *file), *permissions))
                .collect();
            inner.contracts.insert(
                address,
                ContractState {
                    owner: *owner,
                    bytecode,
                    terminated: false,
                    permissions,
                },
            );
            address
        };
        tracing::debug!(contract = %address, owner = %owner, grants = grants.len(), "contract deployed");

        if let Some(registry) = &self.registry {
            registry.notify_deployment(self, &address, &hash).await;
        }
        Ok(address)
    }

    /// Set `requester`'s permissions on `file`. Only the owner may do this.
    pub fn set_permissions(
        &self,
        caller: &Address,
        contract: &Address,
        requester: &Address,
        file: &Address,
        permissions: Permissions,
    ) -> Result<()> {
        let mut inner = self.write()?;
        let state = owned_contract(&mut inner, caller, contract)?;
        state.permissions.insert((*requester, *file), permissions);
        Ok(())
    }

    /// Terminate a contract. It reports expired from then on and grants nothing.
    pub fn terminate(&self, caller: &Address, contract: &Address) -> Result<()> {
        let mut inner = self.write()?;
        let state = owned_contract(&mut inner, caller, contract)?;
        state.terminated = true;
        state.permissions.clear();
        tracing::debug!(contract = %contract, "contract terminated");
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| poisoned())
    }

    fn read_contract<T>(&self, address: &Address, f: impl FnOnce(&ContractState) -> T) -> Result<T> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        inner
            .contracts
            .get(address)
            .map(f)
            .ok_or_else(|| no_contract(address))
    }
}

fn owned_contract<'a>(
    inner: &'a mut Inner,
    caller: &Address,
    contract: &Address,
) -> Result<&'a mut ContractState> {
    let state = inner
        .contracts
        .get_mut(contract)
        .ok_or_else(|| no_contract(contract))?;
    if state.owner != *caller {
        return Err(PermsError::NotOwner);
    }
    Ok(state)
}

fn poisoned() -> PermsError {
    PermsError::Ledger("ledger state poisoned".into())
}

fn no_contract(address: &Address) -> PermsError {
    PermsError::Ledger(format!("no contract deployed at {}", address))
}

impl Ledger for MemoryLedger {
    fn contract(&self, address: &Address) -> Arc<dyn LedgerContract> {
        Arc::new(MemoryContract {
            address: *address,
            ledger: self.clone(),
        })
    }
}

/// A handle on one contract of a [`MemoryLedger`].
#[derive(Debug, Clone)]
pub struct MemoryContract {
    address: Address,
    ledger: MemoryLedger,
}

#[async_trait]
impl LedgerContract for MemoryContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn owner(&self) -> Result<Address> {
        self.ledger.read_contract(&self.address, |c| c.owner)
    }

    async fn has_expired(&self) -> Result<bool> {
        self.ledger.read_contract(&self.address, |c| c.terminated)
    }

    async fn get_permissions(&self, requester: &Address, file: &Address) -> Result<Permissions> {
        self.ledger.read_contract(&self.address, |c| {
            c.permissions
                .get(&(*requester, *file))
                .copied()
                .unwrap_or(Permissions::NONE)
        })
    }

    async fn bytecode(&self) -> Result<String> {
        self.ledger.read_contract(&self.address, |c| c.bytecode.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerContractExt;
    use ledgervault_core::{Classified, ErrorKind};

    fn owner() -> Address {
        "0xc16a409a39EDe3F38E212900f8d3afe6aa6A8929".parse().unwrap()
    }

    fn requester() -> Address {
        "0x41A60F71063CD7c9e5247d3E7d551f91f94b5C3b".parse().unwrap()
    }

    #[tokio::test]
    async fn test_deploy_uses_chain_addresses() {
        let ledger = MemoryLedger::new();
        let first = ledger.deploy(&owner(), "0x6080").await.unwrap();
        assert_eq!(
            first,
            "0xee3782320af2eb54b4b0d6f2b45b8a0326e2e409".parse().unwrap()
        );
        let second = ledger.deploy(&owner(), "6080").await.unwrap();
        assert_eq!(second, calculate_contract_address(&owner(), 1));
    }

    #[tokio::test]
    async fn test_contract_queries() {
        let ledger = MemoryLedger::new();
        let address = ledger.deploy(&owner(), "0x6080").await.unwrap();
        let contract = ledger.contract(&address);

        assert_eq!(contract.address(), address);
        assert_eq!(contract.owner().await.unwrap(), owner());
        assert!(!contract.has_expired().await.unwrap());
        assert_eq!(contract.bytecode().await.unwrap(), "6080");
        assert_eq!(
            contract.get_permissions(&requester(), &Address::ZERO).await.unwrap(),
            Permissions::NONE
        );
    }

    #[tokio::test]
    async fn test_set_permissions_requires_owner() {
        let ledger = MemoryLedger::new();
        let address = ledger.deploy(&owner(), "6080").await.unwrap();

        ledger
            .set_permissions(&owner(), &address, &requester(), &Address::ZERO, Permissions::READ)
            .unwrap();
        let contract = ledger.contract(&address);
        assert!(contract.can_read(&requester(), &Address::ZERO).await.unwrap());

        let err = ledger
            .set_permissions(&requester(), &address, &requester(), &Address::ZERO, Permissions::ALL)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContractOwner);
    }

    #[tokio::test]
    async fn test_terminate_expires_and_revokes() {
        let ledger = MemoryLedger::new();
        let address = ledger.deploy(&owner(), "6080").await.unwrap();
        ledger
            .set_permissions(&owner(), &address, &owner(), &Address::ZERO, Permissions::ALL)
            .unwrap();

        assert!(ledger.terminate(&requester(), &address).is_err());
        ledger.terminate(&owner(), &address).unwrap();

        let contract = ledger.contract(&address);
        assert!(contract.assert_has_expired().await.is_ok());
        assert!(contract.assert_can_read(&owner(), &Address::ZERO).await.is_err());
    }

    #[tokio::test]
    async fn test_subscribers_see_constructor_grants() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let ledger = MemoryLedger::new().with_registry(Arc::clone(&registry));
        let hash = bytecode_hash("6080");
        let stranger = Address::from_bytes([9; 20]);

        let informed = Arc::new(std::sync::Mutex::new(Vec::new()));
        for (name, address) in [("requester", requester()), ("stranger", stranger)] {
            let informed = Arc::clone(&informed);
            registry.subscribe(
                crate::subscription::SubscriptionFilter::new(hash).permitted(address),
                move |_, _| informed.lock().unwrap().push(name),
            );
        }

        let grants = [(requester(), Address::ZERO, Permissions::READ)];
        ledger.deploy_with_permissions(&owner(), "0x6080", &grants).await.unwrap();
        assert_eq!(*informed.lock().unwrap(), vec!["requester"]);
    }

    #[tokio::test]
    async fn test_unknown_contract() {
        let ledger = MemoryLedger::new();
        let contract = ledger.contract(&Address::from_bytes([7; 20]));
        let err = contract.owner().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Blockchain);
    }
}
