//! Deployment subscriptions.
//!
//! A vault server registers interest in a contract type (identified by its
//! bytecode hash) and is told when a matching contract is deployed. A
//! subscription may be narrowed to deployments that grant a given address
//! read access on a given object.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use ledgervault_core::{Address, Keccak256Hash};

use crate::ledger::{Ledger, LedgerContractExt};

/// Called with `(contract_address, bytecode_hash)`.
pub type DeploymentCallback = Arc<dyn Fn(Address, Keccak256Hash) + Send + Sync>;

/// Opaque handle returned by [`SubscriptionRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Which deployments a subscriber wants to hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub bytecode_hash: Keccak256Hash,
    /// Only report contracts this address can read.
    pub permitted_address: Option<Address>,
    /// The object checked for `permitted_address`. Defaults to the root.
    pub file: Option<Address>,
}

impl SubscriptionFilter {
    pub fn new(bytecode_hash: Keccak256Hash) -> Self {
        Self {
            bytecode_hash,
            permitted_address: None,
            file: None,
        }
    }

    pub fn permitted(mut self, address: Address) -> Self {
        self.permitted_address = Some(address);
        self
    }

    pub fn file(mut self, file: Address) -> Self {
        self.file = Some(file);
        self
    }
}

struct Subscription {
    id: SubscriptionId,
    filter: SubscriptionFilter,
    callback: DeploymentCallback,
}

/// Registry of deployment subscribers.
#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: AtomicU64,
    subscriptions: RwLock<Vec<Subscription>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, filter: SubscriptionFilter, callback: F) -> SubscriptionId
    where
        F: Fn(Address, Keccak256Hash) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                filter,
                callback: Arc::new(callback),
            });
        tracing::debug!(subscription = id.0, "deployment subscription added");
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inform every matching subscriber of a new deployment.
    ///
    /// Returns the number of callbacks invoked. A subscriber whose access
    /// check fails on the ledger is skipped.
    pub async fn notify_deployment<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        contract_address: &Address,
        bytecode_hash: &Keccak256Hash,
    ) -> usize {
        let matching: Vec<(SubscriptionFilter, DeploymentCallback)> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.filter.bytecode_hash == *bytecode_hash)
            .map(|s| (s.filter.clone(), Arc::clone(&s.callback)))
            .collect();

        let mut informed = 0;
        for (filter, callback) in matching {
            if let Some(permitted) = filter.permitted_address {
                let file = filter.file.unwrap_or(Address::ZERO);
                let contract = ledger.contract(contract_address);
                match contract.can_read(&permitted, &file).await {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        tracing::warn!(
                            contract = %contract_address,
                            error = %e,
                            "permission check failed for deployment subscriber"
                        );
                        continue;
                    }
                }
            }
            callback(*contract_address, *bytecode_hash);
            informed += 1;
        }
        informed
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscriptions", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::bytecode_hash;
    use crate::memory::MemoryLedger;
    use crate::permissions::Permissions;
    use std::sync::Mutex;

    const BYTECODE: &str = "608060405234801561001057600080fd5b50";

    fn owner() -> Address {
        Address::from_bytes([1; 20])
    }

    fn recorder() -> (Arc<Mutex<Vec<Address>>>, impl Fn(Address, Keccak256Hash) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |address, _| sink.lock().unwrap().push(address))
    }

    #[tokio::test]
    async fn test_matching_hash_is_informed() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let ledger = MemoryLedger::new().with_registry(Arc::clone(&registry));

        let (seen, callback) = recorder();
        registry.subscribe(SubscriptionFilter::new(bytecode_hash(BYTECODE)), callback);
        let (other, other_callback) = recorder();
        registry.subscribe(SubscriptionFilter::new(bytecode_hash("00")), other_callback);

        let address = ledger.deploy(&owner(), BYTECODE).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![address]);
        assert!(other.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permitted_address_needs_read_access() {
        let registry = SubscriptionRegistry::new();
        let ledger = MemoryLedger::new();
        let address = ledger.deploy(&owner(), BYTECODE).await.unwrap();
        let reader = Address::from_bytes([2; 20]);

        let (seen, callback) = recorder();
        let filter = SubscriptionFilter::new(bytecode_hash(BYTECODE)).permitted(reader);
        registry.subscribe(filter, callback);

        let hash = bytecode_hash(BYTECODE);
        assert_eq!(registry.notify_deployment(&ledger, &address, &hash).await, 0);

        ledger
            .set_permissions(&owner(), &address, &reader, &Address::ZERO, Permissions::READ)
            .unwrap();
        assert_eq!(registry.notify_deployment(&ledger, &address, &hash).await, 1);
        assert_eq!(*seen.lock().unwrap(), vec![address]);
    }

    #[tokio::test]
    async fn test_ledger_failure_skips_subscriber() {
        let registry = SubscriptionRegistry::new();
        let ledger = MemoryLedger::new();
        let hash = bytecode_hash(BYTECODE);
        let filter = SubscriptionFilter::new(hash).permitted(Address::from_bytes([2; 20]));
        let (seen, callback) = recorder();
        registry.subscribe(filter, callback);

        let missing = Address::from_bytes([3; 20]);
        assert_eq!(registry.notify_deployment(&ledger, &missing, &hash).await, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriptionRegistry::new();
        let a = registry.subscribe(SubscriptionFilter::new(bytecode_hash("00")), |_, _| {});
        let b = registry.subscribe(SubscriptionFilter::new(bytecode_hash("00")), |_, _| {});
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.unsubscribe(a));
        assert!(!registry.unsubscribe(a));
        assert_eq!(registry.len(), 1);
    }
}
