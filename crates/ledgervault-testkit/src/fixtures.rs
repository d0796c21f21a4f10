//! Well-known identities and the standard test contract.

use ledgervault_core::{Address, Key};
use ledgervault_perms::{MemoryLedger, Permissions, Result};

pub const OWNER_PRIVATE_KEY: &str =
    "24802edc1eba0f578dcffd6ada3c5b954a8e76e55ba830cf19a3083d489a6063";
pub const OWNER_ADDRESS: &str = "0xc16a409a39EDe3F38E212900f8d3afe6aa6A8929";

pub const REQUESTER_PRIVATE_KEY: &str =
    "e68e40257cfee330038c49637fcffff82fae04b9c563f4ea071c20f2eb55063c";
pub const REQUESTER_ADDRESS: &str = "0x41A60F71063CD7c9e5247d3E7d551f91f94b5C3b";

pub const VAULT_PRIVATE_KEY: &str =
    "ae139af24306ecac804cfe974398d6d76361287d7b96d9e165d9bcb99a64b6ce";
pub const VAULT_ADDRESS: &str = "0x288b32F2653C1d72043d240A7F938a114Ab69584";

/// Runtime bytecode the test contract is deployed with.
pub const TEST_CONTRACT_BYTECODE: &str = "0x608060405234801561001057600080fd5b50";

pub const ROOT: &str = "0x0000000000000000000000000000000000000000";
pub const FILE_1: &str = "0x0000000000000000000000000000000000000001";
pub const FILE_2: &str = "0x0000000000000000000000000000000000000002";
pub const FILE_3: &str = "0x0000000000000000000000000000000000000003";
pub const FILE_4: &str = "0x0000000000000000000000000000000000000004";
pub const FILE_5: &str = "0x0000000000000000000000000000000000000005";
pub const FILE_6: &str = "0x0000000000000000000000000000000000000006";

/// Permission layout of the test contract: `(file, owner, requester)`.
pub const TEST_CONTRACT_PERMISSIONS: [(&str, &str, &str); 7] = [
    (ROOT, "rwa", "r"),
    (FILE_1, "wa", "r"),
    (FILE_2, "r", "w"),
    (FILE_3, "r", "a"),
    (FILE_4, "da", "dr"),
    (FILE_5, "dr", "dwa"),
    (FILE_6, "rwa", "-"),
];

/// The owner, requester and vault server identities.
#[derive(Clone)]
pub struct TestKeys {
    pub owner: Key,
    pub requester: Key,
    pub vault: Key,
}

impl TestKeys {
    pub fn new() -> Self {
        Self {
            owner: well_known(OWNER_PRIVATE_KEY),
            requester: well_known(REQUESTER_PRIVATE_KEY),
            vault: well_known(VAULT_PRIVATE_KEY),
        }
    }
}

impl Default for TestKeys {
    fn default() -> Self {
        Self::new()
    }
}

fn well_known(private_key: &str) -> Key {
    Key::from_hex(private_key).expect("well-known key is valid")
}

/// Parse `"rwa"`-style permissions. `d` marks a directory, `-` grants nothing.
pub fn symbolic_permissions(symbols: &str) -> Option<Permissions> {
    symbols.chars().try_fold(Permissions::NONE, |acc, c| {
        let bit = match c {
            'd' => Permissions::DIRECTORY,
            'r' => Permissions::READ,
            'w' => Permissions::WRITE,
            'a' => Permissions::APPEND,
            '-' => Permissions::NONE,
            _ => return None,
        };
        Some(acc.with(bit))
    })
}

/// A contract deployed by the well-known owner with
/// [`TEST_CONTRACT_PERMISSIONS`] applied.
pub struct TestContract {
    pub address: Address,
    pub keys: TestKeys,
}

impl TestContract {
    pub async fn deploy(ledger: &MemoryLedger) -> Result<Self> {
        let keys = TestKeys::new();
        let owner = keys.owner.address();
        let requester = keys.requester.address();
        let mut grants = Vec::with_capacity(TEST_CONTRACT_PERMISSIONS.len() * 2);
        for (file, owner_perms, requester_perms) in TEST_CONTRACT_PERMISSIONS {
            let file = Address::parse_named(file, "file")?;
            for (grantee, symbols) in [(owner, owner_perms), (requester, requester_perms)] {
                let permissions = symbolic_permissions(symbols).unwrap_or(Permissions::NONE);
                grants.push((grantee, file, permissions));
            }
        }
        let address = ledger
            .deploy_with_permissions(&owner, TEST_CONTRACT_BYTECODE, &grants)
            .await?;
        Ok(Self { address, keys })
    }

    pub fn owner(&self) -> &Key {
        &self.keys.owner
    }

    pub fn requester(&self) -> &Key {
        &self.keys.requester
    }

    /// The vault server's key.
    pub fn vault(&self) -> &Key {
        &self.keys.vault
    }
}
