//! Signer primitives and the [`Key`] identity.
//!
//! secp256k1 ECDSA with public-key recovery over keccak256 digests. An
//! identity's address is the last 20 bytes of `keccak256(x ‖ y)` of its
//! uncompressed public key.

use std::fmt;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use crate::error::{CoreError, Result};
use crate::types::{Address, Keccak256Hash, PublicKey, RecoverableSignature};

/// keccak256 of the UTF-8 bytes of `data`.
pub fn hash(data: &str) -> Keccak256Hash {
    hash_bytes(data.as_bytes())
}

/// keccak256 of raw bytes.
pub fn hash_bytes(data: &[u8]) -> Keccak256Hash {
    Keccak256Hash(alloy_primitives::keccak256(data).0)
}

/// A private key together with its derived public key and address.
///
/// Immutable once constructed.
#[derive(Clone)]
pub struct Key {
    signing_key: SigningKey,
    public_key: PublicKey,
    address: Address,
}

impl Key {
    /// Construct from a 64-char hex private key.
    pub fn from_hex(private_key: &str) -> Result<Self> {
        if private_key.len() != 64 || !private_key.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidPrivateKey("privateKey".into()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(private_key, &mut bytes)
            .map_err(|_| CoreError::InvalidPrivateKey("privateKey".into()))?;
        Self::from_bytes(&bytes)
    }

    /// Construct from 32 raw bytes. Zero and out-of-range scalars are rejected.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CoreError::InvalidPrivateKey("privateKey".into()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = public_key_of(signing_key.verifying_key());
        let address = address_of(&public_key);
        Self {
            signing_key,
            public_key,
            address,
        }
    }

    /// The `0x`-prefixed address of this identity.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a keccak256 digest.
    pub fn sign(&self, hash: &Keccak256Hash) -> Result<RecoverableSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| CoreError::Cryptographic(format!("signing failed: {}", e)))?;
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(&signature.to_bytes());
        out[64] = recovery_id.to_byte();
        Ok(RecoverableSignature(out))
    }

    /// Sign a hash given as 64 hex chars, returning the 130-char signature.
    pub fn sign_hex(&self, hash: &str) -> Result<String> {
        let hash = Keccak256Hash::from_hex(hash)?;
        Ok(self.sign(&hash)?.to_hex())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key").field("address", &self.address).finish_non_exhaustive()
    }
}

/// Generate a new random [`Key`].
pub fn generate_key() -> Key {
    Key::generate()
}

/// Sign a hex hash with a hex private key.
pub fn sign(hash: &str, private_key: &str) -> Result<String> {
    let hash = Keccak256Hash::from_hex(hash)?;
    let key = Key::from_hex(private_key)?;
    Ok(key.sign(&hash)?.to_hex())
}

/// Recover the signatory address from a digest and recoverable signature.
///
/// Recovery ids 0/1 and the legacy 27/28 are accepted.
pub fn recover(hash: &Keccak256Hash, signature: &RecoverableSignature) -> Result<Address> {
    let bytes = signature.as_bytes();
    let sig = Signature::from_slice(&bytes[..64])
        .map_err(|e| CoreError::InvalidSignature(format!("signature is invalid: {}", e)))?;
    let recovery_byte = match signature.recovery_byte() {
        b @ 27..=28 => b - 27,
        b => b,
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or_else(|| {
        CoreError::InvalidSignature(format!("invalid recovery id {}", signature.recovery_byte()))
    })?;
    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recovery_id)
        .map_err(|e| CoreError::InvalidSignature(format!("signature recovery failed: {}", e)))?;
    Ok(address_of(&public_key_of(&verifying_key)))
}

/// Hex-level [`recover`]. A malformed hash is an `InvalidHashError`; anything
/// wrong with the signature is an `InvalidSignatureError`.
pub fn recover_hex(hash: &str, signature: &str) -> Result<Address> {
    let hash = Keccak256Hash::from_hex(hash)
        .map_err(|_| CoreError::InvalidHash("hash is missing or invalid".into()))?;
    let signature = RecoverableSignature::from_hex(signature)?;
    recover(&hash, &signature)
}

/// True if `signature` over `hash` was produced by `address`.
pub fn verify(
    hash: &Keccak256Hash,
    signature: &RecoverableSignature,
    address: &Address,
) -> Result<bool> {
    Ok(recover(hash, signature)? == *address)
}

/// The address of a contract deployed by `owner` with the given account nonce:
/// the last 20 bytes of `keccak256(rlp([owner, nonce]))`.
pub fn calculate_contract_address(owner: &Address, nonce: u64) -> Address {
    let created = alloy_primitives::Address::from(owner.0).create(nonce);
    Address(created.0 .0)
}

/// Derive the ledger address of a public key.
pub fn address_of(public_key: &PublicKey) -> Address {
    let digest = hash_bytes(public_key.as_bytes());
    let mut arr = [0u8; 20];
    arr.copy_from_slice(&digest.as_bytes()[12..]);
    Address(arr)
}

fn public_key_of(verifying_key: &VerifyingKey) -> PublicKey {
    let point = verifying_key.to_encoded_point(false);
    let mut arr = [0u8; 64];
    arr.copy_from_slice(&point.as_bytes()[1..]);
    PublicKey(arr)
}
