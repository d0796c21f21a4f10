//! Optional payload confidentiality between two identities.
//!
//! secp256k1 ECDH between the sender's private key and the recipient's public
//! key, a blake3 key derivation with domain separation, then
//! ChaCha20-Poly1305 with a random nonce. Vault contents are never encrypted
//! by the protocol itself; applications use this to seal `data` fields.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use k256::ecdsa::VerifyingKey;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::Key;
use crate::error::{CoreError, Result};
use crate::types::PublicKey;

const KDF_CONTEXT: &str = "ledgervault-v0-payload-encryption";
const NONCE_LEN: usize = 12;

/// A 256-bit symmetric key shared by two identities.
#[derive(Clone)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SealedPayload> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Encryption(e.to_string()))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CoreError::Encryption(e.to_string()))?;
        Ok(SealedPayload { nonce, ciphertext })
    }

    pub fn decrypt(&self, sealed: &SealedPayload) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Decryption(e.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|e| CoreError::Decryption(e.to_string()))
    }
}

/// Nonce and ciphertext (with tag). Textual form is `hex(nonce ‖ ciphertext)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl SealedPayload {
    pub fn to_hex(&self) -> String {
        let mut buf = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(&self.ciphertext);
        hex::encode(buf)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::Decryption(e.to_string()))?;
        if bytes.len() < NONCE_LEN {
            return Err(CoreError::Decryption("sealed payload is too short".into()));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        Ok(Self {
            nonce,
            ciphertext: bytes[NONCE_LEN..].to_vec(),
        })
    }
}

impl Serialize for SealedPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SealedPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Key {
    /// Derive the key shared with `peer`. Symmetric: both sides derive the same key.
    pub fn shared_key(&self, peer: &PublicKey) -> Result<SharedKey> {
        let peer_key = VerifyingKey::from_sec1_bytes(&peer.to_sec1())
            .map_err(|_| CoreError::Cryptographic("public key is not on the curve".into()))?;
        let shared = k256::ecdh::diffie_hellman(
            self.signing_key().as_nonzero_scalar(),
            peer_key.as_affine(),
        );

        let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
        hasher.update(shared.raw_secret_bytes().as_slice());
        Ok(SharedKey(*hasher.finalize().as_bytes()))
    }

    /// Seal `plaintext` so only the holder of `recipient`'s private key can open it.
    pub fn encrypt(&self, recipient: &PublicKey, plaintext: &[u8]) -> Result<SealedPayload> {
        self.shared_key(recipient)?.encrypt(plaintext)
    }

    /// Open a payload sealed for us by `sender`.
    pub fn decrypt(&self, sender: &PublicKey, sealed: &SealedPayload) -> Result<Vec<u8>> {
        self.shared_key(sender)?.decrypt(sealed)
    }
}
