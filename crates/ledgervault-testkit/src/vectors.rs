//! Golden test vectors.
//!
//! Hashes, key addresses and contract addresses that any implementation
//! of the protocol must reproduce bit for bit.

use ledgervault_core::{calculate_contract_address, hash, Address, Key};

/// What a vector computes.
#[derive(Debug, Clone, Copy)]
pub enum VectorKind {
    /// keccak256 of `input` as UTF-8, hex without `0x`.
    Hash,
    /// Address of the private key `input`.
    KeyAddress,
    /// Address of the contract deployed by `input` at `nonce`.
    ContractAddress { nonce: u64 },
}

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub kind: VectorKind,
    pub input: &'static str,
    /// Expected output, lowercase hex.
    pub expected: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "hash of Hello World!",
            kind: VectorKind::Hash,
            input: "Hello World!",
            expected: "3ea2f1d0abf3fc66cf29eebb70cbd4e7fe762ef8a09bcc06c8edf641230afec0",
        },
        GoldenVector {
            name: "hash of empty string",
            kind: VectorKind::Hash,
            input: "",
            expected: "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
        },
        GoldenVector {
            name: "address of signing key",
            kind: VectorKind::KeyAddress,
            input: "b94452c533536500e30f2253c96d123133ca1cbdb987556c2dc229573a2cd53c",
            expected: "0xfb3e6dd29d01c1b5b99e46db3fe26df1138b73d1",
        },
        GoldenVector {
            name: "address of owner key",
            kind: VectorKind::KeyAddress,
            input: "24802edc1eba0f578dcffd6ada3c5b954a8e76e55ba830cf19a3083d489a6063",
            expected: "0xc16a409a39ede3f38e212900f8d3afe6aa6a8929",
        },
        GoldenVector {
            name: "first contract of owner",
            kind: VectorKind::ContractAddress { nonce: 0 },
            input: "0xc16a409a39EDe3F38E212900f8d3afe6aa6A8929",
            expected: "0xee3782320af2eb54b4b0d6f2b45b8a0326e2e409",
        },
        GoldenVector {
            name: "fourth contract of owner",
            kind: VectorKind::ContractAddress { nonce: 3 },
            input: "0xc16a409a39EDe3F38E212900f8d3afe6aa6A8929",
            expected: "0x9b0e06b0ceb584c1f5b46b18d6edec09d5bc073e",
        },
    ]
}

/// Compute a vector's output, or `None` if its input is unusable.
pub fn compute(vector: &GoldenVector) -> Option<String> {
    match vector.kind {
        VectorKind::Hash => Some(hash(vector.input).to_hex()),
        VectorKind::KeyAddress => Key::from_hex(vector.input).ok().map(|k| k.address().to_hex()),
        VectorKind::ContractAddress { nonce } => Address::parse(vector.input)
            .map(|owner| calculate_contract_address(&owner, nonce).to_hex()),
    }
}

/// Check every vector. Returns `(name, matches, actual)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let actual = compute(v).unwrap_or_default();
            (v.name.to_string(), actual == v.expected, actual)
        })
        .collect()
}
