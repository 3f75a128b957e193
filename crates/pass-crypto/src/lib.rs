//! # pass-crypto — Cryptographic Primitives
//!
//! Provides the hashing and commitment building blocks for allowlist
//! issuance:
//!
//! - **Keccak-256** leaf and pair hashing, byte-compatible with the
//!   tooling operators already use to publish allowlist roots.
//! - **Sorted-pair Merkle trees**: construction from a list of addresses,
//!   root computation, and per-member proof generation.
//! - **Membership verification**: the pure `verify(leaf, proof, root)`
//!   check the issuance engine runs in Restricted mode.
//!
//! ## Crate Policy
//!
//! - Depends only on `pass-core` internally.
//! - Verification never errors. Malformed or foreign proofs yield `false`.
//! - No `unsafe` code.

pub mod error;
pub mod keccak;
pub mod merkle;

pub use error::CryptoError;
pub use keccak::{keccak256, leaf_hash};
pub use merkle::{verify, verify_member, MerkleProof, MerkleTree};
