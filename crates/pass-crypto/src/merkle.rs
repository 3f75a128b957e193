//! # Sorted-Pair Merkle Trees
//!
//! Allowlist commitments are binary Merkle trees over
//! `keccak256(address)` leaves. Each parent is
//! `keccak256(min(left, right) || max(left, right))`, so a proof is just
//! the list of sibling hashes from leaf to root with no left/right flags.
//!
//! ## Construction
//!
//! Leaves are taken in the order given (no sorting, no deduplication).
//! When a level has an odd number of nodes the last one is promoted to the
//! next level unchanged rather than paired with itself. A single-leaf tree
//! has that leaf as its root and an empty proof.
//!
//! ## Verification
//!
//! `verify` folds the proof into the leaf and compares the result with the
//! root. It never errors: a malformed, truncated, or foreign proof simply
//! yields `false`. An empty proof verifies only when the leaf equals the
//! root.

use serde::{Deserialize, Serialize};

use pass_core::{Address, Hash32};

use crate::error::CryptoError;
use crate::keccak::{keccak256, leaf_hash};

// ---------------------------------------------------------------------------
// Pair hashing
// ---------------------------------------------------------------------------

/// Commutative parent hash: `keccak256(min || max)`.
pub fn hash_pair(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_bytes());
    buf[32..].copy_from_slice(hi.as_bytes());
    keccak256(&buf)
}

// ---------------------------------------------------------------------------
// Proofs
// ---------------------------------------------------------------------------

/// Ordered sibling hashes from a leaf up to the root.
///
/// Serializes as a JSON array of `0x`-prefixed hex strings, the form
/// operators hand to holders alongside the published root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof(Vec<Hash32>);

impl MerkleProof {
    /// Wrap a sibling list.
    pub fn new(siblings: Vec<Hash32>) -> Self {
        Self(siblings)
    }

    /// The empty proof.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Sibling hashes, leaf side first.
    pub fn siblings(&self) -> &[Hash32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Hash32>> for MerkleProof {
    fn from(siblings: Vec<Hash32>) -> Self {
        Self(siblings)
    }
}

/// Whether `proof` links `leaf` to `root`.
pub fn verify(leaf: &Hash32, proof: &MerkleProof, root: &Hash32) -> bool {
    let computed = proof
        .siblings()
        .iter()
        .fold(*leaf, |acc, sibling| hash_pair(&acc, sibling));
    computed == *root
}

/// Whether `proof` shows `address` is in the allowlist committed to by `root`.
pub fn verify_member(address: &Address, proof: &MerkleProof, root: &Hash32) -> bool {
    verify(&leaf_hash(address), proof, root)
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A fully materialized Merkle tree. `layers[0]` holds the leaves and the
/// last layer holds exactly one node, the root.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    layers: Vec<Vec<Hash32>>,
}

impl MerkleTree {
    /// Build from pre-hashed leaves.
    pub fn from_leaves(leaves: Vec<Hash32>) -> Result<Self, CryptoError> {
        if leaves.is_empty() {
            return Err(CryptoError::EmptyTree);
        }
        let mut layers = vec![leaves];
        while let Some(level) = layers.last() {
            if level.len() == 1 {
                break;
            }
            let next: Vec<Hash32> = level
                .chunks(2)
                .map(|pair| match pair {
                    [l, r] => hash_pair(l, r),
                    // Odd node out: promoted as-is.
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }
        Ok(Self { layers })
    }

    /// Build from allowlist addresses, hashing each with `leaf_hash`.
    pub fn from_addresses(addresses: &[Address]) -> Result<Self, CryptoError> {
        Self::from_leaves(addresses.iter().map(leaf_hash).collect())
    }

    /// The root commitment.
    pub fn root(&self) -> Hash32 {
        self.layers
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Hash32::ZERO)
    }

    /// Leaves in insertion order.
    pub fn leaves(&self) -> &[Hash32] {
        &self.layers[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Tree height (number of hashing levels above the leaves).
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Result<MerkleProof, CryptoError> {
        let len = self.leaf_count();
        if index >= len {
            return Err(CryptoError::LeafIndexOutOfRange { index, len });
        }
        let mut siblings = Vec::with_capacity(self.depth());
        let mut idx = index;
        for level in &self.layers[..self.layers.len() - 1] {
            let pair = idx ^ 1;
            if let Some(sibling) = level.get(pair) {
                siblings.push(*sibling);
            }
            idx /= 2;
        }
        Ok(MerkleProof(siblings))
    }

    /// Proof for the first occurrence of `address` among the leaves.
    pub fn proof_for(&self, address: &Address) -> Result<MerkleProof, CryptoError> {
        let leaf = leaf_hash(address);
        let index = self
            .leaves()
            .iter()
            .position(|l| *l == leaf)
            .ok_or(CryptoError::NotAMember(*address))?;
        self.proof(index)
    }
}
