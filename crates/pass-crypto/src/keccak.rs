//! Keccak-256 (the pre-standard SHA-3 padding used by EVM tooling).
//!
//! Allowlist leaves are `keccak256(address)` over the 20 raw address
//! bytes, not over the hex text.

use pass_core::{Address, Hash32};
use sha3::{Digest, Keccak256};

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Hash32 {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    Hash32::from_bytes(out)
}

/// The allowlist leaf for an address.
pub fn leaf_hash(address: &Address) -> Hash32 {
    keccak256(address.as_bytes())
}
