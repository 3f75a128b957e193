//! Errors raised while building allowlist commitments.
//!
//! Verification itself is infallible; only tree construction and proof
//! lookup can fail.

use pass_core::Address;
use thiserror::Error;

/// Failure building a Merkle tree or extracting a proof from it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A tree needs at least one leaf to have a root.
    #[error("cannot build a Merkle tree with no leaves")]
    EmptyTree,

    /// Proof requested for a leaf index past the end of the tree.
    #[error("leaf index {index} out of range for tree of {len} leaves")]
    LeafIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of leaves in the tree.
        len: usize,
    },

    /// Proof requested for an address that is not an allowlist member.
    #[error("address {0} is not a member of this allowlist")]
    NotAMember(Address),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = CryptoError::LeafIndexOutOfRange { index: 7, len: 3 };
        assert_eq!(err.to_string(), "leaf index 7 out of range for tree of 3 leaves");
        let err = CryptoError::NotAMember(Address::ZERO);
        assert!(err.to_string().contains("0x0000000000000000000000000000000000000000"));
    }
}
