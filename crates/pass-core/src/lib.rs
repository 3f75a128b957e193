//! # pass-core — Foundational Types for the Pass Issuance Engine
//!
//! Every other crate in the workspace depends on `pass-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Address`, `TokenId`,
//!    `Amount`, `Hash32`. No bare byte arrays or integers crossing crate
//!    boundaries. Parsing is validated at construction.
//!
//! 2. **`Currency` is a closed enum.** A fee is either paid in native value
//!    or in a fungible token identified by its contract address. The zero
//!    address is the native marker on the wire.
//!
//! 3. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()`, so event-log digests are deterministic.
//!
//! 4. **Amounts serialize as decimal strings.** Canonical JSON never carries
//!    floats, and `u128` values do not fit JSON integers.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pass-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod hex;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use amount::{Amount, Currency};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{CanonicalizationError, ParseError};
pub use identity::{Address, Hash32, TokenId};
pub use temporal::Timestamp;
