//! # Error Types
//!
//! Errors shared by every crate in the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//! Parse errors carry the offending input so operators can see what was
//! rejected without re-running with debug logging.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer for amount: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error when parsing a domain primitive from its textual form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Hex input had the wrong number of digits for the target width.
    #[error("expected {expected} hex chars, got {actual} in {input:?}")]
    HexLength {
        /// Required number of hex digits (without `0x`).
        expected: usize,
        /// Number of hex digits found.
        actual: usize,
        /// The rejected input.
        input: String,
    },

    /// Hex input contained a non-hex character.
    #[error("invalid hex digit in {0:?}")]
    HexDigit(String),

    /// Amount was not a non-negative base-10 integer that fits in 128 bits.
    #[error("invalid amount {0:?}: expected a non-negative integer")]
    Amount(String),

    /// Token id was not a non-negative base-10 integer that fits in 64 bits.
    #[error("invalid token id {0:?}")]
    TokenId(String),

    /// Timestamp was not valid RFC 3339 or used a non-UTC offset.
    #[error("invalid timestamp {input:?}: {reason}")]
    Timestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}
