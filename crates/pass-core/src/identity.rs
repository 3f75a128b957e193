//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers the engine deals in. You cannot pass
//! a `Hash32` where an `Address` is expected, and a `TokenId` is not a bare
//! counter.
//!
//! ## Wire Format
//!
//! `Address` and `Hash32` render as `0x`-prefixed lowercase hex and serialize
//! as that string. Parsing accepts either case and an optional prefix.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;
use crate::hex;

/// A 20-byte account address: the identity that requests issuance, holds
/// units, pays fees, or names a payment-token contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address. Used on the wire as the native-currency marker
    /// and as the `from` side of mint transfer events.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw address bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode_fixed::<20>(s).map(Self)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// A 32-byte hash: Merkle roots, proof siblings, and leaf hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32([u8; 32]);

impl Hash32 {
    /// The all-zero hash.
    pub const ZERO: Hash32 = Hash32([0u8; 32]);

    /// Wrap raw hash bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Whether every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl FromStr for Hash32 {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode_fixed::<32>(s).map(Self)
    }
}

impl std::fmt::Display for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Identifier of one issued unit. Ids are allocated contiguously from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl TokenId {
    /// Access the inner id.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl FromStr for TokenId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseError::TokenId(s.to_string()))
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

macro_rules! hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_serde!(Address);
hex_serde!(Hash32);

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn address_display_is_prefixed_lowercase() {
        let a: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        assert_eq!(a.to_string(), USER);
    }

    #[test]
    fn address_parse_without_prefix() {
        let a: Address = USER.trim_start_matches("0x").parse().unwrap();
        assert_eq!(a.to_string(), USER);
    }

    #[test]
    fn address_rejects_short_input() {
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
        let a: Address = USER.parse().unwrap();
        assert!(!a.is_zero());
    }

    #[test]
    fn address_serializes_as_string() {
        let a: Address = USER.parse().unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{USER}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn hash32_display_and_zero() {
        assert!(Hash32::ZERO.is_zero());
        assert_eq!(Hash32::ZERO.to_string().len(), 66);
        let h = Hash32::from_bytes([0xab; 32]);
        assert_eq!(h.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn hash32_rejects_bad_digit() {
        let bad = format!("0x{}", "g".repeat(64));
        assert!(bad.parse::<Hash32>().is_err());
    }

    #[test]
    fn token_id_parse_and_display() {
        let id: TokenId = "42".parse().unwrap();
        assert_eq!(id, TokenId(42));
        assert_eq!(id.to_string(), "#42");
        assert!("-1".parse::<TokenId>().is_err());
    }
}
