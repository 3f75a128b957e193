//! # Amounts and Fee Currencies
//!
//! `Amount` is an unsigned 128-bit quantity in the smallest unit of its
//! currency (wei for native value, base units for a token). It serializes
//! as a decimal string so canonical JSON never carries a float and values
//! above `u64::MAX` survive the trip.
//!
//! `Currency` names what a fee is paid in. On the wire the zero address is
//! the native marker, matching how the activity is configured by operators.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;
use crate::identity::Address;

/// A non-negative quantity in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(u128);

impl Amount {
    /// Zero.
    pub const ZERO: Amount = Amount(0);

    /// Wrap a raw base-unit quantity.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Access the raw base-unit quantity.
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Whether this amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction. Returns `None` if `rhs > self`.
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Big-endian bytes, used for storage encoding.
    pub fn to_be_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Decode from big-endian bytes.
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl FromStr for Amount {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::Amount(s.to_string()));
        }
        t.parse::<u128>()
            .map(Self)
            .map_err(|_| ParseError::Amount(s.to_string()))
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What an issuance fee is paid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Currency {
    /// Value attached to the request itself.
    Native,
    /// A fungible token pulled from the payer by transfer-from.
    Token(Address),
}

impl Currency {
    /// Interpret a wire address: zero is the native marker.
    pub fn from_address(address: Address) -> Self {
        if address.is_zero() {
            Self::Native
        } else {
            Self::Token(address)
        }
    }

    /// The wire address for this currency.
    pub fn address(&self) -> Address {
        match self {
            Self::Native => Address::ZERO,
            Self::Token(a) => *a,
        }
    }

    /// Whether this is the native currency.
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    /// Stable storage key suffix: `0x00` for native, `0x01 || address` for tokens.
    pub fn key_bytes(&self) -> Vec<u8> {
        match self {
            Self::Native => vec![0x00],
            Self::Token(a) => {
                let mut out = Vec::with_capacity(21);
                out.push(0x01);
                out.extend_from_slice(a.as_bytes());
                out
            }
        }
    }
}

impl FromStr for Currency {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("native") {
            return Ok(Self::Native);
        }
        s.parse::<Address>().map(Self::from_address)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::Token(a) => write!(f, "{a}"),
        }
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
