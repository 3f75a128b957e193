//! # Key Layout
//!
//! All activity state shares one keyspace. Singletons use a bare tag;
//! collections use `tag:` followed by a fixed-width binary suffix so that
//! byte order equals logical order (token ids and sequence numbers are
//! big-endian).
//!
//! | Key | Value |
//! |---|---|
//! | `activity` | activity configuration, JSON |
//! | `admin` | 20-byte admin address |
//! | `next_id` | u64 BE, next unit id |
//! | `event_seq` | u64 BE, next event sequence number |
//! | `minted:<addr>` | `[1]` once the address has issued |
//! | `owner:<id>` | 20-byte owner of the run of ids starting at `id` |
//! | `holdings:<addr>` | u64 BE, units held |
//! | `funds:<currency>` | u128 BE, collected balance |
//! | `event:<seq>` | event log record, JSON |
//! | `transition:<seq>` | activity change record, JSON, keyed by its event seq |
//! | `token:<token>` | `[1]` once the local book knows the token |
//! | `token_balance:<token><owner>` | u128 BE |
//! | `token_allowance:<token><owner><spender>` | u128 BE |

use pass_core::{Address, Amount, Currency, TokenId};

use crate::error::StoreError;

pub const ACTIVITY: &[u8] = b"activity";
pub const ADMIN: &[u8] = b"admin";
pub const NEXT_ID: &[u8] = b"next_id";
pub const EVENT_SEQ: &[u8] = b"event_seq";

pub const MINTED_PREFIX: &[u8] = b"minted:";
pub const OWNER_PREFIX: &[u8] = b"owner:";
pub const HOLDINGS_PREFIX: &[u8] = b"holdings:";
pub const FUNDS_PREFIX: &[u8] = b"funds:";
pub const EVENT_PREFIX: &[u8] = b"event:";
pub const TRANSITION_PREFIX: &[u8] = b"transition:";
pub const TOKEN_PREFIX: &[u8] = b"token:";
pub const TOKEN_BALANCE_PREFIX: &[u8] = b"token_balance:";
pub const TOKEN_ALLOWANCE_PREFIX: &[u8] = b"token_allowance:";

fn tagged(prefix: &[u8], suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + suffix.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(suffix);
    key
}

/// Ledger entry for `address`.
pub fn minted(address: &Address) -> Vec<u8> {
    tagged(MINTED_PREFIX, address.as_bytes())
}

/// Ownership run record starting at `id`.
pub fn owner(id: TokenId) -> Vec<u8> {
    tagged(OWNER_PREFIX, &id.value().to_be_bytes())
}

/// Held-unit counter for `address`.
pub fn holdings(address: &Address) -> Vec<u8> {
    tagged(HOLDINGS_PREFIX, address.as_bytes())
}

/// Collected balance for `currency`.
pub fn funds(currency: &Currency) -> Vec<u8> {
    tagged(FUNDS_PREFIX, &currency.key_bytes())
}

/// Event log entry `seq`.
pub fn event(seq: u64) -> Vec<u8> {
    tagged(EVENT_PREFIX, &seq.to_be_bytes())
}

/// Activity change record written with event `seq`.
pub fn transition(seq: u64) -> Vec<u8> {
    tagged(TRANSITION_PREFIX, &seq.to_be_bytes())
}

/// Marker for a token contract known to the local book.
pub fn token(token: &Address) -> Vec<u8> {
    tagged(TOKEN_PREFIX, token.as_bytes())
}

pub fn token_balance(token: &Address, owner: &Address) -> Vec<u8> {
    let mut suffix = Vec::with_capacity(40);
    suffix.extend_from_slice(token.as_bytes());
    suffix.extend_from_slice(owner.as_bytes());
    tagged(TOKEN_BALANCE_PREFIX, &suffix)
}

pub fn token_allowance(token: &Address, owner: &Address, spender: &Address) -> Vec<u8> {
    let mut suffix = Vec::with_capacity(60);
    suffix.extend_from_slice(token.as_bytes());
    suffix.extend_from_slice(owner.as_bytes());
    suffix.extend_from_slice(spender.as_bytes());
    tagged(TOKEN_ALLOWANCE_PREFIX, &suffix)
}

// ---------------------------------------------------------------------------
// Value codecs
// ---------------------------------------------------------------------------

fn printable(key: &[u8]) -> String {
    StoreError::printable_key(key)
}

/// Decode a JSON value stored under `key`.
pub fn decode_json<T: serde::de::DeserializeOwned>(key: &[u8], value: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(value).map_err(|e| StoreError::Corrupt {
        key: printable(key),
        reason: e.to_string(),
    })
}

/// Encode a value as JSON for storage under `key`.
pub fn encode_json<T: serde::Serialize>(key: &[u8], value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Encode {
        key: printable(key),
        reason: e.to_string(),
    })
}

/// Decode a big-endian u64 value stored under `key`.
pub fn decode_u64(key: &[u8], value: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = value.try_into().map_err(|_| StoreError::Corrupt {
        key: printable(key),
        reason: format!("expected 8 bytes, got {}", value.len()),
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Decode a big-endian u128 amount stored under `key`.
pub fn decode_amount(key: &[u8], value: &[u8]) -> Result<Amount, StoreError> {
    let bytes: [u8; 16] = value.try_into().map_err(|_| StoreError::Corrupt {
        key: printable(key),
        reason: format!("expected 16 bytes, got {}", value.len()),
    })?;
    Ok(Amount::from_be_bytes(bytes))
}

/// Decode a 20-byte address stored under `key`.
pub fn decode_address(key: &[u8], value: &[u8]) -> Result<Address, StoreError> {
    let bytes: [u8; 20] = value.try_into().map_err(|_| StoreError::Corrupt {
        key: printable(key),
        reason: format!("expected 20 bytes, got {}", value.len()),
    })?;
    Ok(Address::from_bytes(bytes))
}
