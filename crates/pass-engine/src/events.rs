//! # Event Log
//!
//! Append-only record of everything the engine commits: unit transfers
//! (including mints, from the zero address), batch mints, fee collection,
//! withdrawals, activity configuration changes, and admin handover.
//!
//! Entries are staged in the request transaction and land in the same
//! atomic batch as the state they describe, so observers never see an
//! event for a rolled-back request. Sequence numbers start at zero and
//! have no gaps. Observers poll with [`crate::IssuanceEngine::events_since`].
//!
//! Each record carries a SHA-256 digest over the canonical bytes of its
//! sequence number, timestamp, and event.

use serde::{Deserialize, Serialize};

use pass_core::{sha256_digest, Address, Amount, CanonicalBytes, ContentDigest, Currency, Timestamp, TokenId};
use pass_state::PhaseTransitionRecord;
use pass_store::{keys, KvStore, StoreError};

use crate::error::IssuanceError;
use crate::txn::Txn;

/// Something the engine did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// One unit changed hands. Mints have `from` = zero address.
    Transfer {
        from: Address,
        to: Address,
        token_id: TokenId,
    },
    /// A contiguous range of units changed hands at once.
    ConsecutiveTransfer {
        from_token_id: TokenId,
        to_token_id: TokenId,
        from: Address,
        to: Address,
    },
    /// Privileged batch issuance.
    BatchMinted {
        recipient: Address,
        start_token_id: TokenId,
        end_token_id: TokenId,
    },
    FeeCollected {
        payer: Address,
        currency: Currency,
        amount: Amount,
    },
    Withdrawn {
        currency: Currency,
        amount: Amount,
        to: Address,
    },
    ActivityChanged {
        record: PhaseTransitionRecord,
    },
    AdminTransferred {
        previous: Address,
        admin: Address,
    },
}

#[derive(Serialize)]
struct DigestInput<'a> {
    seq: u64,
    timestamp: &'a Timestamp,
    event: &'a Event,
}

/// A committed event with its position and digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub timestamp: Timestamp,
    pub event: Event,
    pub digest: ContentDigest,
}

impl EventRecord {
    fn seal(seq: u64, timestamp: Timestamp, event: Event) -> Result<Self, IssuanceError> {
        let digest = compute_digest(seq, &timestamp, &event)?;
        Ok(Self {
            seq,
            timestamp,
            event,
            digest,
        })
    }

    /// Recompute the digest and compare it with the stored one.
    pub fn verify_digest(&self) -> Result<bool, IssuanceError> {
        Ok(compute_digest(self.seq, &self.timestamp, &self.event)? == self.digest)
    }
}

fn compute_digest(
    seq: u64,
    timestamp: &Timestamp,
    event: &Event,
) -> Result<ContentDigest, IssuanceError> {
    let canonical = CanonicalBytes::new(&DigestInput {
        seq,
        timestamp,
        event,
    })?;
    Ok(sha256_digest(&canonical))
}

/// Stage `event` as the next log record.
pub(crate) fn append(txn: &mut Txn<'_>, event: Event) -> Result<u64, IssuanceError> {
    let seq = txn.get_u64(keys::EVENT_SEQ)?.unwrap_or(0);
    let next = seq
        .checked_add(1)
        .ok_or(IssuanceError::ArithmeticOverflow { what: "event sequence" })?;
    let record = EventRecord::seal(seq, Timestamp::now(), event)?;
    txn.put_json(keys::event(seq), &record)?;
    txn.put_u64(keys::EVENT_SEQ.to_vec(), next);
    Ok(seq)
}

/// Committed records with `seq >= from`, oldest first.
pub(crate) fn since(
    store: &dyn KvStore,
    from: u64,
    limit: Option<usize>,
) -> Result<Vec<EventRecord>, StoreError> {
    store
        .scan_from(keys::EVENT_PREFIX, &keys::event(from), limit)?
        .into_iter()
        .map(|(k, v)| keys::decode_json(&k, &v))
        .collect()
}
