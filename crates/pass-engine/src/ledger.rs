//! Issuance ledger: identity -> has issued.
//!
//! Entries go from absent to present exactly once and are never removed.
//! The engine checks and marks under its request guard, inside the same
//! transaction that mints, so the check and the mark commit together.

use pass_core::Address;
use pass_store::keys;

use crate::error::IssuanceError;
use crate::txn::Txn;

const ISSUED: u8 = 1;

pub(crate) fn has_issued(txn: &Txn<'_>, identity: &Address) -> Result<bool, IssuanceError> {
    Ok(txn.get(&keys::minted(identity))?.is_some())
}

/// Record `identity` as issued. Fails if it already is.
pub(crate) fn mark_issued(txn: &mut Txn<'_>, identity: &Address) -> Result<(), IssuanceError> {
    if has_issued(txn, identity)? {
        return Err(IssuanceError::AlreadyIssued {
            identity: *identity,
        });
    }
    txn.put(keys::minted(identity), vec![ISSUED]);
    Ok(())
}
