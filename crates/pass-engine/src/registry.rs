//! # Unit Registry
//!
//! Ownership of issued units and the next-id counter.
//!
//! Ids are allocated contiguously from zero and never reused, so the total
//! supply is the next id. Ownership is stored as runs: minting `count`
//! units writes one `owner:<start>` record, and the owner of any id is the
//! record with the greatest start `<= id`. A batch of any size therefore
//! costs the same number of writes as a single mint.
//!
//! Transferring an id inside a run splits it: the id gets its own record,
//! and if the following id was covered by the same run it gets a record
//! naming the previous owner.

use pass_core::{Address, TokenId};
use pass_store::keys;

use crate::error::IssuanceError;
use crate::txn::Txn;

pub(crate) fn next_id(txn: &Txn<'_>) -> Result<TokenId, IssuanceError> {
    Ok(TokenId(txn.get_u64(keys::NEXT_ID)?.unwrap_or(0)))
}

pub(crate) fn balance_of(txn: &Txn<'_>, owner: &Address) -> Result<u64, IssuanceError> {
    Ok(txn.get_u64(&keys::holdings(owner))?.unwrap_or(0))
}

pub(crate) fn owner_of(txn: &Txn<'_>, id: TokenId) -> Result<Option<Address>, IssuanceError> {
    if id >= next_id(txn)? {
        return Ok(None);
    }
    match txn.floor(keys::OWNER_PREFIX, &keys::owner(id))? {
        Some((key, value)) => Ok(Some(keys::decode_address(&key, &value)?)),
        None => Ok(None),
    }
}

/// Mint `count` contiguous ids to `to`. Returns the first and last id.
pub(crate) fn mint_run(
    txn: &mut Txn<'_>,
    to: &Address,
    count: u64,
) -> Result<(TokenId, TokenId), IssuanceError> {
    if count == 0 {
        return Err(IssuanceError::InvalidCount);
    }
    let start = next_id(txn)?;
    let end = start
        .value()
        .checked_add(count - 1)
        .ok_or(IssuanceError::ArithmeticOverflow { what: "token id" })?;
    let next = end
        .checked_add(1)
        .ok_or(IssuanceError::ArithmeticOverflow { what: "token id" })?;
    txn.put(keys::owner(start), to.as_bytes().to_vec());
    txn.put_u64(keys::NEXT_ID.to_vec(), next);
    adjust_holdings(txn, to, count, true)?;
    Ok((start, TokenId(end)))
}

/// Move `id` from `from` to `to`.
pub(crate) fn transfer(
    txn: &mut Txn<'_>,
    from: &Address,
    to: &Address,
    id: TokenId,
) -> Result<(), IssuanceError> {
    let owner = owner_of(txn, id)?.ok_or(IssuanceError::UnknownToken { token_id: id })?;
    if owner != *from {
        return Err(IssuanceError::NotOwner {
            caller: *from,
            token_id: id,
        });
    }
    let following = TokenId(id.value().saturating_add(1));
    if following < next_id(txn)? && txn.get(&keys::owner(following))?.is_none() {
        txn.put(keys::owner(following), owner.as_bytes().to_vec());
    }
    txn.put(keys::owner(id), to.as_bytes().to_vec());
    adjust_holdings(txn, from, 1, false)?;
    adjust_holdings(txn, to, 1, true)?;
    Ok(())
}

fn adjust_holdings(
    txn: &mut Txn<'_>,
    who: &Address,
    by: u64,
    increase: bool,
) -> Result<(), IssuanceError> {
    let current = balance_of(txn, who)?;
    let next = if increase {
        current.checked_add(by)
    } else {
        current.checked_sub(by)
    }
    .ok_or(IssuanceError::ArithmeticOverflow { what: "holdings" })?;
    txn.put_u64(keys::holdings(who), next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pass_store::{KvStore, MemoryStore};

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn empty_registry() {
        let store = MemoryStore::new();
        let txn = Txn::new(&store);
        assert_eq!(next_id(&txn).unwrap(), TokenId(0));
        assert_eq!(owner_of(&txn, TokenId(0)).unwrap(), None);
        assert_eq!(balance_of(&txn, &addr(1)).unwrap(), 0);
    }

    #[test]
    fn runs_resolve_every_id() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        assert_eq!(mint_run(&mut txn, &addr(1), 1).unwrap(), (TokenId(0), TokenId(0)));
        assert_eq!(mint_run(&mut txn, &addr(2), 100).unwrap(), (TokenId(1), TokenId(100)));
        assert_eq!(mint_run(&mut txn, &addr(3), 1).unwrap(), (TokenId(101), TokenId(101)));
        store.apply(txn.into_batch()).unwrap();

        let txn = Txn::new(&store);
        assert_eq!(owner_of(&txn, TokenId(0)).unwrap(), Some(addr(1)));
        for id in 1..=100 {
            assert_eq!(owner_of(&txn, TokenId(id)).unwrap(), Some(addr(2)));
        }
        assert_eq!(owner_of(&txn, TokenId(101)).unwrap(), Some(addr(3)));
        assert_eq!(owner_of(&txn, TokenId(102)).unwrap(), None);
        assert_eq!(balance_of(&txn, &addr(2)).unwrap(), 100);
        assert_eq!(next_id(&txn).unwrap(), TokenId(102));
    }

    #[test]
    fn zero_count_is_rejected() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        assert!(matches!(
            mint_run(&mut txn, &addr(1), 0),
            Err(IssuanceError::InvalidCount)
        ));
        assert!(txn.is_empty());
    }

    #[test]
    fn transfer_splits_a_run() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        mint_run(&mut txn, &addr(1), 10).unwrap();
        transfer(&mut txn, &addr(1), &addr(2), TokenId(4)).unwrap();

        assert_eq!(owner_of(&txn, TokenId(3)).unwrap(), Some(addr(1)));
        assert_eq!(owner_of(&txn, TokenId(4)).unwrap(), Some(addr(2)));
        assert_eq!(owner_of(&txn, TokenId(5)).unwrap(), Some(addr(1)));
        assert_eq!(owner_of(&txn, TokenId(9)).unwrap(), Some(addr(1)));
        assert_eq!(balance_of(&txn, &addr(1)).unwrap(), 9);
        assert_eq!(balance_of(&txn, &addr(2)).unwrap(), 1);
    }

    #[test]
    fn transfer_last_id_of_supply() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        mint_run(&mut txn, &addr(1), 3).unwrap();
        transfer(&mut txn, &addr(1), &addr(2), TokenId(2)).unwrap();
        assert_eq!(owner_of(&txn, TokenId(2)).unwrap(), Some(addr(2)));
        mint_run(&mut txn, &addr(3), 1).unwrap();
        assert_eq!(owner_of(&txn, TokenId(3)).unwrap(), Some(addr(3)));
    }

    #[test]
    fn transfer_rejects_non_owner_and_unknown_id() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        mint_run(&mut txn, &addr(1), 2).unwrap();
        assert!(matches!(
            transfer(&mut txn, &addr(2), &addr(3), TokenId(0)),
            Err(IssuanceError::NotOwner { .. })
        ));
        assert!(matches!(
            transfer(&mut txn, &addr(1), &addr(3), TokenId(7)),
            Err(IssuanceError::UnknownToken { token_id: TokenId(7) })
        ));
    }
}
