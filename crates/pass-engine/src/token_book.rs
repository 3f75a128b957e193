//! # Local Token Book
//!
//! A payment-token ledger implementing [`TokenGateway`] for local operation
//! and tests. Balances and allowances live in a [`KvStore`] under the
//! `token_*` keys; a token exists once it has been credited.
//!
//! ## Modes
//!
//! [`TokenBook::shared`] opens the book on the engine's own store. Gateway
//! calls made inside a request are staged and handed to the engine, which
//! commits them in the request's batch: a fee pull lands together with the
//! issuance it pays for, or not at all.
//!
//! [`TokenBook::new`] keeps its own in-memory store and applies every
//! transfer before returning, like an external token contract. The engine
//! reverses such transfers when the request that made them fails.
//!
//! `credit` and `approve` are operator actions outside any request and
//! apply immediately in both modes. A credit is folded into any staged
//! balance for the same key, and an approval replaces a staged allowance,
//! so the outcome is the same whether the request in flight commits or not.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use pass_core::{Address, Amount};
use pass_store::{keys, Entries, KvStore, MemoryStore, WriteBatch};

use crate::settlement::{SettlementError, TokenGateway};

type Pending = BTreeMap<Vec<u8>, Vec<u8>>;

/// Store-backed token book.
pub struct TokenBook {
    store: Arc<dyn KvStore>,
    staging: bool,
    pending: Mutex<Pending>,
}

impl std::fmt::Debug for TokenBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBook")
            .field("staging", &self.staging)
            .field("pending", &self.pending.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for TokenBook {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBook {
    /// A standalone book over a fresh in-memory store.
    pub fn new() -> Self {
        Self::over(Arc::new(MemoryStore::new()), false)
    }

    /// A book on `store`, which must be the store the engine commits to.
    pub fn shared(store: Arc<dyn KvStore>) -> Self {
        Self::over(store, true)
    }

    fn over(store: Arc<dyn KvStore>, staging: bool) -> Self {
        Self {
            store,
            staging,
            pending: Mutex::new(Pending::new()),
        }
    }

    /// Mint `amount` of `token` to `owner`.
    pub fn credit(&self, token: Address, owner: Address, amount: Amount) -> Result<(), SettlementError> {
        let mut pending = self.pending.lock();
        let key = keys::token_balance(&token, &owner);
        let next = add(self.stored(&key)?, amount)?;
        let staged = match pending.get(&key) {
            Some(v) => Some(add(keys::decode_amount(&key, v)?, amount)?),
            None => None,
        };

        let mut batch = WriteBatch::new();
        batch.put(keys::token(&token), vec![1u8]);
        batch.put(key.clone(), next.to_be_bytes().to_vec());
        self.apply(batch)?;
        if let Some(v) = staged {
            pending.insert(key, v.to_be_bytes().to_vec());
        }
        debug!(token = %token, owner = %owner, amount = %amount, "credited");
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s `token` balance.
    pub fn approve(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        let mut pending = self.pending.lock();
        self.require_known(&token)?;
        let key = keys::token_allowance(&token, &owner, &spender);
        let mut batch = WriteBatch::new();
        batch.put(key.clone(), amount.to_be_bytes().to_vec());
        self.apply(batch)?;
        if let Some(v) = pending.get_mut(&key) {
            *v = amount.to_be_bytes().to_vec();
        }
        debug!(token = %token, owner = %owner, spender = %spender, amount = %amount, "approved");
        Ok(())
    }

    fn require_known(&self, token: &Address) -> Result<(), SettlementError> {
        match self.store.get(&keys::token(token))? {
            Some(_) => Ok(()),
            None => Err(SettlementError::UnknownContract(*token)),
        }
    }

    fn stored(&self, key: &[u8]) -> Result<Amount, SettlementError> {
        match self.store.get(key)? {
            Some(v) => Ok(keys::decode_amount(key, &v)?),
            None => Ok(Amount::ZERO),
        }
    }

    /// Current value of `key`, staged writes first.
    fn read(&self, pending: &Pending, key: &[u8]) -> Result<Amount, SettlementError> {
        match pending.get(key) {
            Some(v) => Ok(keys::decode_amount(key, v)?),
            None => self.stored(key),
        }
    }

    fn write(&self, pending: &mut Pending, writes: Vec<(Vec<u8>, Amount)>) -> Result<(), SettlementError> {
        if self.staging {
            for (key, value) in writes {
                pending.insert(key, value.to_be_bytes().to_vec());
            }
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        for (key, value) in writes {
            batch.put(key, value.to_be_bytes().to_vec());
        }
        self.apply(batch)
    }

    fn apply(&self, batch: WriteBatch) -> Result<(), SettlementError> {
        self.store.apply(batch)?;
        if let Err(e) = self.store.flush() {
            warn!(error = %e, "token book flush failed");
        }
        Ok(())
    }

    /// Balance writes for moving `amount` from `from` to `to`.
    fn move_balance(
        &self,
        pending: &Pending,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Vec<(Vec<u8>, Amount)>, SettlementError> {
        let from_key = keys::token_balance(token, from);
        let available = self.read(pending, &from_key)?;
        let remaining = available
            .checked_sub(amount)
            .ok_or(SettlementError::InsufficientBalance {
                token: *token,
                owner: *from,
                available,
                required: amount,
            })?;
        if from == to {
            return Ok(Vec::new());
        }
        let to_key = keys::token_balance(token, to);
        let credited = add(self.read(pending, &to_key)?, amount)?;
        Ok(vec![(from_key, remaining), (to_key, credited)])
    }
}

fn add(a: Amount, b: Amount) -> Result<Amount, SettlementError> {
    a.checked_add(b)
        .ok_or_else(|| SettlementError::Rejected("balance overflow".to_string()))
}

impl TokenGateway for TokenBook {
    fn balance_of(&self, token: &Address, owner: &Address) -> Result<Amount, SettlementError> {
        let pending = self.pending.lock();
        self.require_known(token)?;
        self.read(&pending, &keys::token_balance(token, owner))
    }

    fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, SettlementError> {
        let pending = self.pending.lock();
        self.require_known(token)?;
        self.read(&pending, &keys::token_allowance(token, owner, spender))
    }

    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        let mut pending = self.pending.lock();
        self.require_known(token)?;
        let available = self.read(&pending, &keys::token_balance(token, from))?;
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                token: *token,
                owner: *from,
                available,
                required: amount,
            });
        }
        let allowance_key = keys::token_allowance(token, from, spender);
        let allowed = self.read(&pending, &allowance_key)?;
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(SettlementError::InsufficientAllowance {
                token: *token,
                owner: *from,
                spender: *spender,
                available: allowed,
                required: amount,
            })?;
        let mut writes = self.move_balance(&pending, token, from, to, amount)?;
        writes.push((allowance_key, remaining));
        self.write(&mut pending, writes)
    }

    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        let mut pending = self.pending.lock();
        self.require_known(token)?;
        let writes = self.move_balance(&pending, token, from, to, amount)?;
        self.write(&mut pending, writes)
    }

    fn take_staged(&self) -> Entries {
        std::mem::take(&mut *self.pending.lock()).into_iter().collect()
    }

    fn discard_staged(&self) {
        let dropped = std::mem::take(&mut *self.pending.lock());
        if !dropped.is_empty() {
            debug!(writes = dropped.len(), "discarded staged token writes");
        }
    }

    fn stages_transfers(&self) -> bool {
        self.staging
    }
}
