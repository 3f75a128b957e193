//! Payment tokens that call back into the engine during transfer-from.

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use pass_core::{Address, Amount, Currency, Hash32};
use pass_crypto::MerkleProof;
use pass_engine::{
    AdminContext, ErrorKind, IssuanceEngine, SettlementError, TokenBook, TokenGateway,
};
use pass_store::MemoryStore;

fn addr(b: u8) -> Address {
    Address::from_bytes([b; 20])
}

const TREASURY: u8 = 0xee;
const ADMIN: u8 = 0xad;
const TOKEN: u8 = 0x70;
const ATTACKER: u8 = 0x66;

/// Token book that tries a nested issuance for the payer before moving
/// funds, recording what the engine answered.
struct HostileToken {
    inner: TokenBook,
    engine: OnceLock<Weak<IssuanceEngine>>,
    nested: Mutex<Vec<ErrorKind>>,
}

impl HostileToken {
    fn new() -> Self {
        Self {
            inner: TokenBook::new(),
            engine: OnceLock::new(),
            nested: Mutex::new(Vec::new()),
        }
    }
}

impl TokenGateway for HostileToken {
    fn balance_of(&self, token: &Address, owner: &Address) -> Result<Amount, SettlementError> {
        self.inner.balance_of(token, owner)
    }

    fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, SettlementError> {
        self.inner.allowance(token, owner, spender)
    }

    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
            let outcome = engine.request_issuance(*from, &MerkleProof::empty(), Amount::ZERO);
            if let Err(e) = outcome {
                self.nested.lock().push(e.kind());
            }
        }
        self.inner.transfer_from(token, spender, from, to, amount)
    }

    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.inner.transfer(token, from, to, amount)
    }
}

#[test]
fn callback_during_payment_is_rejected() {
    let token = Arc::new(HostileToken::new());
    token
        .inner
        .credit(addr(TOKEN), addr(ATTACKER), Amount::new(100))
        .unwrap();
    token
        .inner
        .approve(addr(TOKEN), addr(ATTACKER), addr(TREASURY), Amount::new(100))
        .unwrap();

    let engine = Arc::new(
        IssuanceEngine::open(
            Arc::new(MemoryStore::new()),
            token.clone(),
            addr(TREASURY),
            addr(ADMIN),
        )
        .unwrap(),
    );
    assert!(token.engine.set(Arc::downgrade(&engine)).is_ok());

    let ctx = AdminContext::new(addr(ADMIN));
    engine
        .initialize_activity(&ctx, Currency::Token(addr(TOKEN)), Amount::new(10), Hash32::ZERO)
        .unwrap();
    engine.set_public_mint(&ctx, true).unwrap();

    engine
        .request_issuance(addr(ATTACKER), &MerkleProof::empty(), Amount::ZERO)
        .unwrap();

    assert_eq!(token.nested.lock().as_slice(), &[ErrorKind::Reentrancy]);
    assert_eq!(engine.balance_of(&addr(ATTACKER)).unwrap(), 1);
    assert_eq!(engine.total_supply().unwrap(), 1);
    assert_eq!(
        token.inner.balance_of(&addr(TOKEN), &addr(ATTACKER)).unwrap(),
        Amount::new(90)
    );
}

#[test]
fn guard_is_released_after_each_request() {
    let engine = IssuanceEngine::open(
        Arc::new(MemoryStore::new()),
        Arc::new(TokenBook::new()),
        addr(TREASURY),
        addr(ADMIN),
    )
    .unwrap();
    let ctx = AdminContext::new(addr(ADMIN));

    // A failed request must not leave the guard set.
    assert!(engine
        .request_issuance(addr(1), &MerkleProof::empty(), Amount::ZERO)
        .is_err());
    engine
        .initialize_activity(&ctx, Currency::Native, Amount::ZERO, Hash32::ZERO)
        .unwrap();
    engine.set_public_mint(&ctx, true).unwrap();
    for b in 1..=3 {
        engine
            .request_issuance(addr(b), &MerkleProof::empty(), Amount::ZERO)
            .unwrap();
    }
    assert_eq!(engine.total_supply().unwrap(), 3);
}

#[test]
fn concurrent_requests_issue_once_per_identity() {
    let engine = Arc::new(
        IssuanceEngine::open(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenBook::new()),
            addr(TREASURY),
            addr(ADMIN),
        )
        .unwrap(),
    );
    let ctx = AdminContext::new(addr(ADMIN));
    engine
        .initialize_activity(&ctx, Currency::Native, Amount::ZERO, Hash32::ZERO)
        .unwrap();
    engine.set_public_mint(&ctx, true).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                engine
                    .request_issuance(addr(1 + (i % 2)), &MerkleProof::empty(), Amount::ZERO)
                    .is_ok()
            })
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 2);
    assert_eq!(engine.total_supply().unwrap(), 2);
}

/// Token book that queries the engine from another thread while a payment
/// is in flight.
struct QueryingToken {
    inner: TokenBook,
    engine: OnceLock<Weak<IssuanceEngine>>,
    seen: Mutex<Vec<(bool, u64)>>,
}

impl TokenGateway for QueryingToken {
    fn balance_of(&self, token: &Address, owner: &Address) -> Result<Amount, SettlementError> {
        self.inner.balance_of(token, owner)
    }

    fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, SettlementError> {
        self.inner.allowance(token, owner, spender)
    }

    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
            let payer = *from;
            let answer = std::thread::spawn(move || {
                (
                    engine.has_issued(&payer).unwrap(),
                    engine.total_supply().unwrap(),
                )
            })
            .join()
            .map_err(|_| SettlementError::Rejected("query thread panicked".to_string()))?;
            self.seen.lock().push(answer);
        }
        self.inner.transfer_from(token, spender, from, to, amount)
    }

    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError> {
        self.inner.transfer(token, from, to, amount)
    }
}

#[test]
fn queries_from_another_thread_complete_during_payment() {
    let token = Arc::new(QueryingToken {
        inner: TokenBook::new(),
        engine: OnceLock::new(),
        seen: Mutex::new(Vec::new()),
    });
    token.inner.credit(addr(TOKEN), addr(1), Amount::new(10)).unwrap();
    token
        .inner
        .approve(addr(TOKEN), addr(1), addr(TREASURY), Amount::new(10))
        .unwrap();
    let engine = Arc::new(
        IssuanceEngine::open(
            Arc::new(MemoryStore::new()),
            token.clone(),
            addr(TREASURY),
            addr(ADMIN),
        )
        .unwrap(),
    );
    assert!(token.engine.set(Arc::downgrade(&engine)).is_ok());
    let ctx = AdminContext::new(addr(ADMIN));
    engine
        .initialize_activity(&ctx, Currency::Token(addr(TOKEN)), Amount::new(10), Hash32::ZERO)
        .unwrap();
    engine.set_public_mint(&ctx, true).unwrap();

    engine
        .request_issuance(addr(1), &MerkleProof::empty(), Amount::ZERO)
        .unwrap();

    // The other thread saw committed state only: nothing issued yet.
    assert_eq!(token.seen.lock().as_slice(), &[(false, 0)]);
    assert!(engine.has_issued(&addr(1)).unwrap());
}
