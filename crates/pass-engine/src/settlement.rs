//! # Fee Settlement
//!
//! Native fees arrive as value attached to the request and must match the
//! configured amount exactly. Token fees are pulled from the payer with
//! transfer-from through a [`TokenGateway`], after checking balance first
//! and allowance second so the payer learns which one to fix.
//!
//! Collected amounts accumulate per currency under `funds:<currency>` and
//! leave only through the privileged withdrawal path.
//!
//! ## Token Gateway
//!
//! The engine talks to payment tokens only through [`TokenGateway`]. Calls
//! are synchronous and may call back into the engine; the engine's request
//! guard rejects such re-entry. A gateway may instead stage its writes and
//! hand them over with [`TokenGateway::take_staged`], so they commit in the
//! request's batch; [`TokenBook`](crate::TokenBook) works this way when
//! shared with the engine's store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pass_core::{Address, Amount, Currency};
use pass_store::{keys, Entries, StoreError};

use crate::error::IssuanceError;
use crate::txn::Txn;

// ---------------------------------------------------------------------------
// Gateway boundary
// ---------------------------------------------------------------------------

/// Which side of a token payment falls short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shortfall {
    Balance,
    Allowance,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Balance => "balance",
            Self::Allowance => "allowance",
        })
    }
}

/// Failure reported by a payment-token gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("{owner} holds {available} of token {token}, needs {required}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        available: Amount,
        required: Amount,
    },

    #[error("{owner} approved {spender} for {available} of token {token}, needs {required}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    /// The gateway does not know this token contract.
    #[error("unknown token contract {0}")]
    UnknownContract(Address),

    /// Any other refusal.
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// The book's backing store failed.
    #[error("token storage: {0}")]
    Storage(String),
}

impl From<StoreError> for SettlementError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Fungible payment-token operations the engine depends on.
pub trait TokenGateway: Send + Sync {
    fn balance_of(&self, token: &Address, owner: &Address) -> Result<Amount, SettlementError>;

    fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<Amount, SettlementError>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        token: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError>;

    /// Move `amount` out of `from`'s own balance.
    fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), SettlementError>;

    /// Writes staged by calls made during the current request. The engine
    /// commits them in the request's batch. Gateways whose transfers are
    /// final on return stage nothing.
    fn take_staged(&self) -> Entries {
        Vec::new()
    }

    /// Drop writes staged by a request that failed.
    fn discard_staged(&self) {}

    /// Whether transfers wait for the request to commit. Such transfers are
    /// discarded on failure instead of reversed.
    fn stages_transfers(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// A token transfer already executed by the gateway during a request.
/// Kept so it can be reversed if the request fails to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenMove {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

impl TokenMove {
    /// Send the tokens back.
    pub(crate) fn reverse(&self, gateway: &dyn TokenGateway) -> Result<(), SettlementError> {
        gateway.transfer(&self.token, &self.to, &self.from, self.amount)
    }
}

/// Collect `amount` of `currency` from `payer` and credit it to the held
/// balance in `txn`. Returns the token movement if one happened that must
/// be reversed should the request fail.
pub(crate) fn settle(
    txn: &mut Txn<'_>,
    gateway: &dyn TokenGateway,
    treasury: &Address,
    payer: &Address,
    currency: Currency,
    amount: Amount,
    attached: Amount,
) -> Result<Option<TokenMove>, IssuanceError> {
    let pulled = match currency {
        Currency::Native => {
            if attached != amount {
                return Err(IssuanceError::InsufficientPayment {
                    expected: amount,
                    attached,
                });
            }
            credit(txn, currency, amount)?;
            None
        }
        Currency::Token(token) => {
            if !attached.is_zero() {
                return Err(IssuanceError::InsufficientPayment {
                    expected: Amount::ZERO,
                    attached,
                });
            }
            let balance = gateway.balance_of(&token, payer)?;
            if balance < amount {
                return Err(IssuanceError::InsufficientAuthorization {
                    payer: *payer,
                    token,
                    shortfall: Shortfall::Balance,
                    required: amount,
                    available: balance,
                });
            }
            let allowance = gateway.allowance(&token, payer, treasury)?;
            if allowance < amount {
                return Err(IssuanceError::InsufficientAuthorization {
                    payer: *payer,
                    token,
                    shortfall: Shortfall::Allowance,
                    required: amount,
                    available: allowance,
                });
            }
            credit(txn, currency, amount)?;
            gateway.transfer_from(&token, treasury, payer, treasury, amount)?;
            if gateway.stages_transfers() {
                None
            } else {
                Some(TokenMove {
                    token,
                    from: *payer,
                    to: *treasury,
                    amount,
                })
            }
        }
    };
    Ok(pulled)
}

/// Held balance for `currency`.
pub(crate) fn held(txn: &Txn<'_>, currency: Currency) -> Result<Amount, IssuanceError> {
    Ok(txn.get_amount(&keys::funds(&currency))?)
}

pub(crate) fn credit(
    txn: &mut Txn<'_>,
    currency: Currency,
    amount: Amount,
) -> Result<(), IssuanceError> {
    let key = keys::funds(&currency);
    let next = txn
        .get_amount(&key)?
        .checked_add(amount)
        .ok_or(IssuanceError::ArithmeticOverflow { what: "collected funds" })?;
    txn.put_amount(key, next);
    Ok(())
}

pub(crate) fn debit(
    txn: &mut Txn<'_>,
    currency: Currency,
    amount: Amount,
) -> Result<(), IssuanceError> {
    let key = keys::funds(&currency);
    let held = txn.get_amount(&key)?;
    let next = held
        .checked_sub(amount)
        .ok_or(IssuanceError::WithdrawExceedsBalance {
            currency,
            requested: amount,
            held,
        })?;
    txn.put_amount(key, next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_book::TokenBook;
    use pass_store::MemoryStore;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    const TOKEN: u8 = 0x70;
    const PAYER: u8 = 0x01;
    const TREASURY: u8 = 0xee;

    fn funded_book(balance: u128, allowance: u128) -> TokenBook {
        let book = TokenBook::new();
        book.credit(addr(TOKEN), addr(PAYER), Amount::new(balance)).unwrap();
        book.approve(addr(TOKEN), addr(PAYER), addr(TREASURY), Amount::new(allowance))
            .unwrap();
        book
    }

    #[test]
    fn native_requires_exact_value() {
        let store = MemoryStore::new();
        let book = TokenBook::new();
        let mut txn = Txn::new(&store);
        for attached in [0u128, 2] {
            let err = settle(
                &mut txn,
                &book,
                &addr(TREASURY),
                &addr(PAYER),
                Currency::Native,
                Amount::new(1),
                Amount::new(attached),
            )
            .unwrap_err();
            assert!(matches!(err, IssuanceError::InsufficientPayment { .. }));
        }
        let pulled = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Native,
            Amount::new(1),
            Amount::new(1),
        )
        .unwrap();
        assert!(pulled.is_none());
        assert_eq!(held(&txn, Currency::Native).unwrap(), Amount::new(1));
    }

    #[test]
    fn token_balance_is_checked_before_allowance() {
        let store = MemoryStore::new();
        let book = funded_book(5, 0);
        let mut txn = Txn::new(&store);
        let err = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Token(addr(TOKEN)),
            Amount::new(10),
            Amount::ZERO,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IssuanceError::InsufficientAuthorization { shortfall: Shortfall::Balance, .. }
        ));
    }

    #[test]
    fn token_allowance_shortfall() {
        let store = MemoryStore::new();
        let book = funded_book(100, 9);
        let mut txn = Txn::new(&store);
        let err = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Token(addr(TOKEN)),
            Amount::new(10),
            Amount::ZERO,
        )
        .unwrap_err();
        match err {
            IssuanceError::InsufficientAuthorization { shortfall, available, required, .. } => {
                assert_eq!(shortfall, Shortfall::Allowance);
                assert_eq!(available, Amount::new(9));
                assert_eq!(required, Amount::new(10));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(book.balance_of(&addr(TOKEN), &addr(PAYER)).unwrap(), Amount::new(100));
    }

    #[test]
    fn token_pull_moves_exact_amount() {
        let store = MemoryStore::new();
        let book = funded_book(100, 50);
        let mut txn = Txn::new(&store);
        let pulled = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Token(addr(TOKEN)),
            Amount::new(10),
            Amount::ZERO,
        )
        .unwrap()
        .unwrap();
        assert_eq!(pulled.amount, Amount::new(10));
        assert_eq!(book.balance_of(&addr(TOKEN), &addr(PAYER)).unwrap(), Amount::new(90));
        assert_eq!(book.balance_of(&addr(TOKEN), &addr(TREASURY)).unwrap(), Amount::new(10));
        assert_eq!(
            book.allowance(&addr(TOKEN), &addr(PAYER), &addr(TREASURY)).unwrap(),
            Amount::new(40)
        );
        assert_eq!(
            held(&txn, Currency::Token(addr(TOKEN))).unwrap(),
            Amount::new(10)
        );

        pulled.reverse(&book).unwrap();
        assert_eq!(book.balance_of(&addr(TOKEN), &addr(PAYER)).unwrap(), Amount::new(100));
    }

    #[test]
    fn native_value_with_token_fee_is_rejected() {
        let store = MemoryStore::new();
        let book = funded_book(100, 100);
        let mut txn = Txn::new(&store);
        let err = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Token(addr(TOKEN)),
            Amount::new(10),
            Amount::new(1),
        )
        .unwrap_err();
        assert!(matches!(err, IssuanceError::InsufficientPayment { .. }));
    }

    #[test]
    fn debit_never_goes_negative() {
        let store = MemoryStore::new();
        let mut txn = Txn::new(&store);
        credit(&mut txn, Currency::Native, Amount::new(3)).unwrap();
        debit(&mut txn, Currency::Native, Amount::new(3)).unwrap();
        let err = debit(&mut txn, Currency::Native, Amount::new(1)).unwrap_err();
        assert!(matches!(err, IssuanceError::WithdrawExceedsBalance { .. }));
    }

    #[test]
    fn staged_pull_returns_no_move_to_reverse() {
        let store: std::sync::Arc<dyn pass_store::KvStore> = std::sync::Arc::new(MemoryStore::new());
        let book = TokenBook::shared(store.clone());
        book.credit(addr(TOKEN), addr(PAYER), Amount::new(10)).unwrap();
        book.approve(addr(TOKEN), addr(PAYER), addr(TREASURY), Amount::new(10))
            .unwrap();
        let mut txn = Txn::new(&*store);
        let pulled = settle(
            &mut txn,
            &book,
            &addr(TREASURY),
            &addr(PAYER),
            Currency::Token(addr(TOKEN)),
            Amount::new(10),
            Amount::ZERO,
        )
        .unwrap();
        assert!(pulled.is_none());
        assert_eq!(book.take_staged().len(), 3);
    }
}
