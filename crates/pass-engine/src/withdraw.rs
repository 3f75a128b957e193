//! Withdrawal of collected fees to the admin.
//!
//! Native funds are released by recording the debit; the host delivers the
//! value. Token funds move from the treasury to the admin through the
//! gateway inside the request. A treasury that holds less than the recorded
//! balance fails the withdrawal with `WithdrawExceedsBalance`, naming what
//! the treasury actually holds.

use serde::{Deserialize, Serialize};
use tracing::info;

use pass_core::{Address, Amount, Currency};

use crate::admin::{self, AdminContext};
use crate::engine::IssuanceEngine;
use crate::error::IssuanceError;
use crate::events::{self, Event};
use crate::settlement::{self, SettlementError, TokenMove};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub currency: Currency,
    pub amount: Amount,
    pub to: Address,
}

impl IssuanceEngine {
    /// Send `amount` of held `currency` to the admin. Fails with
    /// `WithdrawExceedsBalance` if more is requested than is held.
    pub fn withdraw(
        &self,
        ctx: &AdminContext,
        currency: Currency,
        amount: Amount,
    ) -> Result<Withdrawal, IssuanceError> {
        self.run("withdraw", |txn, effects| {
            let admin = admin::require_admin(txn, ctx, "withdraw")?;
            settlement::debit(txn, currency, amount)?;
            if let Currency::Token(token) = currency {
                if !amount.is_zero() {
                    self.gateway
                        .transfer(&token, &self.treasury, &admin, amount)
                        .map_err(|e| match e {
                            SettlementError::InsufficientBalance { available, .. } => {
                                IssuanceError::WithdrawExceedsBalance {
                                    currency,
                                    requested: amount,
                                    held: available,
                                }
                            }
                            other => IssuanceError::Settlement(other),
                        })?;
                    if !self.gateway.stages_transfers() {
                        effects.record(TokenMove {
                            token,
                            from: self.treasury,
                            to: admin,
                            amount,
                        });
                    }
                }
            }
            events::append(
                txn,
                Event::Withdrawn {
                    currency,
                    amount,
                    to: admin,
                },
            )?;
            info!(currency = %currency, amount = %amount, to = %admin, "withdrawn");
            Ok(Withdrawal {
                currency,
                amount,
                to: admin,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::settlement::TokenGateway;
    use crate::token_book::TokenBook;
    use pass_core::Hash32;
    use pass_crypto::MerkleProof;
    use pass_store::MemoryStore;

    fn addr(b: u8) -> Address {
        Address::from_bytes([b; 20])
    }

    #[test]
    fn native_withdraw_is_bounded_by_held() {
        let engine = IssuanceEngine::open(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenBook::new()),
            addr(0xee),
            addr(0xad),
        )
        .unwrap();
        let ctx = AdminContext::new(addr(0xad));
        engine
            .initialize_activity(&ctx, Currency::Native, Amount::new(3), Hash32::ZERO)
            .unwrap();
        engine.set_public_mint(&ctx, true).unwrap();
        engine
            .request_issuance(addr(1), &MerkleProof::empty(), Amount::new(3))
            .unwrap();

        assert!(matches!(
            engine.withdraw(&ctx, Currency::Native, Amount::new(4)),
            Err(IssuanceError::WithdrawExceedsBalance { .. })
        ));
        let w = engine.withdraw(&ctx, Currency::Native, Amount::new(3)).unwrap();
        assert_eq!(w.to, addr(0xad));
        assert_eq!(engine.held_balance(Currency::Native).unwrap(), Amount::ZERO);
        assert!(matches!(
            engine.withdraw(&ctx, Currency::Native, Amount::new(1)),
            Err(IssuanceError::WithdrawExceedsBalance { .. })
        ));
    }

    #[test]
    fn token_withdraw_moves_tokens_to_admin() {
        let token = addr(0x70);
        let book = Arc::new(TokenBook::new());
        book.credit(token, addr(1), Amount::new(50)).unwrap();
        book.approve(token, addr(1), addr(0xee), Amount::new(50)).unwrap();
        let engine =
            IssuanceEngine::open(Arc::new(MemoryStore::new()), book.clone(), addr(0xee), addr(0xad))
                .unwrap();
        let ctx = AdminContext::new(addr(0xad));
        engine
            .initialize_activity(&ctx, Currency::Token(token), Amount::new(20), Hash32::ZERO)
            .unwrap();
        engine.set_public_mint(&ctx, true).unwrap();
        engine
            .request_issuance(addr(1), &MerkleProof::empty(), Amount::ZERO)
            .unwrap();

        engine
            .withdraw(&ctx, Currency::Token(token), Amount::new(15))
            .unwrap();
        assert_eq!(book.balance_of(&token, &addr(0xad)).unwrap(), Amount::new(15));
        assert_eq!(book.balance_of(&token, &addr(0xee)).unwrap(), Amount::new(5));
        assert_eq!(
            engine.held_balance(Currency::Token(token)).unwrap(),
            Amount::new(5)
        );
    }

    #[test]
    fn only_admin_withdraws() {
        let engine = IssuanceEngine::open(
            Arc::new(MemoryStore::new()),
            Arc::new(TokenBook::new()),
            addr(0xee),
            addr(0xad),
        )
        .unwrap();
        assert!(matches!(
            engine.withdraw(&AdminContext::new(addr(1)), Currency::Native, Amount::ZERO),
            Err(IssuanceError::Unauthorized { .. })
        ));
    }

    #[test]
    fn short_treasury_reports_withdraw_exceeds_balance() {
        let token = addr(0x70);
        let book = Arc::new(TokenBook::new());
        book.credit(token, addr(1), Amount::new(20)).unwrap();
        book.approve(token, addr(1), addr(0xee), Amount::new(20)).unwrap();
        let engine =
            IssuanceEngine::open(Arc::new(MemoryStore::new()), book.clone(), addr(0xee), addr(0xad))
                .unwrap();
        let ctx = AdminContext::new(addr(0xad));
        engine
            .initialize_activity(&ctx, Currency::Token(token), Amount::new(20), Hash32::ZERO)
            .unwrap();
        engine.set_public_mint(&ctx, true).unwrap();
        engine
            .request_issuance(addr(1), &MerkleProof::empty(), Amount::ZERO)
            .unwrap();
        // The treasury's tokens leave behind the engine's back.
        book.transfer(&token, &addr(0xee), &addr(2), Amount::new(15)).unwrap();

        match engine.withdraw(&ctx, Currency::Token(token), Amount::new(20)) {
            Err(IssuanceError::WithdrawExceedsBalance { requested, held, .. }) => {
                assert_eq!(requested, Amount::new(20));
                assert_eq!(held, Amount::new(5));
            }
            other => panic!("expected WithdrawExceedsBalance, got {other:?}"),
        }
        assert_eq!(
            engine.held_balance(Currency::Token(token)).unwrap(),
            Amount::new(20)
        );
    }

    #[test]
    fn shared_book_withdraw_commits_with_debit() {
        let token = addr(0x70);
        let store: Arc<dyn pass_store::KvStore> = Arc::new(MemoryStore::new());
        let book = Arc::new(TokenBook::shared(store.clone()));
        book.credit(token, addr(1), Amount::new(20)).unwrap();
        book.approve(token, addr(1), addr(0xee), Amount::new(20)).unwrap();
        let engine = IssuanceEngine::open(store, book.clone(), addr(0xee), addr(0xad)).unwrap();
        let ctx = AdminContext::new(addr(0xad));
        engine
            .initialize_activity(&ctx, Currency::Token(token), Amount::new(20), Hash32::ZERO)
            .unwrap();
        engine.set_public_mint(&ctx, true).unwrap();
        engine
            .request_issuance(addr(1), &MerkleProof::empty(), Amount::ZERO)
            .unwrap();
        engine
            .withdraw(&ctx, Currency::Token(token), Amount::new(20))
            .unwrap();
        assert_eq!(book.balance_of(&token, &addr(0xad)).unwrap(), Amount::new(20));
        assert_eq!(book.balance_of(&token, &addr(0xee)).unwrap(), Amount::ZERO);
        assert_eq!(engine.held_balance(Currency::Token(token)).unwrap(), Amount::ZERO);
    }
}
