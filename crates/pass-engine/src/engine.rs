//! # Issuance Engine
//!
//! Orchestrates one request end to end:
//!
//! ```text
//! phase ──▶ ledger check ──▶ proof (Restricted only) ──▶ ledger mark
//!       ──▶ fee settlement (if charged) ──▶ mint one unit ──▶ events
//! ```
//!
//! ## Atomicity
//!
//! Every operation, public or privileged, runs inside [`IssuanceEngine::run`]:
//! state changes are staged in a [`Txn`] and committed as one `WriteBatch`.
//! A failed request leaves no trace in the store. A gateway that stages its
//! own writes hands them over before the commit and they land in the same
//! batch. Transfers by a gateway that applies them on return are recorded
//! and reversed if the request fails after them, including when the commit
//! itself fails.
//!
//! ## Mutual Exclusion and Re-entry
//!
//! One `parking_lot::ReentrantMutex` per engine serializes all operations.
//! It is re-entrant so that a payment-token callback on the same thread
//! does not deadlock; instead the in-flight flag it guards is already set
//! and the nested call fails with `Reentrancy` before reading any state.
//!
//! The flag only sees the thread holding the lock. A gateway that hands a
//! mutating call to another thread and waits for it deadlocks: that thread
//! blocks on the lock until the request finishes. Queries do not take the
//! lock and may be made from any thread during a request.

use std::cell::Cell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use pass_core::{Address, Amount, Currency, Hash32, TokenId};
use pass_crypto::{verify_member, MerkleProof};
use pass_state::{FeeTerms, Phase, PhaseController, PhaseError, PhaseTransitionRecord};
use pass_store::{keys, KvStore};

use crate::admin::{self, AdminContext};
use crate::error::IssuanceError;
use crate::events::{self, Event, EventRecord};
use crate::ledger;
use crate::registry;
use crate::settlement::{self, TokenGateway, TokenMove};
use crate::txn::Txn;

/// Result of a successful public issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceReceipt {
    pub identity: Address,
    pub token_id: TokenId,
    /// Fee collected, if one was configured.
    pub fee: Option<FeeTerms>,
}

/// Clears the in-flight flag when a request ends, however it ends.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Token transfers made during the current request.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    moves: Vec<TokenMove>,
}

impl Effects {
    pub(crate) fn record(&mut self, token_move: TokenMove) {
        self.moves.push(token_move);
    }
}

/// The issuance engine for one activity.
pub struct IssuanceEngine {
    pub(crate) store: Arc<dyn KvStore>,
    pub(crate) gateway: Arc<dyn TokenGateway>,
    pub(crate) treasury: Address,
    guard: ReentrantMutex<Cell<bool>>,
}

impl std::fmt::Debug for IssuanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceEngine")
            .field("treasury", &self.treasury)
            .finish_non_exhaustive()
    }
}

impl IssuanceEngine {
    /// Open the activity held in `store`.
    ///
    /// On first open the store is empty: `deployer` becomes admin and the
    /// activity starts Uninitialized. On later opens the stored admin and
    /// configuration stand and `deployer` is ignored.
    ///
    /// `treasury` is the engine's own account on the payment-token side: it
    /// spends payer allowances and receives token fees.
    pub fn open(
        store: Arc<dyn KvStore>,
        gateway: Arc<dyn TokenGateway>,
        treasury: Address,
        deployer: Address,
    ) -> Result<Self, IssuanceError> {
        let engine = Self {
            store,
            gateway,
            treasury,
            guard: ReentrantMutex::new(Cell::new(false)),
        };
        engine.run("open", |txn, _| {
            if txn.get(keys::ADMIN)?.is_some() {
                return Ok(());
            }
            if deployer.is_zero() {
                return Err(IssuanceError::Unauthorized { caller: deployer });
            }
            admin::set_admin(txn, &deployer);
            txn.put_json(keys::ACTIVITY.to_vec(), &PhaseController::new())?;
            info!(admin = %deployer, treasury = %treasury, "activity created");
            Ok(())
        })?;
        Ok(engine)
    }

    /// Run `body` as one atomic, mutually exclusive request.
    pub(crate) fn run<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&mut Txn<'_>, &mut Effects) -> Result<T, IssuanceError>,
    ) -> Result<T, IssuanceError> {
        let lock = self.guard.lock();
        if lock.get() {
            warn!(operation, "re-entrant call rejected");
            return Err(IssuanceError::Reentrancy);
        }
        let _in_flight = InFlight::enter(&lock);

        let mut txn = Txn::new(&*self.store);
        let mut effects = Effects::default();
        let outcome = body(&mut txn, &mut effects).and_then(|value| {
            txn.put_all(self.gateway.take_staged());
            if !txn.is_empty() {
                self.store.apply(txn.into_batch()).map_err(|e| {
                    error!(operation, error = %e, "commit failed");
                    IssuanceError::from(e)
                })?;
                if let Err(e) = self.store.flush() {
                    error!(operation, error = %e, "flush after commit failed");
                }
            }
            Ok(value)
        });
        if outcome.is_err() {
            self.gateway.discard_staged();
            self.reverse(operation, &effects);
        }
        outcome
    }

    fn reverse(&self, operation: &'static str, effects: &Effects) {
        for m in effects.moves.iter().rev() {
            match m.reverse(&*self.gateway) {
                Ok(()) => info!(
                    operation,
                    token = %m.token,
                    to = %m.from,
                    amount = %m.amount,
                    "token transfer reversed"
                ),
                Err(e) => error!(
                    operation,
                    token = %m.token,
                    to = %m.from,
                    amount = %m.amount,
                    error = %e,
                    "failed to reverse token transfer"
                ),
            }
        }
    }

    // ─── Public issuance ─────────────────────────────────────────────

    /// Issue one unit to `identity`.
    ///
    /// `proof` is checked only in Restricted mode. `attached` is the native
    /// value sent with the request and must equal the fee when the fee is
    /// native, and zero otherwise.
    pub fn request_issuance(
        &self,
        identity: Address,
        proof: &MerkleProof,
        attached: Amount,
    ) -> Result<IssuanceReceipt, IssuanceError> {
        self.run("request_issuance", |txn, effects| {
            let activity = load_activity(txn)?;
            let phase = activity.phase();
            if !phase.accepts_requests() {
                debug!(identity = %identity, "rejected: not initialized");
                return Err(IssuanceError::NotInitialized);
            }
            if ledger::has_issued(txn, &identity)? {
                debug!(identity = %identity, "rejected: already issued");
                return Err(IssuanceError::AlreadyIssued { identity });
            }
            if phase.requires_proof()
                && !verify_member(&identity, proof, &activity.trusted_digest())
            {
                debug!(identity = %identity, proof_len = proof.len(), "rejected: proof does not verify");
                return Err(IssuanceError::NotEligible { identity });
            }

            ledger::mark_issued(txn, &identity)?;

            let fee = activity.fee();
            let charged = if fee.is_charged() {
                let moved = settlement::settle(
                    txn,
                    &*self.gateway,
                    &self.treasury,
                    &identity,
                    fee.currency,
                    fee.amount,
                    attached,
                )?;
                if let Some(m) = moved {
                    effects.record(m);
                }
                events::append(
                    txn,
                    Event::FeeCollected {
                        payer: identity,
                        currency: fee.currency,
                        amount: fee.amount,
                    },
                )?;
                Some(fee)
            } else {
                if !attached.is_zero() {
                    return Err(IssuanceError::InsufficientPayment {
                        expected: Amount::ZERO,
                        attached,
                    });
                }
                None
            };

            let token_id = self.mint_one(txn, &identity)?;
            info!(identity = %identity, token_id = %token_id, phase = %phase, "issued");
            Ok(IssuanceReceipt {
                identity,
                token_id,
                fee: charged,
            })
        })
    }

    pub(crate) fn mint_one(&self, txn: &mut Txn<'_>, to: &Address) -> Result<TokenId, IssuanceError> {
        let (token_id, _) = registry::mint_run(txn, to, 1)?;
        events::append(
            txn,
            Event::Transfer {
                from: Address::ZERO,
                to: *to,
                token_id,
            },
        )?;
        Ok(token_id)
    }

    /// Owner-initiated transfer of one unit. The issuance ledger is not
    /// affected: the sender stays recorded as issued.
    pub fn transfer(&self, caller: Address, to: Address, token_id: TokenId) -> Result<(), IssuanceError> {
        self.run("transfer", |txn, _| {
            registry::transfer(txn, &caller, &to, token_id)?;
            events::append(
                txn,
                Event::Transfer {
                    from: caller,
                    to,
                    token_id,
                },
            )?;
            info!(from = %caller, to = %to, token_id = %token_id, "transferred");
            Ok(())
        })
    }

    // ─── Activity administration ─────────────────────────────────────

    /// Set fee terms and the trusted digest, entering Restricted mode.
    pub fn initialize_activity(
        &self,
        ctx: &AdminContext,
        currency: Currency,
        amount: Amount,
        digest: Hash32,
    ) -> Result<PhaseTransitionRecord, IssuanceError> {
        self.change_activity(ctx, "initialize_activity", |pc| {
            pc.initialize(currency, amount, digest)
        })
    }

    /// Replace the trusted allowlist digest.
    pub fn update_whitelist(
        &self,
        ctx: &AdminContext,
        digest: Hash32,
    ) -> Result<PhaseTransitionRecord, IssuanceError> {
        self.change_activity(ctx, "update_whitelist", |pc| pc.update_digest(digest))
    }

    /// Toggle Open (true) or Restricted (false) issuance.
    pub fn set_public_mint(
        &self,
        ctx: &AdminContext,
        enabled: bool,
    ) -> Result<PhaseTransitionRecord, IssuanceError> {
        self.change_activity(ctx, "set_public_mint", |pc| pc.set_public_mode(enabled))
    }

    /// Replace the fee terms.
    pub fn change_price(
        &self,
        ctx: &AdminContext,
        currency: Currency,
        amount: Amount,
    ) -> Result<PhaseTransitionRecord, IssuanceError> {
        self.change_activity(ctx, "change_price", |pc| pc.set_fee(currency, amount))
    }

    fn change_activity(
        &self,
        ctx: &AdminContext,
        operation: &'static str,
        change: impl FnOnce(&mut PhaseController) -> Result<PhaseTransitionRecord, PhaseError>,
    ) -> Result<PhaseTransitionRecord, IssuanceError> {
        self.run(operation, |txn, _| {
            admin::require_admin(txn, ctx, operation)?;
            let mut activity = load_activity(txn)?;
            let record = change(&mut activity)?;
            txn.put_json(keys::ACTIVITY.to_vec(), &activity)?;
            let seq = events::append(
                txn,
                Event::ActivityChanged {
                    record: record.clone(),
                },
            )?;
            txn.put_json(keys::transition(seq), &record)?;
            info!(
                operation,
                from = %record.from_phase,
                to = %record.to_phase,
                fee = %activity.fee(),
                digest = %activity.trusted_digest(),
                "activity changed"
            );
            Ok(record)
        })
    }

    /// Hand the admin capability to `new_admin`.
    pub fn transfer_admin(&self, ctx: &AdminContext, new_admin: Address) -> Result<(), IssuanceError> {
        self.run("transfer_admin", |txn, _| {
            let previous = admin::require_admin(txn, ctx, "transfer_admin")?;
            if new_admin.is_zero() {
                return Err(IssuanceError::Unauthorized { caller: new_admin });
            }
            admin::set_admin(txn, &new_admin);
            events::append(
                txn,
                Event::AdminTransferred {
                    previous,
                    admin: new_admin,
                },
            )?;
            info!(previous = %previous, admin = %new_admin, "admin transferred");
            Ok(())
        })
    }

    // ─── Queries ─────────────────────────────────────────────────────

    fn read<T>(&self, f: impl FnOnce(&Txn<'_>) -> Result<T, IssuanceError>) -> Result<T, IssuanceError> {
        f(&Txn::new(&*self.store))
    }

    /// Whether `identity` is recorded in the issuance ledger.
    pub fn has_issued(&self, identity: &Address) -> Result<bool, IssuanceError> {
        self.read(|txn| ledger::has_issued(txn, identity))
    }

    /// Number of units minted so far.
    pub fn total_supply(&self) -> Result<u64, IssuanceError> {
        self.read(|txn| Ok(registry::next_id(txn)?.value()))
    }

    /// Id the next mint will receive.
    pub fn next_token_id(&self) -> Result<TokenId, IssuanceError> {
        self.read(registry::next_id)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Option<Address>, IssuanceError> {
        self.read(|txn| registry::owner_of(txn, token_id))
    }

    /// Units held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> Result<u64, IssuanceError> {
        self.read(|txn| registry::balance_of(txn, owner))
    }

    pub fn phase(&self) -> Result<Phase, IssuanceError> {
        self.read(|txn| Ok(load_activity(txn)?.phase()))
    }

    /// Current activity configuration.
    pub fn activity(&self) -> Result<PhaseController, IssuanceError> {
        self.read(load_activity)
    }

    /// Every applied activity change, oldest first.
    pub fn activity_changes(&self) -> Result<Vec<PhaseTransitionRecord>, IssuanceError> {
        self.store
            .scan_prefix(keys::TRANSITION_PREFIX)?
            .into_iter()
            .map(|(k, v)| {
                keys::decode_json::<PhaseTransitionRecord>(&k, &v).map_err(IssuanceError::from)
            })
            .collect()
    }

    pub fn admin(&self) -> Result<Address, IssuanceError> {
        self.read(admin::current_admin)
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    /// Collected, not yet withdrawn, balance in `currency`.
    pub fn held_balance(&self, currency: Currency) -> Result<Amount, IssuanceError> {
        self.read(|txn| settlement::held(txn, currency))
    }

    /// Committed events with sequence number `>= from`, oldest first.
    pub fn events_since(&self, from: u64, limit: Option<usize>) -> Result<Vec<EventRecord>, IssuanceError> {
        Ok(events::since(&*self.store, from, limit)?)
    }
}

pub(crate) fn load_activity(txn: &Txn<'_>) -> Result<PhaseController, IssuanceError> {
    Ok(txn
        .get_json::<PhaseController>(keys::ACTIVITY)?
        .unwrap_or_default())
}
