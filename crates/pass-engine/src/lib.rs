//! # pass-engine — Issuance Engine
//!
//! Issues at most one pass per identity, gated by an allowlist digest while
//! the activity is Restricted and open to everyone once it is Open:
//!
//! - **Engine** (`engine.rs`): the public request path, activity
//!   administration, owner transfers, and read-only queries. Every
//!   operation runs under one request guard and commits one atomic batch.
//!
//! - **Ledger** (`ledger.rs`): insert-only identity -> issued record.
//!
//! - **Registry** (`registry.rs`): contiguous unit ids and run-based
//!   ownership, so a batch of any size costs constant writes.
//!
//! - **Settlement** (`settlement.rs`): native and token fee collection and
//!   the [`TokenGateway`] boundary.
//!
//! - **Token book** (`token_book.rs`): store-backed payment-token ledger
//!   whose transfers can commit in the engine's batch.
//!
//! - **Airdrop** (`airdrop.rs`) and **Withdraw** (`withdraw.rs`): admin-only
//!   issuance and fee withdrawal.
//!
//! - **Events** (`events.rs`): append-only log committed with the state it
//!   describes, polled with [`IssuanceEngine::events_since`].
//!
//! ## Crate Policy
//!
//! - Depends on `pass-core`, `pass-crypto`, `pass-state`, `pass-store`.
//! - State lives behind [`pass_store::KvStore`]; the engine holds no
//!   in-memory copy, so reopening a store resumes exactly where it stopped.
//! - Privileged calls take an [`AdminContext`]; there is no ambient caller.

pub mod admin;
pub mod airdrop;
pub mod engine;
pub mod error;
pub mod events;
mod ledger;
mod registry;
pub mod settlement;
pub mod token_book;
mod txn;
pub mod withdraw;

pub use admin::AdminContext;
pub use airdrop::BatchReceipt;
pub use engine::{IssuanceEngine, IssuanceReceipt};
pub use error::{ErrorKind, IssuanceError};
pub use events::{Event, EventRecord};
pub use settlement::{SettlementError, Shortfall, TokenGateway};
pub use token_book::TokenBook;
pub use withdraw::Withdrawal;
