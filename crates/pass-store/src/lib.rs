//! # pass-store — Durable Activity State
//!
//! Everything the issuance engine must remember across restarts lives in a
//! single key-value keyspace behind the [`KvStore`] trait: the activity
//! configuration, the admin address, the issuance ledger, unit ownership,
//! collected funds, and the event log. The local payment-token book shares
//! the keyspace so its transfers commit in the same batch as the request
//! that made them.
//!
//! ## Write Model
//!
//! The store is insert-and-overwrite only from the engine's point of view.
//! Every state change of one request is collected into a [`WriteBatch`]
//! and applied with [`KvStore::apply`], which is atomic: either every
//! operation lands or none does.
//!
//! ## Backends
//!
//! - [`MemoryStore`]: `BTreeMap` behind a `parking_lot::RwLock`. Tests and
//!   ephemeral runs.
//! - [`SledStore`]: embedded `sled` database. Batches map onto
//!   `sled::Batch` / `apply_batch`.

pub mod batch;
pub mod error;
pub mod keys;
pub mod memory;
pub mod sled_store;
pub mod traits;

pub use batch::{BatchOp, WriteBatch};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use sled_store::SledStore;
pub use traits::{Entries, KvStore};
