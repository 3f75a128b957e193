//! # pass-cli — Operator and Holder CLI
//!
//! Provides the `pass` command over a durable sled data directory.
//!
//! ## Subcommands
//!
//! - `pass activity`: init, whitelist rotation, public mode, price, admin handover.
//! - `pass mint`: public issuance request by `--caller`.
//! - `pass airdrop`, `pass airdrop-batch`, `pass airdrop-list`: privileged issuance.
//! - `pass transfer`: owner transfer of one unit.
//! - `pass whitelist`: build allowlist trees and proofs, verify membership.
//! - `pass token`: local payment-token book.
//! - `pass withdraw`: collected fees to the admin.
//! - `pass query`: status, ownership, balances, event log.
//!
//! ```bash
//! pass whitelist build recipients.csv --out wl.json
//! pass activity init --fee 1 --root 0x…
//! pass --caller 0x… mint --proofs-file wl.json --value 1
//! pass airdrop-list recipients.csv --fee-hint standard
//! ```

pub mod activity;
pub mod config;
pub mod issue;
pub mod query;
pub mod recipients;
pub mod token;
pub mod whitelist;
pub mod workspace;
