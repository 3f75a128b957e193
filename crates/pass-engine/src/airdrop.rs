//! # Privileged Issuance
//!
//! Two admin-only paths that bypass proof and payment:
//!
//! - [`IssuanceEngine::airdrop`] issues one unit to an identity and records
//!   it in the issuance ledger exactly like a public request would.
//! - [`IssuanceEngine::airdrop_batch`] mints a contiguous run of ids to one
//!   recipient. It neither consults nor updates the ledger, so a recipient
//!   of a batch can still make their own public request later.
//!
//! Neither path checks the activity phase.

use serde::{Deserialize, Serialize};
use tracing::info;

use pass_core::{Address, TokenId};

use crate::admin::{self, AdminContext};
use crate::engine::IssuanceEngine;
use crate::error::IssuanceError;
use crate::events::{self, Event};
use crate::{ledger, registry};

/// Ids minted by one batch, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub recipient: Address,
    pub start_token_id: TokenId,
    pub end_token_id: TokenId,
}

impl BatchReceipt {
    pub fn count(&self) -> u64 {
        self.end_token_id.value() - self.start_token_id.value() + 1
    }
}

impl IssuanceEngine {
    /// Issue one unit to `identity` without proof or payment.
    pub fn airdrop(&self, ctx: &AdminContext, identity: Address) -> Result<TokenId, IssuanceError> {
        self.run("airdrop", |txn, _| {
            admin::require_admin(txn, ctx, "airdrop")?;
            ledger::mark_issued(txn, &identity)?;
            let token_id = self.mint_one(txn, &identity)?;
            info!(identity = %identity, token_id = %token_id, "airdropped");
            Ok(token_id)
        })
    }

    /// Mint `count` contiguous ids to `recipient`.
    pub fn airdrop_batch(
        &self,
        ctx: &AdminContext,
        recipient: Address,
        count: u64,
    ) -> Result<BatchReceipt, IssuanceError> {
        self.run("airdrop_batch", |txn, _| {
            admin::require_admin(txn, ctx, "airdrop_batch")?;
            let (start, end) = registry::mint_run(txn, &recipient, count)?;
            events::append(
                txn,
                Event::ConsecutiveTransfer {
                    from_token_id: start,
                    to_token_id: end,
                    from: Address::ZERO,
                    to: recipient,
                },
            )?;
            events::append(
                txn,
                Event::BatchMinted {
                    recipient,
                    start_token_id: start,
                    end_token_id: end,
                },
            )?;
            info!(recipient = %recipient, start = %start, end = %end, count, "batch minted");
            Ok(BatchReceipt {
                recipient,
                start_token_id: start,
                end_token_id: end,
            })
        })
    }
}
