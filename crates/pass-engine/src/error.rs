//! # Issuance Errors
//!
//! Every failure aborts the whole request: nothing staged by a failed
//! request reaches the store. Callers that need to branch on the failure
//! use [`IssuanceError::kind`], which maps each variant onto a small
//! `Copy` enum.

use thiserror::Error;

use pass_core::{Address, Amount, CanonicalizationError, Currency, TokenId};
use pass_state::PhaseError;
use pass_store::StoreError;

use crate::settlement::{SettlementError, Shortfall};

/// Failure of an engine operation.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The activity has not been initialized.
    #[error("activity not initialized")]
    NotInitialized,

    /// `initialize_activity` was called a second time.
    #[error("activity already initialized")]
    AlreadyInitialized,

    /// The identity is already recorded in the issuance ledger.
    #[error("{identity} has already been issued a pass")]
    AlreadyIssued { identity: Address },

    /// Restricted mode and the proof does not verify against the trusted
    /// digest.
    #[error("{identity} is not in the allowlist")]
    NotEligible { identity: Address },

    /// Attached native value differs from the configured fee.
    #[error("payment mismatch: expected {expected}, attached {attached}")]
    InsufficientPayment { expected: Amount, attached: Amount },

    /// The payer's token balance or allowance does not cover the fee.
    #[error("insufficient {shortfall} for payment: {payer} has {available} of {required} in {token}")]
    InsufficientAuthorization {
        payer: Address,
        token: Address,
        shortfall: Shortfall,
        required: Amount,
        available: Amount,
    },

    /// A privileged operation was called by someone other than the admin.
    #[error("caller {caller} is not the admin")]
    Unauthorized { caller: Address },

    /// Withdrawal larger than the held balance.
    #[error("cannot withdraw {requested} {currency}: only {held} held")]
    WithdrawExceedsBalance {
        currency: Currency,
        requested: Amount,
        held: Amount,
    },

    /// A request was issued from inside another request on the same
    /// thread, typically from a payment-token callback.
    #[error("re-entrant call rejected: a request is already in progress")]
    Reentrancy,

    /// Batch issuance with a count of zero.
    #[error("batch count must be at least 1")]
    InvalidCount,

    /// A counter or balance would overflow.
    #[error("arithmetic overflow in {what}")]
    ArithmeticOverflow { what: &'static str },

    /// The unit id has not been minted.
    #[error("unit {token_id} does not exist")]
    UnknownToken { token_id: TokenId },

    /// Transfer requested by someone who does not own the unit.
    #[error("{caller} does not own unit {token_id}")]
    NotOwner { caller: Address, token_id: TokenId },

    /// The payment-token gateway rejected a transfer for a reason other
    /// than a balance or allowance shortfall.
    #[error("settlement failed: {0}")]
    Settlement(SettlementError),

    #[error("storage: {0}")]
    Store(#[from] StoreError),

    #[error("canonicalization: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Discriminant of [`IssuanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotInitialized,
    AlreadyInitialized,
    AlreadyIssued,
    NotEligible,
    InsufficientPayment,
    InsufficientAuthorization,
    Unauthorized,
    WithdrawExceedsBalance,
    Reentrancy,
    InvalidCount,
    ArithmeticOverflow,
    UnknownToken,
    NotOwner,
    Settlement,
    Store,
    Canonicalization,
}

impl IssuanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            Self::AlreadyIssued { .. } => ErrorKind::AlreadyIssued,
            Self::NotEligible { .. } => ErrorKind::NotEligible,
            Self::InsufficientPayment { .. } => ErrorKind::InsufficientPayment,
            Self::InsufficientAuthorization { .. } => ErrorKind::InsufficientAuthorization,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::WithdrawExceedsBalance { .. } => ErrorKind::WithdrawExceedsBalance,
            Self::Reentrancy => ErrorKind::Reentrancy,
            Self::InvalidCount => ErrorKind::InvalidCount,
            Self::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            Self::UnknownToken { .. } => ErrorKind::UnknownToken,
            Self::NotOwner { .. } => ErrorKind::NotOwner,
            Self::Settlement(_) => ErrorKind::Settlement,
            Self::Store(_) => ErrorKind::Store,
            Self::Canonicalization(_) => ErrorKind::Canonicalization,
        }
    }
}

impl From<PhaseError> for IssuanceError {
    fn from(e: PhaseError) -> Self {
        match e {
            PhaseError::AlreadyInitialized => Self::AlreadyInitialized,
            PhaseError::NotInitialized { .. } => Self::NotInitialized,
        }
    }
}

impl From<SettlementError> for IssuanceError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::InsufficientBalance {
                token,
                owner,
                available,
                required,
            } => Self::InsufficientAuthorization {
                payer: owner,
                token,
                shortfall: Shortfall::Balance,
                required,
                available,
            },
            SettlementError::InsufficientAllowance {
                token,
                owner,
                available,
                required,
                ..
            } => Self::InsufficientAuthorization {
                payer: owner,
                token,
                shortfall: Shortfall::Allowance,
                required,
                available,
            },
            other => Self::Settlement(other),
        }
    }
}
