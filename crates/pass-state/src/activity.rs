//! # Activity Configuration and Phase Transitions
//!
//! `initialize` flips the activity from Uninitialized to Restricted exactly
//! once. After that only the trusted digest, the fee terms, and the public
//! mode toggle change, each through its own method. Every change returns a
//! timestamped [`PhaseTransitionRecord`]; keeping the history is up to the
//! caller, so the stored controller stays the size of its configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pass_core::{Amount, Currency, Hash32, Timestamp};

// ─── Phase ───────────────────────────────────────────────────────────

/// Which issuance path is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Not yet initialized. Every issuance request fails.
    Uninitialized,
    /// Issuance requires a membership proof against the trusted digest.
    Restricted,
    /// Any identity not yet in the ledger may issue once, without proof.
    Open,
}

impl Phase {
    /// Whether issuance requests can proceed at all.
    pub fn accepts_requests(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Whether a membership proof is checked.
    pub fn requires_proof(&self) -> bool {
        matches!(self, Self::Restricted)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Restricted => "RESTRICTED",
            Self::Open => "OPEN",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Configuration change rejected by the phase controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    /// `initialize` was called a second time.
    #[error("activity already initialized")]
    AlreadyInitialized,

    /// A post-initialization change was attempted first.
    #[error("activity not initialized: cannot {operation}")]
    NotInitialized {
        /// The rejected operation.
        operation: &'static str,
    },
}

// ─── Configuration ───────────────────────────────────────────────────

/// What one issuance costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTerms {
    pub currency: Currency,
    pub amount: Amount,
}

impl FeeTerms {
    /// No charge.
    pub const FREE: FeeTerms = FeeTerms {
        currency: Currency::Native,
        amount: Amount::ZERO,
    };

    pub fn new(currency: Currency, amount: Amount) -> Self {
        Self { currency, amount }
    }

    /// Whether settlement runs at all. A zero amount skips it whatever the
    /// currency.
    pub fn is_charged(&self) -> bool {
        !self.amount.is_zero()
    }
}

impl std::fmt::Display for FeeTerms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// The activity configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub fee: FeeTerms,
    pub trusted_digest: Hash32,
    pub public_mode: bool,
    pub initialized: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            fee: FeeTerms::FREE,
            trusted_digest: Hash32::ZERO,
            public_mode: false,
            initialized: false,
        }
    }
}

impl ActivityConfig {
    /// Derive the issuance mode.
    pub fn phase(&self) -> Phase {
        match (self.initialized, self.public_mode) {
            (false, _) => Phase::Uninitialized,
            (true, false) => Phase::Restricted,
            (true, true) => Phase::Open,
        }
    }
}

// ─── Transition Records ──────────────────────────────────────────────

/// Which configuration change a record describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum PhaseChange {
    Initialized { fee: FeeTerms, digest: Hash32 },
    DigestUpdated { previous: Hash32, digest: Hash32 },
    PublicModeSet { enabled: bool },
    FeeChanged { previous: FeeTerms, fee: FeeTerms },
}

/// One applied configuration change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransitionRecord {
    pub from_phase: Phase,
    pub to_phase: Phase,
    #[serde(flatten)]
    pub change: PhaseChange,
    pub timestamp: Timestamp,
}

// ─── Controller ──────────────────────────────────────────────────────

/// Applies configuration changes and derives the phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseController {
    config: ActivityConfig,
}

impl PhaseController {
    /// An uninitialized activity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    /// Current mode, derived from the configuration.
    pub fn phase(&self) -> Phase {
        self.config.phase()
    }

    /// Fee terms in force right now.
    pub fn fee(&self) -> FeeTerms {
        self.config.fee
    }

    pub fn trusted_digest(&self) -> Hash32 {
        self.config.trusted_digest
    }

    /// Set the fee terms and trusted digest and open Restricted issuance.
    /// Only succeeds once.
    pub fn initialize(
        &mut self,
        currency: Currency,
        amount: Amount,
        digest: Hash32,
    ) -> Result<PhaseTransitionRecord, PhaseError> {
        if self.config.initialized {
            return Err(PhaseError::AlreadyInitialized);
        }
        let fee = FeeTerms::new(currency, amount);
        Ok(self.apply(PhaseChange::Initialized { fee, digest }, |c| {
            c.fee = fee;
            c.trusted_digest = digest;
            c.initialized = true;
        }))
    }

    /// Replace the trusted allowlist digest.
    pub fn update_digest(&mut self, digest: Hash32) -> Result<PhaseTransitionRecord, PhaseError> {
        self.require_initialized("update digest")?;
        let previous = self.config.trusted_digest;
        Ok(self.apply(PhaseChange::DigestUpdated { previous, digest }, |c| {
            c.trusted_digest = digest;
        }))
    }

    /// Toggle between Open and Restricted.
    pub fn set_public_mode(&mut self, enabled: bool) -> Result<PhaseTransitionRecord, PhaseError> {
        self.require_initialized("set public mode")?;
        Ok(self.apply(PhaseChange::PublicModeSet { enabled }, |c| {
            c.public_mode = enabled;
        }))
    }

    /// Replace the fee terms. Takes effect for the next request.
    pub fn set_fee(
        &mut self,
        currency: Currency,
        amount: Amount,
    ) -> Result<PhaseTransitionRecord, PhaseError> {
        self.require_initialized("change fee")?;
        let previous = self.config.fee;
        let fee = FeeTerms::new(currency, amount);
        Ok(self.apply(PhaseChange::FeeChanged { previous, fee }, |c| {
            c.fee = fee;
        }))
    }

    fn require_initialized(&self, operation: &'static str) -> Result<(), PhaseError> {
        if self.config.initialized {
            Ok(())
        } else {
            Err(PhaseError::NotInitialized { operation })
        }
    }

    fn apply(
        &mut self,
        change: PhaseChange,
        mutate: impl FnOnce(&mut ActivityConfig),
    ) -> PhaseTransitionRecord {
        let from_phase = self.phase();
        mutate(&mut self.config);
        PhaseTransitionRecord {
            from_phase,
            to_phase: self.phase(),
            change,
            timestamp: Timestamp::now(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pass_core::Address;

    fn digest(b: u8) -> Hash32 {
        Hash32::from_bytes([b; 32])
    }

    fn token() -> Currency {
        Currency::Token(Address::from_bytes([0x5f; 20]))
    }

    fn initialized() -> PhaseController {
        let mut pc = PhaseController::new();
        pc.initialize(Currency::Native, Amount::new(1), digest(1)).unwrap();
        pc
    }

    #[test]
    fn new_controller_is_uninitialized() {
        let pc = PhaseController::new();
        assert_eq!(pc.phase(), Phase::Uninitialized);
        assert!(!pc.phase().accepts_requests());
    }

    #[test]
    fn initialize_enters_restricted() {
        let mut pc = PhaseController::new();
        let rec = pc.initialize(Currency::Native, Amount::new(1), digest(1)).unwrap();
        assert_eq!(rec.from_phase, Phase::Uninitialized);
        assert_eq!(rec.to_phase, Phase::Restricted);
        assert_eq!(pc.phase(), Phase::Restricted);
        assert!(pc.phase().requires_proof());
        assert_eq!(pc.trusted_digest(), digest(1));
        assert_eq!(pc.fee(), FeeTerms::new(Currency::Native, Amount::new(1)));
    }

    #[test]
    fn initialize_twice_fails_and_keeps_config() {
        let mut pc = initialized();
        let err = pc.initialize(token(), Amount::new(9), digest(9)).unwrap_err();
        assert_eq!(err, PhaseError::AlreadyInitialized);
        assert_eq!(pc.trusted_digest(), digest(1));
        assert_eq!(pc.fee().currency, Currency::Native);
    }

    #[test]
    fn changes_before_initialize_are_rejected() {
        let mut pc = PhaseController::new();
        assert!(matches!(
            pc.update_digest(digest(2)),
            Err(PhaseError::NotInitialized { operation: "update digest" })
        ));
        assert!(pc.set_public_mode(true).is_err());
        assert!(pc.set_fee(token(), Amount::new(5)).is_err());
        assert_eq!(pc.phase(), Phase::Uninitialized);
    }

    #[test]
    fn public_mode_toggles_open_and_back() {
        let mut pc = initialized();
        pc.set_public_mode(true).unwrap();
        assert_eq!(pc.phase(), Phase::Open);
        assert!(!pc.phase().requires_proof());
        let last = pc.set_public_mode(false).unwrap();
        assert_eq!(pc.phase(), Phase::Restricted);
        assert_eq!(last.from_phase, Phase::Open);
        assert_eq!(last.to_phase, Phase::Restricted);
    }

    #[test]
    fn digest_update_records_previous() {
        let mut pc = initialized();
        let rec = pc.update_digest(digest(2)).unwrap();
        assert_eq!(
            rec.change,
            PhaseChange::DigestUpdated { previous: digest(1), digest: digest(2) }
        );
        assert_eq!(pc.trusted_digest(), digest(2));
        assert_eq!(pc.phase(), Phase::Restricted);
    }

    #[test]
    fn fee_change_applies_immediately() {
        let mut pc = initialized();
        pc.set_fee(token(), Amount::new(10)).unwrap();
        assert_eq!(pc.fee().currency, token());
        assert!(pc.fee().is_charged());
        pc.set_fee(token(), Amount::ZERO).unwrap();
        assert!(!pc.fee().is_charged());
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Uninitialized.to_string(), "UNINITIALIZED");
        assert_eq!(Phase::Open.to_string(), "OPEN");
    }

    #[test]
    fn stored_form_does_not_grow_with_changes() {
        let mut pc = initialized();
        let before = serde_json::to_vec(&pc).unwrap().len();
        for i in 0..500 {
            pc.set_public_mode(i % 2 == 0).unwrap();
        }
        pc.set_public_mode(false).unwrap();
        let json = serde_json::to_vec(&pc).unwrap();
        assert_eq!(json.len(), before);
        let back: PhaseController = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, pc);
    }

    #[test]
    fn record_serializes_change_tag() {
        let mut pc = initialized();
        let rec = pc.set_public_mode(true).unwrap();
        let json = serde_json::to_string(&rec).unwrap();
        assert!(json.contains("\"change\":\"public_mode_set\""));
    }
}
