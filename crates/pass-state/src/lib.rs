//! # pass-state — Activity Phase Controller
//!
//! Holds the activity configuration (fee terms, trusted allowlist digest,
//! public-mode toggle, initialized flag) and derives the issuance mode from
//! it:
//!
//! ```text
//! Uninitialized ──initialize──▶ Restricted ◀──set_public_mode──▶ Open
//! ```
//!
//! The mode is never stored. It is recomputed from the configuration on
//! every read, so switching public mode off re-imposes the proof
//! requirement for the very next request.
//!
//! Authorization is not checked here; the engine checks its admin
//! capability before calling any mutating method.

pub mod activity;

pub use activity::{
    ActivityConfig, FeeTerms, Phase, PhaseChange, PhaseController, PhaseError,
    PhaseTransitionRecord,
};
