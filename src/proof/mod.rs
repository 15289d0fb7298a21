//! Provable Fairness
//!
//! Lets any party check a round after the fact:
//! - Server seed commitment before play
//! - Reveal when an epoch is retired
//! - Roll and settlement re-verification from disclosed data
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  commitment.rs   - Seed generation, commitment, reveal      │
//! │  verify.rs       - Roll / commitment / settlement checks    │
//! │  record.rs       - Append-only audit log                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod record;
pub mod verify;

// Re-export key types
pub use commitment::{commitment_of, CommitmentEpoch, EpochId, EpochReveal, ServerSeed};
pub use record::AuditLog;
pub use verify::{
    verify_commitment, verify_epoch_rounds, verify_outcome, verify_roll, VerificationError,
};
