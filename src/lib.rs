//! # Fair Dice Engine
//!
//! Provably-fair dice rounds: commit to a server seed, derive each roll from
//! `(server_seed, client_seed, nonce)`, and let anyone re-verify afterwards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    FAIR DICE ENGINE                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Pure primitives                           │
//! │  ├── hash.rs     - SHA-256 / SHA-512 helpers                 │
//! │  ├── rng.rs      - Roll derivation from seeds + nonce        │
//! │  └── edge.rs     - House edge and payout math                │
//! │                                                              │
//! │  game/           - Rounds and state                          │
//! │  ├── bet.rs      - Validated target / wager                  │
//! │  ├── identity.rs - Player identity                           │
//! │  ├── nonce.rs    - Per-player nonce sequencing (CAS)         │
//! │  ├── store.rs    - Memory and file counter stores            │
//! │  ├── round.rs    - One round: validate, advance, roll, settle│
//! │  ├── epoch.rs    - Tables, seed rotation, audit log          │
//! │  └── simulate.rs - RTP simulation                            │
//! │                                                              │
//! │  proof/          - Verification                              │
//! │  ├── commitment.rs - Seed commitment and reveal              │
//! │  ├── verify.rs   - Re-verification from disclosed data       │
//! │  └── record.rs   - Audit log                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fairness Guarantee
//!
//! - The commitment (SHA-256 of the seed) is published before play
//! - Each player's nonce strictly increases and is persisted before the roll
//! - Rolls are a pure function of seed, client seed and nonce
//!
//! Given the disclosed seed, any party recomputes every roll exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod proof;

// Re-export commonly used types
pub use crate::config::EngineConfig;
pub use crate::core::edge::{house_edge, payout, payout_multiplier};
pub use crate::core::rng::derive_roll;
pub use crate::game::{
    EpochManager, FileCounterStore, MemoryCounterStore, NonceSequencer, PlayerIdentity,
    RotationPolicy, RoundEngine, RoundError, RoundOutcome,
};
pub use crate::proof::{verify_commitment, verify_outcome, verify_roll, CommitmentEpoch};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
