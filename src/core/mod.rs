//! Core deterministic primitives.
//!
//! Pure functions only: hashing, roll derivation and edge/payout math.
//! Nothing in this module touches shared state.

pub mod edge;
pub mod hash;
pub mod rng;

// Re-export core functions
pub use edge::{house_edge, payout, payout_multiplier, theoretical_rtp};
pub use hash::{sha256_hex, CommitmentHash, RollDigest};
pub use rng::{derive_roll, random_hex_seed, roll_message};
