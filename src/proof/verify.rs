//! Verification API
//!
//! Recompute rolls from disclosed inputs and check them against claims.
//! Depends only on pure functions, so it runs against historical data
//! without any live engine state.

use thiserror::Error;

use crate::core::edge::payout;
use crate::core::hash::hex_eq;
use crate::core::rng::derive_roll;
use crate::game::round::RoundOutcome;
use crate::proof::commitment::{commitment_of, EpochReveal};

/// Verification failures, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationError {
    /// Outcome does not carry its seed yet (epoch still live).
    #[error("server seed not yet disclosed")]
    SeedUndisclosed,

    /// Disclosed seed does not hash to the published commitment.
    #[error("server seed does not match commitment: expected {expected}, computed {computed}")]
    CommitmentMismatch {
        /// Published commitment.
        expected: String,
        /// Commitment computed from the disclosed seed.
        computed: String,
    },

    /// Recomputed roll differs from the claimed roll.
    #[error("roll mismatch: claimed {claimed}, computed {computed}")]
    RollMismatch {
        /// Roll in the record.
        claimed: u8,
        /// Roll recomputed from the seeds and nonce.
        computed: u8,
    },

    /// Win flag inconsistent with roll and target.
    #[error("win flag mismatch: claimed {claimed}, expected {expected}")]
    WinMismatch {
        /// Flag in the record.
        claimed: bool,
        /// Flag implied by roll and target.
        expected: bool,
    },

    /// Payout inconsistent with wager, target and win flag.
    #[error("payout mismatch: claimed {claimed}, expected {expected}")]
    PayoutMismatch {
        /// Payout in the record.
        claimed: f64,
        /// Payout implied by the rules.
        expected: f64,
    },
}

/// Recompute a roll and compare it with the claimed number.
pub fn verify_roll(server_seed: &str, client_seed: &str, nonce: u64, claimed: u8) -> bool {
    derive_roll(server_seed, client_seed, nonce) == claimed
}

/// Check that a disclosed seed matches a previously published commitment.
///
/// Without this, roll verification only proves self-consistency, not that
/// the seed was fixed before the player's input.
pub fn verify_commitment(server_seed: &str, commitment: &str) -> Result<(), VerificationError> {
    let computed = commitment_of(server_seed);
    if hex_eq(&computed, commitment) {
        Ok(())
    } else {
        Err(VerificationError::CommitmentMismatch {
            expected: commitment.to_string(),
            computed,
        })
    }
}

/// Fully audit a round outcome against the commitment the player saw.
///
/// Checks commitment, roll, win flag and payout, failing on the first
/// mismatch.
pub fn verify_outcome(
    outcome: &RoundOutcome,
    published_commitment: &str,
) -> Result<(), VerificationError> {
    let server_seed = outcome
        .server_seed
        .as_deref()
        .ok_or(VerificationError::SeedUndisclosed)?;
    verify_commitment(server_seed, published_commitment)?;

    let computed = derive_roll(server_seed, &outcome.client_seed, outcome.nonce);
    if computed != outcome.number {
        return Err(VerificationError::RollMismatch {
            claimed: outcome.number,
            computed,
        });
    }

    let expected_win = outcome.target.wins(computed);
    if expected_win != outcome.win {
        return Err(VerificationError::WinMismatch {
            claimed: outcome.win,
            expected: expected_win,
        });
    }

    let expected_payout = if expected_win {
        payout(outcome.wager.get(), outcome.target.get())
    } else {
        0.0
    };
    if expected_payout != outcome.payout {
        return Err(VerificationError::PayoutMismatch {
            claimed: outcome.payout,
            expected: expected_payout,
        });
    }

    Ok(())
}

/// Audit a batch of historical rounds against an epoch reveal.
///
/// Returns the nonces of rounds that fail, paired with the reason.
pub fn verify_epoch_rounds<'a>(
    reveal: &EpochReveal,
    rounds: impl IntoIterator<Item = &'a RoundOutcome>,
) -> Vec<(u64, VerificationError)> {
    rounds
        .into_iter()
        .filter(|round| round.epoch_id == reveal.epoch_id)
        .filter_map(|round| {
            let mut disclosed = round.clone();
            disclosed.server_seed = Some(reveal.server_seed.clone());
            verify_outcome(&disclosed, &reveal.commitment)
                .err()
                .map(|e| (round.nonce, e))
        })
        .collect()
}
