//! Server Seed Commitment Protocol
//!
//! Commit to the server seed before any round is played.
//! Reveal it later so players can check nothing was changed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::hash::{hex_eq, sha256_hex};
use crate::core::rng::random_hex_seed;

/// Commitment epoch identifier (UUID bytes).
pub type EpochId = [u8; 16];

/// Secret server seed (hex rendering of 32 random bytes).
///
/// `Debug` is redacted so the seed never ends up in logs by accident.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerSeed(String);

impl ServerSeed {
    /// Generate a fresh seed from OS entropy.
    pub fn generate() -> Self {
        Self(random_hex_seed())
    }

    /// Wrap a previously generated or disclosed seed.
    pub fn from_hex(seed: impl Into<String>) -> Self {
        Self(seed.into())
    }

    /// The seed as it enters hashes and roll messages.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Commitment for this seed.
    pub fn commitment(&self) -> String {
        commitment_of(&self.0)
    }
}

impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServerSeed(<redacted>)")
    }
}

/// Compute the commitment of a seed: lowercase hex SHA-256 of its hex string.
pub fn commitment_of(seed_hex: &str) -> String {
    sha256_hex(seed_hex.as_bytes())
}

/// A committed server seed, valid for a bounded series of rounds.
///
/// The commitment is published before players submit client seeds.
/// Immutable once created; safe to share behind an `Arc`.
#[derive(Clone, Debug)]
pub struct CommitmentEpoch {
    id: EpochId,
    seed: ServerSeed,
    commitment: String,
    created_at: DateTime<Utc>,
}

impl CommitmentEpoch {
    /// Open a new epoch with a fresh seed.
    pub fn create() -> Self {
        Self::with_seed(uuid::Uuid::new_v4().into_bytes(), ServerSeed::generate())
    }

    /// Open an epoch with a known seed under a given id.
    pub fn with_seed(id: EpochId, seed: ServerSeed) -> Self {
        let commitment = seed.commitment();
        Self {
            id,
            seed,
            commitment,
            created_at: Utc::now(),
        }
    }

    /// Epoch identifier.
    pub fn id(&self) -> EpochId {
        self.id
    }

    /// Epoch identifier as a UUID string.
    pub fn id_string(&self) -> String {
        uuid::Uuid::from_bytes(self.id).to_string()
    }

    /// Published commitment (safe to show players).
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// The secret seed. Only disclose via outcomes or reveals.
    pub fn seed(&self) -> &ServerSeed {
        &self.seed
    }

    /// When the epoch was opened.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check a disclosed seed against this epoch's commitment.
    pub fn matches(&self, seed_hex: &str) -> bool {
        hex_eq(&commitment_of(seed_hex), &self.commitment)
    }

    /// Build the reveal published when the epoch is retired.
    pub fn reveal(&self, rounds_played: u64) -> EpochReveal {
        EpochReveal {
            epoch_id: self.id_string(),
            server_seed: self.seed.expose().to_string(),
            commitment: self.commitment.clone(),
            rounds_played,
            created_at: self.created_at,
            revealed_at: Utc::now(),
        }
    }
}

/// Reveal structure (published after the epoch is retired).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochReveal {
    /// Epoch identifier (UUID string).
    pub epoch_id: String,
    /// The disclosed server seed.
    pub server_seed: String,
    /// Commitment published when the epoch opened.
    pub commitment: String,
    /// Rounds played under this seed.
    pub rounds_played: u64,
    /// When the epoch was opened.
    pub created_at: DateTime<Utc>,
    /// When the seed was disclosed.
    pub revealed_at: DateTime<Utc>,
}

impl EpochReveal {
    /// Verify the disclosed seed hashes to the published commitment.
    pub fn is_consistent(&self) -> bool {
        hex_eq(&commitment_of(&self.server_seed), &self.commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_known_value() {
        let seed = "a".repeat(64);
        assert_eq!(
            commitment_of(&seed),
            "ffe054fe7ae0cb6dc65c3af9b61d5209f439851db43d0ba5997337df154668eb"
        );
    }

    #[test]
    fn test_epoch_creation() {
        let epoch = CommitmentEpoch::create();

        assert_eq!(epoch.seed().expose().len(), 64);
        assert_eq!(epoch.commitment().len(), 64);
        assert!(epoch.matches(epoch.seed().expose()));
    }

    #[test]
    fn test_epochs_are_independent() {
        let a = CommitmentEpoch::create();
        let b = CommitmentEpoch::create();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.commitment(), b.commitment());
    }

    #[test]
    fn test_wrong_seed_fails() {
        let epoch = CommitmentEpoch::create();
        let mut wrong = epoch.seed().expose().to_string();
        wrong.replace_range(0..1, if wrong.starts_with('0') { "1" } else { "0" });

        assert!(!epoch.matches(&wrong));
    }

    #[test]
    fn test_debug_redacts_seed() {
        let seed = ServerSeed::from_hex("deadbeef");
        let rendered = format!("{:?}", seed);
        assert!(!rendered.contains("deadbeef"));

        let epoch = CommitmentEpoch::with_seed([1; 16], seed);
        assert!(!format!("{:?}", epoch).contains("deadbeef"));
    }

    #[test]
    fn test_reveal_consistency() {
        let epoch = CommitmentEpoch::create();
        let reveal = epoch.reveal(3);

        assert_eq!(reveal.rounds_played, 3);
        assert_eq!(reveal.epoch_id, epoch.id_string());
        assert!(reveal.is_consistent());

        let mut tampered = reveal.clone();
        tampered.server_seed = "b".repeat(64);
        assert!(!tampered.is_consistent());
    }
}
