//! Audit Log
//!
//! Append-only record of settled rounds and retired-epoch reveals.
//! Everything needed to re-verify a round is kept together, so an auditor
//! can work from an exported log alone.

use serde::{Deserialize, Serialize};

use crate::game::identity::PlayerIdentity;
use crate::game::round::RoundOutcome;
use crate::proof::commitment::EpochReveal;
use crate::proof::verify::{verify_epoch_rounds, VerificationError};

/// Current audit log format version.
pub const AUDIT_LOG_VERSION: u8 = 1;

/// Rounds and reveals in settlement order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditLog {
    /// Version for forward compatibility.
    pub version: u8,

    /// Settled rounds.
    pub rounds: Vec<RoundOutcome>,

    /// Reveals of retired epochs.
    pub reveals: Vec<EpochReveal>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            version: AUDIT_LOG_VERSION,
            rounds: Vec::new(),
            reveals: Vec::new(),
        }
    }

    /// Append a settled round.
    pub fn record_round(&mut self, outcome: RoundOutcome) {
        self.rounds.push(outcome);
    }

    /// Append an epoch reveal and disclose its seed on the epoch's rounds.
    pub fn record_reveal(&mut self, reveal: EpochReveal) {
        for round in self
            .rounds
            .iter_mut()
            .filter(|r| r.epoch_id == reveal.epoch_id && r.server_seed.is_none())
        {
            round.server_seed = Some(reveal.server_seed.clone());
        }
        self.reveals.push(reveal);
    }

    /// Rounds played by one player.
    pub fn rounds_for<'a>(
        &'a self,
        player: &'a PlayerIdentity,
    ) -> impl Iterator<Item = &'a RoundOutcome> + 'a {
        self.rounds.iter().filter(move |r| &r.player == player)
    }

    /// Rounds played under one epoch.
    pub fn rounds_in_epoch<'a>(
        &'a self,
        epoch_id: &'a str,
    ) -> impl Iterator<Item = &'a RoundOutcome> + 'a {
        self.rounds.iter().filter(move |r| r.epoch_id == epoch_id)
    }

    /// Reveal for an epoch, if it has been retired.
    pub fn reveal_for(&self, epoch_id: &str) -> Option<&EpochReveal> {
        self.reveals.iter().find(|r| r.epoch_id == epoch_id)
    }

    /// Re-verify every round whose epoch has been revealed.
    ///
    /// Returns `(epoch_id, nonce, error)` for each failing round.
    pub fn audit(&self) -> Vec<(String, u64, VerificationError)> {
        self.reveals
            .iter()
            .flat_map(|reveal| {
                verify_epoch_rounds(reveal, self.rounds_in_epoch(&reveal.epoch_id))
                    .into_iter()
                    .map(move |(nonce, e)| (reveal.epoch_id.clone(), nonce, e))
            })
            .collect()
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
