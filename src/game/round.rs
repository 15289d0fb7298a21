//! Round Engine
//!
//! One round, in order:
//! 1. Validate target and wager (no side effects on failure)
//! 2. Resolve the identity and consume its next nonce (durable)
//! 3. Derive the roll from the epoch's seed
//! 4. Settle win/payout and return the auditable outcome
//!
//! Once the nonce is consumed the round always runs to completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::rng::{derive_roll, resolve_client_seed};
use crate::game::bet::{BetError, RoundInput, Target, Wager};
use crate::game::identity::PlayerIdentity;
use crate::game::nonce::{CounterStore, NonceError, NonceSequencer};
use crate::proof::commitment::CommitmentEpoch;

/// Completed round. Immutable and self-contained for later audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Player who placed the bet.
    pub player: PlayerIdentity,
    /// Epoch the round was played under (UUID string).
    pub epoch_id: String,
    /// Commitment published for that epoch.
    pub commitment: String,
    /// Server seed used, once disclosed.
    ///
    /// `None` while the epoch is still serving rounds: a live seed plus a
    /// known next nonce would let a player pick a winning client seed.
    pub server_seed: Option<String>,
    /// Client seed used (generated if the player supplied none).
    pub client_seed: String,
    /// Nonce consumed by this round.
    pub nonce: u64,
    /// Roll in `[1, 100]`.
    pub number: u8,
    /// Win threshold.
    pub target: Target,
    /// Stake.
    pub wager: Wager,
    /// Did the roll land at or under the target?
    pub win: bool,
    /// Amount paid out (0.0 on a loss).
    pub payout: f64,
    /// Multiplier in force for the target.
    pub multiplier: f64,
    /// House edge in force for the target.
    pub edge: f64,
    /// When the round settled.
    pub played_at: DateTime<Utc>,
}

/// Round errors.
#[derive(Debug, Error)]
pub enum RoundError {
    /// Target outside `[1, 99]`.
    #[error("invalid target number {0}: must be between 1 and 99")]
    InvalidTarget(i64),

    /// Wager not positive.
    #[error("invalid bet amount {0}: must be a positive number")]
    InvalidWager(f64),

    /// Identity not registered.
    #[error("player {0} not found or not verified")]
    UnknownIdentity(PlayerIdentity),

    /// Nonce advancement failed (contention exhausted or store failure).
    #[error("nonce sequencer failure: {0}")]
    Sequencer(#[source] NonceError),
}

impl RoundError {
    /// True for errors caused by the player's input (safe to show as-is).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTarget(_) | Self::InvalidWager(_) | Self::UnknownIdentity(_)
        )
    }
}

impl From<BetError> for RoundError {
    fn from(e: BetError) -> Self {
        match e {
            BetError::InvalidTarget(t) => Self::InvalidTarget(t),
            BetError::InvalidWager(w) => Self::InvalidWager(w),
        }
    }
}

impl From<NonceError> for RoundError {
    fn from(e: NonceError) -> Self {
        match e {
            NonceError::UnknownIdentity(id) => Self::UnknownIdentity(id),
            other => Self::Sequencer(other),
        }
    }
}

/// Plays rounds against an explicit commitment epoch.
///
/// Holds no secret of its own; the caller passes the epoch in.
/// Outcomes carry the epoch's seed, so an epoch must not serve another
/// round once an outcome has left the engine. `EpochManager` enforces this.
pub struct RoundEngine<S> {
    sequencer: NonceSequencer<S>,
}

impl<S: CounterStore> RoundEngine<S> {
    /// Create an engine over a nonce sequencer.
    pub fn new(sequencer: NonceSequencer<S>) -> Self {
        Self { sequencer }
    }

    /// Nonce sequencer in use.
    pub fn sequencer(&self) -> &NonceSequencer<S> {
        &self.sequencer
    }

    /// Register a player (idempotent). Returns the last consumed nonce.
    pub fn register(&self, identity: &PlayerIdentity) -> Result<u64, RoundError> {
        Ok(self.sequencer.register(identity)?)
    }

    /// Validate raw input and play one round.
    pub fn play(
        &self,
        epoch: &CommitmentEpoch,
        identity: &PlayerIdentity,
        client_seed: Option<&str>,
        target: i64,
        wager: f64,
    ) -> Result<RoundOutcome, RoundError> {
        let input = RoundInput::new(target, wager).map_err(|e| {
            debug!(player = %identity, error = %e, "bet rejected");
            e
        })?;
        self.play_input(epoch, identity, client_seed, input)
    }

    /// Play one round with pre-validated input.
    pub fn play_input(
        &self,
        epoch: &CommitmentEpoch,
        identity: &PlayerIdentity,
        client_seed: Option<&str>,
        input: RoundInput,
    ) -> Result<RoundOutcome, RoundError> {
        let client_seed = resolve_client_seed(client_seed);

        // Committed before the roll exists; never reusable after this point
        let nonce = self.sequencer.next_for(identity)?;

        let number = derive_roll(epoch.seed().expose(), &client_seed, nonce);
        let win = input.target.wins(number);
        let payout = if win { input.winning_payout() } else { 0.0 };

        info!(
            player = %identity,
            commitment = %epoch.commitment(),
            nonce,
            number,
            target = input.target.get(),
            win,
            payout,
            "round settled"
        );

        Ok(RoundOutcome {
            player: identity.clone(),
            epoch_id: epoch.id_string(),
            commitment: epoch.commitment().to_string(),
            server_seed: Some(epoch.seed().expose().to_string()),
            client_seed,
            nonce,
            number,
            target: input.target,
            wager: input.wager,
            win,
            payout,
            multiplier: input.target.multiplier(),
            edge: input.target.edge(),
            played_at: Utc::now(),
        })
    }
}
