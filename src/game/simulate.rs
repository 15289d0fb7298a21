//! Return-to-Player Simulation
//!
//! Plays real rounds through the engine and compares observed RTP and win
//! rate against the theoretical values for the target.

use serde::Serialize;

use crate::core::edge::{theoretical_rtp, win_probability};
use crate::game::bet::RoundInput;
use crate::game::identity::PlayerIdentity;
use crate::game::nonce::CounterStore;
use crate::game::round::{RoundEngine, RoundError};
use crate::proof::commitment::CommitmentEpoch;

/// Aggregate statistics over a simulated run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RtpReport {
    /// Target every round was played at.
    pub target: u8,
    /// Rounds played.
    pub rounds: u64,
    /// Rounds won.
    pub wins: u64,
    /// Sum of wagers.
    pub total_wagered: f64,
    /// Sum of payouts.
    pub total_returned: f64,
    /// Longest run of consecutive wins.
    pub max_win_streak: u64,
    /// Longest run of consecutive losses.
    pub max_loss_streak: u64,
}

impl RtpReport {
    /// Observed return to player (payouts / wagers).
    pub fn rtp(&self) -> f64 {
        if self.total_wagered == 0.0 {
            0.0
        } else {
            self.total_returned / self.total_wagered
        }
    }

    /// Observed win rate.
    pub fn win_rate(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.wins as f64 / self.rounds as f64
        }
    }

    /// Expected RTP for the target.
    pub fn theoretical_rtp(&self) -> f64 {
        theoretical_rtp(self.target)
    }

    /// Expected win rate for the target.
    pub fn expected_win_rate(&self) -> f64 {
        win_probability(self.target)
    }
}

/// Streak tracker.
#[derive(Default)]
struct Streak {
    last_win: Option<bool>,
    length: u64,
}

impl Streak {
    fn push(&mut self, win: bool, report: &mut RtpReport) {
        if self.last_win == Some(win) {
            self.length += 1;
        } else {
            self.last_win = Some(win);
            self.length = 1;
        }

        let best = if win {
            &mut report.max_win_streak
        } else {
            &mut report.max_loss_streak
        };
        *best = (*best).max(self.length);
    }
}

/// Play `rounds` rounds at one target and wager.
///
/// Consumes real nonces from the player's sequence.
pub fn simulate_rtp<S: CounterStore>(
    engine: &RoundEngine<S>,
    epoch: &CommitmentEpoch,
    identity: &PlayerIdentity,
    client_seed: &str,
    input: RoundInput,
    rounds: u64,
) -> Result<RtpReport, RoundError> {
    let mut report = RtpReport {
        target: input.target.get(),
        ..Default::default()
    };
    let mut streak = Streak::default();

    for _ in 0..rounds {
        let outcome = engine.play_input(epoch, identity, Some(client_seed), input)?;

        report.rounds += 1;
        report.total_wagered += input.wager.get();
        report.total_returned += outcome.payout;
        if outcome.win {
            report.wins += 1;
        }
        streak.push(outcome.win, &mut report);
    }

    Ok(report)
}
