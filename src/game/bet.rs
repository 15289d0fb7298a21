//! Bet Input Validation
//!
//! `Target` and `Wager` can only be constructed from valid values, so every
//! downstream function can rely on the bounds without re-checking.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::edge::{self, MAX_TARGET, MIN_TARGET};

/// Bet validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BetError {
    /// Target outside `[1, 99]`.
    #[error("invalid target number {0}: must be between 1 and 99")]
    InvalidTarget(i64),

    /// Wager not a positive, finite number.
    #[error("invalid bet amount {0}: must be a positive number")]
    InvalidWager(f64),
}

/// Win threshold: the round wins when the roll is `<= target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Target(u8);

impl Target {
    /// Validate a raw target.
    pub fn new(raw: i64) -> Result<Self, BetError> {
        if (MIN_TARGET as i64..=MAX_TARGET as i64).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(BetError::InvalidTarget(raw))
        }
    }

    /// Raw threshold value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// House edge at this target.
    pub fn edge(self) -> f64 {
        edge::house_edge(self.0)
    }

    /// Payout multiplier at this target.
    pub fn multiplier(self) -> f64 {
        edge::payout_multiplier(self.0)
    }

    /// Does this roll win?
    pub fn wins(self, roll: u8) -> bool {
        roll <= self.0
    }
}

impl TryFrom<i64> for Target {
    type Error = BetError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Target> for u8 {
    fn from(target: Target) -> Self {
        target.0
    }
}

/// Positive, finite wager amount.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Wager(f64);

impl Wager {
    /// Validate a raw wager.
    pub fn new(raw: f64) -> Result<Self, BetError> {
        if raw.is_finite() && raw > 0.0 {
            Ok(Self(raw))
        } else {
            Err(BetError::InvalidWager(raw))
        }
    }

    /// Raw amount.
    pub fn get(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Wager {
    type Error = BetError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Wager> for f64 {
    fn from(wager: Wager) -> Self {
        wager.0
    }
}

/// Validated round input.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundInput {
    /// Win threshold.
    pub target: Target,
    /// Stake.
    pub wager: Wager,
}

impl RoundInput {
    /// Validate both fields; target is checked first.
    pub fn new(target: i64, wager: f64) -> Result<Self, BetError> {
        Ok(Self {
            target: Target::new(target)?,
            wager: Wager::new(wager)?,
        })
    }

    /// Payout if this round wins.
    pub fn winning_payout(&self) -> f64 {
        edge::payout(self.wager.get(), self.target.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_bounds() {
        assert!(Target::new(1).is_ok());
        assert!(Target::new(99).is_ok());
        assert_eq!(Target::new(0), Err(BetError::InvalidTarget(0)));
        assert_eq!(Target::new(100), Err(BetError::InvalidTarget(100)));
        assert_eq!(Target::new(-5), Err(BetError::InvalidTarget(-5)));
    }

    #[test]
    fn test_wager_bounds() {
        assert!(Wager::new(0.01).is_ok());
        assert!(Wager::new(0.0).is_err());
        assert!(Wager::new(-100.0).is_err());
        assert!(Wager::new(f64::NAN).is_err());
        assert!(Wager::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_target_wins() {
        let target = Target::new(50).unwrap();
        assert!(target.wins(1));
        assert!(target.wins(50));
        assert!(!target.wins(51));
        assert!(!target.wins(100));
    }

    #[test]
    fn test_round_input_checks_target_first() {
        assert_eq!(RoundInput::new(0, -1.0), Err(BetError::InvalidTarget(0)));
        assert!(matches!(RoundInput::new(50, -1.0), Err(BetError::InvalidWager(_))));
    }

    #[test]
    fn test_winning_payout() {
        let input = RoundInput::new(50, 100.0).unwrap();
        assert_eq!(input.winning_payout(), 198.0);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Target>("0").is_err());
        assert_eq!(serde_json::from_str::<Target>("42").unwrap().get(), 42);
        assert!(serde_json::from_str::<Wager>("-1.5").is_err());
    }
}
