//! Engine Configuration
//!
//! Read from environment variables, with defaults suitable for a local demo.

use std::path::PathBuf;
use std::time::Duration;

use crate::game::epoch::RotationPolicy;
use crate::game::nonce::SequencerConfig;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory for the durable nonce store. `None` keeps nonces in memory.
    pub data_dir: Option<PathBuf>,
    /// Server seed rotation policy.
    pub rotation: RotationPolicy,
    /// Nonce advancement retry tuning.
    pub sequencer: SequencerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            rotation: RotationPolicy::default(),
            sequencer: SequencerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// - `FAIR_DICE_DATA_DIR`: nonce store directory
    /// - `FAIR_DICE_ROTATION`: `every-round`, `manual` or `after:<n>`
    /// - `FAIR_DICE_MAX_RETRIES`: nonce CAS attempts
    /// - `FAIR_DICE_BACKOFF_MS`: backoff ceiling in milliseconds
    ///
    /// Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("FAIR_DICE_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let rotation = lookup("FAIR_DICE_ROTATION")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rotation);

        let max_attempts = lookup("FAIR_DICE_MAX_RETRIES")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.sequencer.max_attempts);

        let max_backoff = lookup("FAIR_DICE_BACKOFF_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.sequencer.max_backoff);

        Self {
            data_dir,
            rotation,
            sequencer: SequencerConfig {
                max_attempts,
                max_backoff,
                ..defaults.sequencer
            },
        }
    }

    /// Is the nonce store durable?
    pub fn is_durable(&self) -> bool {
        self.data_dir.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[]));
        assert!(config.data_dir.is_none());
        assert!(!config.is_durable());
        assert_eq!(config.rotation, RotationPolicy::EveryRound);
        assert_eq!(config.sequencer.max_attempts, 64);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FAIR_DICE_DATA_DIR", "/var/lib/dice"),
            ("FAIR_DICE_ROTATION", "after:25"),
            ("FAIR_DICE_MAX_RETRIES", "8"),
            ("FAIR_DICE_BACKOFF_MS", "20"),
        ]));
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/dice")));
        assert_eq!(config.rotation, RotationPolicy::AfterRounds(25));
        assert_eq!(config.sequencer.max_attempts, 8);
        assert_eq!(config.sequencer.max_backoff, Duration::from_millis(20));
        assert!(config.is_durable());
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("FAIR_DICE_DATA_DIR", "  "),
            ("FAIR_DICE_ROTATION", "whenever"),
            ("FAIR_DICE_MAX_RETRIES", "0"),
        ]));
        assert!(config.data_dir.is_none());
        assert_eq!(config.rotation, RotationPolicy::EveryRound);
        assert_eq!(config.sequencer.max_attempts, 64);
    }
}
