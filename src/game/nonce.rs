//! Nonce Sequencing
//!
//! Each player's nonce strictly increases: a round consumes `last + 1` and
//! persists it before the roll is derived. Advancement is a compare-and-swap
//! on the stored value, retried with bounded exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::game::identity::PlayerIdentity;

/// Result of a compare-and-swap on a stored counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapResult {
    /// Stored value matched and was replaced.
    Swapped,
    /// Stored value moved on; carries the value observed.
    Stale {
        /// Current stored value.
        current: u64,
    },
    /// No record for the identity.
    Missing,
}

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Durable monotonic counter keyed by player identity.
///
/// `compare_and_swap` must be atomic per key and durable before it
/// reports `Swapped`.
pub trait CounterStore: Send + Sync {
    /// Create a record at 0. Existing records are left untouched.
    /// Returns the current value.
    fn register(&self, identity: &PlayerIdentity) -> Result<u64, StoreError>;

    /// Last consumed value, or `None` for unregistered identities.
    fn load(&self, identity: &PlayerIdentity) -> Result<Option<u64>, StoreError>;

    /// Replace `expected` with `new` if the stored value still equals `expected`.
    fn compare_and_swap(
        &self,
        identity: &PlayerIdentity,
        expected: u64,
        new: u64,
    ) -> Result<SwapResult, StoreError>;
}

impl<S: CounterStore + ?Sized> CounterStore for Arc<S> {
    fn register(&self, identity: &PlayerIdentity) -> Result<u64, StoreError> {
        (**self).register(identity)
    }

    fn load(&self, identity: &PlayerIdentity) -> Result<Option<u64>, StoreError> {
        (**self).load(identity)
    }

    fn compare_and_swap(
        &self,
        identity: &PlayerIdentity,
        expected: u64,
        new: u64,
    ) -> Result<SwapResult, StoreError> {
        (**self).compare_and_swap(identity, expected, new)
    }
}

/// Nonce sequencing errors.
#[derive(Debug, Error)]
pub enum NonceError {
    /// Identity was never registered.
    #[error("unknown identity: {0}")]
    UnknownIdentity(PlayerIdentity),

    /// Lost the race on every attempt.
    #[error("nonce contention: gave up after {attempts} attempts")]
    Contention {
        /// Attempts made.
        attempts: u32,
    },

    /// Counter reached `u64::MAX`.
    #[error("nonce space exhausted for {0}")]
    Exhausted(PlayerIdentity),

    /// Backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Retry tuning for nonce advancement.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Compare-and-swap attempts before giving up.
    pub max_attempts: u32,
    /// First backoff delay.
    pub base_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 64,
            base_backoff: Duration::from_micros(50),
            max_backoff: Duration::from_millis(5),
        }
    }
}

impl SequencerConfig {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(16)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Hands out per-identity nonces over a `CounterStore`.
pub struct NonceSequencer<S> {
    store: S,
    config: SequencerConfig,
}

impl<S: CounterStore> NonceSequencer<S> {
    /// Create a sequencer over a store.
    pub fn new(store: S, config: SequencerConfig) -> Self {
        Self { store, config }
    }

    /// Register an identity (idempotent). Returns its last consumed nonce.
    pub fn register(&self, identity: &PlayerIdentity) -> Result<u64, NonceError> {
        let last = self.store.register(identity)?;
        debug!(player = %identity, last_nonce = last, "identity registered");
        Ok(last)
    }

    /// Last consumed nonce for an identity.
    pub fn last_for(&self, identity: &PlayerIdentity) -> Result<u64, NonceError> {
        self.store
            .load(identity)?
            .ok_or_else(|| NonceError::UnknownIdentity(identity.clone()))
    }

    /// Atomically consume and return the next nonce.
    pub fn next_for(&self, identity: &PlayerIdentity) -> Result<u64, NonceError> {
        let mut current = self.last_for(identity)?;

        for attempt in 0..self.config.max_attempts {
            let next = current
                .checked_add(1)
                .ok_or_else(|| NonceError::Exhausted(identity.clone()))?;

            match self.store.compare_and_swap(identity, current, next)? {
                SwapResult::Swapped => {
                    debug!(player = %identity, nonce = next, attempt, "nonce advanced");
                    return Ok(next);
                }
                SwapResult::Stale { current: observed } => {
                    current = observed;
                    std::thread::sleep(self.config.backoff(attempt));
                }
                SwapResult::Missing => {
                    return Err(NonceError::UnknownIdentity(identity.clone()));
                }
            }
        }

        warn!(
            player = %identity,
            attempts = self.config.max_attempts,
            "nonce advancement exhausted retries"
        );
        Err(NonceError::Contention {
            attempts: self.config.max_attempts,
        })
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Retry configuration.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::store::MemoryCounterStore;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn player(name: &str) -> PlayerIdentity {
        PlayerIdentity::parse(&format!("{name}@example.com")).unwrap()
    }

    fn sequencer() -> NonceSequencer<MemoryCounterStore> {
        NonceSequencer::new(MemoryCounterStore::new(), SequencerConfig::default())
    }

    #[test]
    fn test_sequential_nonces() {
        let seq = sequencer();
        let alice = player("alice");
        seq.register(&alice).unwrap();

        assert_eq!(seq.next_for(&alice).unwrap(), 1);
        assert_eq!(seq.next_for(&alice).unwrap(), 2);
        assert_eq!(seq.last_for(&alice).unwrap(), 2);
    }

    #[test]
    fn test_unknown_identity() {
        let seq = sequencer();
        let result = seq.next_for(&player("ghost"));
        assert!(matches!(result, Err(NonceError::UnknownIdentity(_))));
    }

    #[test]
    fn test_register_is_idempotent() {
        let seq = sequencer();
        let alice = player("alice");
        seq.register(&alice).unwrap();
        seq.next_for(&alice).unwrap();

        assert_eq!(seq.register(&alice).unwrap(), 1);
        assert_eq!(seq.next_for(&alice).unwrap(), 2);
    }

    #[test]
    fn test_identities_are_independent() {
        let seq = sequencer();
        let (alice, bob) = (player("alice"), player("bob"));
        seq.register(&alice).unwrap();
        seq.register(&bob).unwrap();

        seq.next_for(&alice).unwrap();
        seq.next_for(&alice).unwrap();
        assert_eq!(seq.next_for(&bob).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_nonces_have_no_gaps_or_duplicates() {
        let seq = Arc::new(sequencer());
        let alice = player("alice");
        seq.register(&alice).unwrap();

        let n = 48;
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let seq = Arc::clone(&seq);
                let alice = alice.clone();
                std::thread::spawn(move || seq.next_for(&alice).unwrap())
            })
            .collect();

        let nonces: BTreeSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(nonces, (1..=n).collect::<BTreeSet<u64>>());
    }

    /// Store that reports a stale value a fixed number of times.
    struct FlakyStore {
        inner: MemoryCounterStore,
        conflicts: AtomicU32,
    }

    impl CounterStore for FlakyStore {
        fn register(&self, identity: &PlayerIdentity) -> Result<u64, StoreError> {
            self.inner.register(identity)
        }

        fn load(&self, identity: &PlayerIdentity) -> Result<Option<u64>, StoreError> {
            self.inner.load(identity)
        }

        fn compare_and_swap(
            &self,
            identity: &PlayerIdentity,
            expected: u64,
            new: u64,
        ) -> Result<SwapResult, StoreError> {
            if self.conflicts.load(Ordering::SeqCst) > 0 {
                self.conflicts.fetch_sub(1, Ordering::SeqCst);
                return Ok(SwapResult::Stale { current: expected });
            }
            self.inner.compare_and_swap(identity, expected, new)
        }
    }

    #[test]
    fn test_retries_through_contention() {
        let store = FlakyStore {
            inner: MemoryCounterStore::new(),
            conflicts: AtomicU32::new(3),
        };
        let seq = NonceSequencer::new(store, SequencerConfig::default());
        let alice = player("alice");
        seq.register(&alice).unwrap();

        assert_eq!(seq.next_for(&alice).unwrap(), 1);
    }

    #[test]
    fn test_contention_exhausts() {
        let store = FlakyStore {
            inner: MemoryCounterStore::new(),
            conflicts: AtomicU32::new(u32::MAX),
        };
        let config = SequencerConfig {
            max_attempts: 4,
            base_backoff: Duration::from_micros(1),
            max_backoff: Duration::from_micros(10),
        };
        let seq = NonceSequencer::new(store, config);
        let alice = player("alice");
        seq.register(&alice).unwrap();

        let result = seq.next_for(&alice);
        assert!(matches!(result, Err(NonceError::Contention { attempts: 4 })));
        assert_eq!(seq.last_for(&alice).unwrap(), 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let config = SequencerConfig::default();
        assert_eq!(config.backoff(0), Duration::from_micros(50));
        assert_eq!(config.backoff(1), Duration::from_micros(100));
        assert_eq!(config.backoff(40), config.max_backoff);
    }
}
