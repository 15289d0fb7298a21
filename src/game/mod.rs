//! Game logic: bets, nonces, rounds and table management.
//!
//! `round` and `nonce` carry the invariants; `epoch` layers seed rotation
//! and the audit log on top.

pub mod bet;
pub mod epoch;
pub mod identity;
pub mod nonce;
pub mod round;
pub mod simulate;
pub mod store;

pub use bet::{BetError, RoundInput, Target, Wager};
pub use epoch::{EpochError, EpochManager, PlayReceipt, RotationPolicy, TableId};
pub use identity::{IdentityError, PlayerIdentity};
pub use nonce::{CounterStore, NonceError, NonceSequencer, SequencerConfig, StoreError, SwapResult};
pub use round::{RoundEngine, RoundError, RoundOutcome};
pub use simulate::{simulate_rtp, RtpReport};
pub use store::{FileCounterStore, MemoryCounterStore};
