//! Table and Epoch Management
//!
//! A table is a long-lived handle players bet against. Each table holds one
//! live `CommitmentEpoch`; when the rotation policy fires, the epoch is
//! retired, its seed revealed into the audit log, and a fresh commitment
//! takes its place. Tables are independent and run in parallel.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::game::identity::PlayerIdentity;
use crate::game::nonce::CounterStore;
use crate::game::round::{RoundEngine, RoundError, RoundOutcome};
use crate::proof::commitment::{CommitmentEpoch, EpochReveal};
use crate::proof::record::AuditLog;

/// Table identifier (UUID bytes).
pub type TableId = [u8; 16];

/// When a table's server seed is retired and revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationPolicy {
    /// New seed after every round (each outcome already discloses its seed).
    #[default]
    EveryRound,
    /// New seed after this many rounds.
    AfterRounds(u64),
    /// Only on explicit `rotate`.
    Manual,
}

impl RotationPolicy {
    /// Should an epoch that has served `rounds` rounds be retired?
    pub fn should_rotate(self, rounds: u64) -> bool {
        match self {
            Self::EveryRound => rounds >= 1,
            Self::AfterRounds(limit) => rounds >= limit.max(1),
            Self::Manual => false,
        }
    }
}

impl fmt::Display for RotationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EveryRound => write!(f, "every-round"),
            Self::AfterRounds(n) => write!(f, "after:{}", n),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for RotationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "every-round" => Ok(Self::EveryRound),
            "manual" => Ok(Self::Manual),
            other => other
                .strip_prefix("after:")
                .and_then(|n| n.parse::<u64>().ok())
                .filter(|&n| n > 0)
                .map(Self::AfterRounds)
                .ok_or_else(|| format!("unknown rotation policy: {other:?}")),
        }
    }
}

/// Epoch and table errors.
#[derive(Debug, Error)]
pub enum EpochError {
    /// No table with this id.
    #[error("unknown table {0}")]
    UnknownTable(String),

    /// Round failed.
    #[error(transparent)]
    Round(#[from] RoundError),

    /// Round task panicked or was cancelled.
    #[error("round task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a round played through the manager.
#[derive(Debug, Clone)]
pub struct PlayReceipt {
    /// The settled round.
    pub outcome: RoundOutcome,
    /// Commitment that applies to the table's next round.
    pub next_commitment: String,
    /// Reveal of the epoch retired by this round, if the policy fired.
    pub rotated: Option<EpochReveal>,
}

/// Live state of one table.
struct TableSlot {
    epoch: Arc<CommitmentEpoch>,
    rounds: u64,
    closed: bool,
}

impl TableSlot {
    fn fresh() -> Self {
        Self {
            epoch: Arc::new(CommitmentEpoch::create()),
            rounds: 0,
            closed: false,
        }
    }

    /// Retire the live epoch and open a new one.
    fn rotate(&mut self) -> EpochReveal {
        let reveal = self.epoch.reveal(self.rounds);
        *self = Self::fresh();
        reveal
    }
}

fn table_name(id: &TableId) -> String {
    uuid::Uuid::from_bytes(*id).to_string()
}

/// Play, rotate and record one round while holding the table.
///
/// The nonce store call runs on the blocking pool since backends may fsync.
#[allow(clippy::too_many_arguments)]
async fn settle_round<S: CounterStore + 'static>(
    engine: Arc<RoundEngine<S>>,
    audit: Arc<RwLock<AuditLog>>,
    policy: RotationPolicy,
    table: TableId,
    slot: Arc<Mutex<TableSlot>>,
    player: PlayerIdentity,
    client_seed: Option<String>,
    target: i64,
    wager: f64,
) -> Result<PlayReceipt, EpochError> {
    let mut slot = slot.lock().await;
    // Lost a race with close_table; the epoch is already revealed
    if slot.closed {
        return Err(EpochError::UnknownTable(table_name(&table)));
    }

    let epoch = Arc::clone(&slot.epoch);
    let mut outcome = tokio::task::spawn_blocking(move || {
        engine.play(&epoch, &player, client_seed.as_deref(), target, wager)
    })
    .await??;

    slot.rounds += 1;
    let rotated = if policy.should_rotate(slot.rounds) {
        let reveal = slot.rotate();
        info!(
            table = %table_name(&table),
            retired = %reveal.epoch_id,
            rounds = reveal.rounds_played,
            "epoch rotated"
        );
        Some(reveal)
    } else {
        // Epoch keeps serving rounds
        outcome.server_seed = None;
        None
    };
    let next_commitment = slot.epoch.commitment().to_string();

    // Logged under the table lock: an epoch's rounds precede its reveal
    let mut log = audit.write().await;
    log.record_round(outcome.clone());
    if let Some(reveal) = &rotated {
        log.record_reveal(reveal.clone());
    }
    drop(log);
    drop(slot);

    Ok(PlayReceipt {
        outcome,
        next_commitment,
        rotated,
    })
}

/// Reveal a table's live epoch into the audit log.
///
/// A closing table keeps its retired epoch; otherwise a fresh one opens.
async fn retire_epoch(
    audit: Arc<RwLock<AuditLog>>,
    table: TableId,
    slot: Arc<Mutex<TableSlot>>,
    closing: bool,
) -> Result<EpochReveal, EpochError> {
    let mut slot = slot.lock().await;
    if slot.closed {
        return Err(EpochError::UnknownTable(table_name(&table)));
    }
    let reveal = if closing {
        slot.closed = true;
        slot.epoch.reveal(slot.rounds)
    } else {
        slot.rotate()
    };

    audit.write().await.record_reveal(reveal.clone());
    drop(slot);

    if closing {
        info!(table = %table_name(&table), retired = %reveal.epoch_id, "table closed");
    } else {
        info!(table = %table_name(&table), retired = %reveal.epoch_id, "epoch rotated on request");
    }
    Ok(reveal)
}

/// Owns all tables, the shared round engine and the audit log.
pub struct EpochManager<S> {
    engine: Arc<RoundEngine<S>>,
    policy: RotationPolicy,
    tables: RwLock<BTreeMap<TableId, Arc<Mutex<TableSlot>>>>,
    audit: Arc<RwLock<AuditLog>>,
}

impl<S: CounterStore + 'static> EpochManager<S> {
    /// Create a manager over a round engine.
    pub fn new(engine: RoundEngine<S>, policy: RotationPolicy) -> Self {
        Self {
            engine: Arc::new(engine),
            policy,
            tables: RwLock::new(BTreeMap::new()),
            audit: Arc::new(RwLock::new(AuditLog::new())),
        }
    }

    /// Round engine in use.
    pub fn engine(&self) -> &RoundEngine<S> {
        &self.engine
    }

    /// Rotation policy in force.
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Register a player with the nonce store (idempotent).
    pub fn register(&self, identity: &PlayerIdentity) -> Result<u64, EpochError> {
        Ok(self.engine.register(identity)?)
    }

    /// Open a table with a fresh commitment. Returns the id and commitment.
    pub async fn open_table(&self) -> (TableId, String) {
        let id = uuid::Uuid::new_v4().into_bytes();
        let slot = TableSlot::fresh();
        let commitment = slot.epoch.commitment().to_string();

        let mut tables = self.tables.write().await;
        tables.insert(id, Arc::new(Mutex::new(slot)));

        info!(table = %table_name(&id), commitment = %commitment, "table opened");
        (id, commitment)
    }

    async fn slot(&self, table: &TableId) -> Result<Arc<Mutex<TableSlot>>, EpochError> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .cloned()
            .ok_or_else(|| EpochError::UnknownTable(table_name(table)))
    }

    /// Commitment currently published for a table.
    pub async fn commitment(&self, table: &TableId) -> Result<String, EpochError> {
        let slot = self.slot(table).await?;
        let slot = slot.lock().await;
        Ok(slot.epoch.commitment().to_string())
    }

    /// Play one round on a table.
    ///
    /// Rounds on the same table are serialized. Settlement runs on its own
    /// task and completes even if the caller stops waiting, so a consumed
    /// nonce always reaches the audit log.
    ///
    /// The outcome discloses the server seed only when this round retired
    /// the epoch; otherwise the seed arrives with the epoch's reveal.
    pub async fn play(
        &self,
        table: &TableId,
        identity: &PlayerIdentity,
        client_seed: Option<String>,
        target: i64,
        wager: f64,
    ) -> Result<PlayReceipt, EpochError> {
        let slot = self.slot(table).await?;

        let task = tokio::spawn(settle_round(
            Arc::clone(&self.engine),
            Arc::clone(&self.audit),
            self.policy,
            *table,
            slot,
            identity.clone(),
            client_seed,
            target,
            wager,
        ));
        task.await?
    }

    /// Retire a table's live epoch now and publish a new commitment.
    pub async fn rotate(&self, table: &TableId) -> Result<EpochReveal, EpochError> {
        let slot = self.slot(table).await?;
        let task = tokio::spawn(retire_epoch(Arc::clone(&self.audit), *table, slot, false));
        task.await?
    }

    /// Close a table, revealing its live epoch.
    pub async fn close_table(&self, table: &TableId) -> Result<EpochReveal, EpochError> {
        let slot = {
            let mut tables = self.tables.write().await;
            tables
                .remove(table)
                .ok_or_else(|| EpochError::UnknownTable(table_name(table)))?
        };
        let task = tokio::spawn(retire_epoch(Arc::clone(&self.audit), *table, slot, true));
        task.await?
    }

    /// Number of open tables.
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Snapshot of the audit log.
    pub async fn audit_log(&self) -> AuditLog {
        self.audit.read().await.clone()
    }
}
