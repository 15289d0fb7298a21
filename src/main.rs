//! Fair Dice Demo
//!
//! Plays a short provably-fair session end to end:
//! commit, play, rotate, reveal, and re-verify every round.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fair_dice::{
    core::edge::{house_edge, payout_multiplier, round_cents},
    game::{
        simulate_rtp, CounterStore, EpochManager, FileCounterStore, MemoryCounterStore,
        NonceSequencer, PlayerIdentity, RoundEngine, RoundInput,
    },
    proof::{verify_outcome, CommitmentEpoch, VerificationError},
    EngineConfig, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    let config = EngineConfig::from_env();
    info!("Fair Dice v{}", VERSION);
    info!("Rotation policy: {}", config.rotation);

    match &config.data_dir {
        Some(dir) => {
            let store = FileCounterStore::open_in_dir(dir)
                .with_context(|| format!("failed to open nonce store in {}", dir.display()))?;
            demo_session(store, &config).await
        }
        None => {
            info!("No FAIR_DICE_DATA_DIR set, nonces kept in memory");
            demo_session(MemoryCounterStore::new(), &config).await
        }
    }
}

/// Demo: one player, one table, a handful of rounds.
async fn demo_session<S: CounterStore + 'static>(store: S, config: &EngineConfig) -> anyhow::Result<()> {
    info!("=== Payout Table ===");
    for target in [10u8, 50, 70, 90, 99] {
        info!(
            "Target {:>2}: edge {:.3}, multiplier {:.2}",
            target,
            house_edge(target),
            round_cents(payout_multiplier(target))
        );
    }

    let engine = RoundEngine::new(NonceSequencer::new(store, config.sequencer.clone()));
    let manager = EpochManager::new(engine, config.rotation);

    let player = PlayerIdentity::parse("demo@example.com")?;
    let last = manager.register(&player)?;
    info!("Registered {} (last nonce {})", player, last);

    info!("=== Playing Rounds ===");
    let (table, commitment) = manager.open_table().await;
    info!("Published commitment: {}", commitment);

    let mut published = commitment;
    for (target, wager) in [(50, 10.0), (70, 5.0), (90, 20.0), (25, 1.0), (99, 100.0)] {
        let receipt = manager
            .play(&table, &player, Some("demo_client_seed".to_string()), target, wager)
            .await?;
        let outcome = &receipt.outcome;

        info!(
            "Nonce {}: rolled {} vs target {} -> {} (payout {:.2})",
            outcome.nonce,
            outcome.number,
            target,
            if outcome.win { "WIN" } else { "LOSS" },
            outcome.payout
        );

        match verify_outcome(outcome, &published) {
            Ok(()) => info!("Nonce {} verified against commitment", outcome.nonce),
            Err(VerificationError::SeedUndisclosed) => {
                info!("Nonce {} seed withheld until the epoch rotates", outcome.nonce)
            }
            Err(e) => warn!("Nonce {} FAILED verification: {}", outcome.nonce, e),
        }
        published = receipt.next_commitment;
    }

    // Invalid bets are rejected before any nonce is consumed
    if let Err(e) = manager.play(&table, &player, None, 100, 1.0).await {
        info!("Rejected bet: {}", e);
    }

    manager.close_table(&table).await?;

    info!("=== Audit ===");
    let log = manager.audit_log().await;
    let failures = log.audit();
    info!(
        "{} rounds, {} reveals, {} failures",
        log.rounds.len(),
        log.reveals.len(),
        failures.len()
    );
    for (epoch, nonce, err) in &failures {
        warn!("Epoch {} nonce {}: {}", epoch, nonce, err);
    }

    if let Some(dir) = &config.data_dir {
        let path = dir.join("audit.json");
        std::fs::write(&path, log.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Audit log written to {}", path.display());
    }

    info!("=== RTP Simulation ===");
    let sim_player = PlayerIdentity::parse("simulation@example.com")?;
    manager.register(&sim_player)?;
    let epoch = CommitmentEpoch::create();
    for target in [50, 70, 90] {
        let input = RoundInput::new(target, 1.0)?;
        let report = simulate_rtp(manager.engine(), &epoch, &sim_player, "sim_seed", input, 1000)?;
        info!(
            "Target {}: RTP {:.2}% (theoretical {:.2}%), win rate {:.1}% (expected {:.1}%), streaks W{} / L{}",
            target,
            report.rtp() * 100.0,
            report.theoretical_rtp() * 100.0,
            report.win_rate() * 100.0,
            report.expected_win_rate() * 100.0,
            report.max_win_streak,
            report.max_loss_streak
        );
    }

    Ok(())
}
