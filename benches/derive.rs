use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fair_dice::core::edge::payout;
use fair_dice::game::{MemoryCounterStore, NonceSequencer, PlayerIdentity, RoundEngine, SequencerConfig};
use fair_dice::proof::{verify_outcome, CommitmentEpoch};
use fair_dice::derive_roll;

fn bench_derive_roll(c: &mut Criterion) {
    let seed = "a".repeat(64);

    c.bench_function("derive_roll", |b| {
        let mut nonce = 0u64;
        b.iter(|| {
            nonce += 1;
            derive_roll(black_box(&seed), black_box("bench_client"), black_box(nonce))
        });
    });
}

fn bench_payout(c: &mut Criterion) {
    c.bench_function("payout", |b| {
        b.iter(|| {
            for target in 1u8..=99 {
                black_box(payout(black_box(10.0), target));
            }
        });
    });
}

fn bench_play_round(c: &mut Criterion) {
    let engine = RoundEngine::new(NonceSequencer::new(
        MemoryCounterStore::new(),
        SequencerConfig::default(),
    ));
    let player = PlayerIdentity::parse("bench@example.com").unwrap();
    engine.register(&player).unwrap();
    let epoch = CommitmentEpoch::create();

    c.bench_function("play_round", |b| {
        b.iter(|| {
            engine
                .play(&epoch, &player, Some("bench_client"), black_box(50), black_box(1.0))
                .unwrap()
        });
    });
}

fn bench_verify_outcome(c: &mut Criterion) {
    let engine = RoundEngine::new(NonceSequencer::new(
        MemoryCounterStore::new(),
        SequencerConfig::default(),
    ));
    let player = PlayerIdentity::parse("bench@example.com").unwrap();
    engine.register(&player).unwrap();
    let epoch = CommitmentEpoch::create();
    let outcome = engine
        .play(&epoch, &player, Some("bench_client"), 50, 1.0)
        .unwrap();

    c.bench_function("verify_outcome", |b| {
        b.iter(|| verify_outcome(black_box(&outcome), black_box(epoch.commitment())));
    });
}

criterion_group!(
    benches,
    bench_derive_roll,
    bench_payout,
    bench_play_round,
    bench_verify_outcome
);
criterion_main!(benches);
