//! Performance benchmarks for the possession engine
//!
//! Two groups:
//!
//! 1. **Match** - a full seeded match, random controller against the
//!    scripted opponent, driven by the match runner on the virtual clock
//! 2. **Batch** - many matches through the rayon batch runner
//!
//! Logging is silenced; build with `--no-default-features` to also drop
//! the verbose-logging formatting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quizball::batch::{run_batch, BatchOptions};
use quizball::game::{MatchRunner, PossessionEngine, RandomController, VerbosityLevel};
use quizball::loader::MatchConfig;
use quizball::remote::SessionInfo;
use std::time::Duration;

fn session() -> SessionInfo {
    SessionInfo {
        session_id: "bench".to_string(),
        max_score: 5,
        max_actions_hint: 60,
    }
}

fn play_match(seed: u64) -> u32 {
    let mut engine = PossessionEngine::seeded(MatchConfig::default().with_seed(seed), &session());
    engine.set_event_outbox(false);
    let mut controller = RandomController::new(seed, 0.6);
    match MatchRunner::new(&mut engine)
        .with_verbosity(VerbosityLevel::Silent)
        .run_match(&mut controller)
    {
        Ok(result) => result.actions,
        Err(err) => panic!("benchmark match {seed} failed: {err}"),
    }
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match");
    group.measurement_time(Duration::from_secs(10));

    for seed in [7u64, 42] {
        group.bench_with_input(BenchmarkId::new("fresh", seed), &seed, |b, &seed| {
            b.iter(|| black_box(play_match(black_box(seed))));
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(10);

    let options = BatchOptions {
        matches: 200,
        seed: 42,
        ..BatchOptions::default()
    };
    group.bench_function(BenchmarkId::new("parallel", options.matches), |b| {
        b.iter(|| black_box(run_batch(&options)));
    });

    group.finish();
}

criterion_group!(benches, bench_match, bench_batch);
criterion_main!(benches);
