//! Benchmarks for the tabular learner
//!
//! Run with: cargo bench -p safety_q

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use safety_q::envs::{DoubleIntegrator, DoubleIntegratorConfig};
use safety_q::{
    Backup, BackupMode, Constant, DiscretizationSpec, OutcomeReducer, QLearner, SbeOutcome,
    ScheduleSetConfig, Schedules, TrainerConfig,
};

fn integrator_spec(buckets: usize) -> DiscretizationSpec {
    let bounds = DoubleIntegratorConfig::default().state_bounds();
    DiscretizationSpec::new(vec![buckets, buckets], bounds).unwrap()
}

/// Benchmark state discretization
fn bench_discretize(c: &mut Criterion) {
    let mut group = c.benchmark_group("Discretize");

    for buckets in [11, 41, 101] {
        let spec = integrator_spec(buckets);
        group.bench_with_input(BenchmarkId::new("2d", buckets), &spec, |b, spec| {
            b.iter(|| spec.discretize(black_box(&[0.37, -1.21])));
        });
    }

    group.finish();
}

/// Benchmark the backup operators
fn bench_backup(c: &mut Criterion) {
    let mut group = c.benchmark_group("Backup");

    let safety = Backup::new(BackupMode::Safety);
    let standard = Backup::new(BackupMode::Standard);
    group.bench_function("safety", |b| {
        b.iter(|| safety.target(black_box(0.3), 0.99, false, black_box(0.7)));
    });
    group.bench_function("standard", |b| {
        b.iter(|| standard.target(black_box(0.3), 0.99, false, black_box(0.7)));
    });

    let signals: Vec<f64> = (0..1_000).map(|i| (i as f64 * 0.01).sin()).collect();
    group.bench_function("sbe_outcome_1000", |b| {
        b.iter(|| SbeOutcome.outcomes(black_box(&signals), 0.99));
    });

    group.finish();
}

/// Benchmark full training runs
fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Learn");
    group.sample_size(10);

    for buckets in [11, 41] {
        group.bench_with_input(
            BenchmarkId::new("double_integrator_100_episodes", buckets),
            &buckets,
            |b, &buckets| {
                b.iter(|| {
                    let mut env = DoubleIntegrator::new(DoubleIntegratorConfig::default()).unwrap();
                    let config = TrainerConfig::new(integrator_spec(buckets))
                        .with_max_episodes(100)
                        .with_max_episode_length(Some(200))
                        .quiet();
                    let mut learner =
                        QLearner::new(config, Schedules::from(&ScheduleSetConfig::default()));
                    black_box(learner.learn(&mut env).unwrap())
                });
            },
        );
    }

    group.bench_function("greedy_only_100_episodes", |b| {
        b.iter(|| {
            let mut env = DoubleIntegrator::new(DoubleIntegratorConfig::default()).unwrap();
            let config = TrainerConfig::new(integrator_spec(41))
                .with_max_episodes(100)
                .with_max_episode_length(Some(200))
                .quiet();
            let schedules = Schedules::new(Constant(0.1), Constant(0.0), Constant(0.99));
            black_box(QLearner::new(config, schedules).learn(&mut env).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_discretize, bench_backup, bench_learn);
criterion_main!(benches);
