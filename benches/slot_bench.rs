//! Criterion benchmarks for the three slot selection strategies.
//!
//! Uses synthetic discipline pools (random points, shares and categories)
//! sized like small, medium and large university disciplines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use slot_optim::ga::GaConfig;
use slot_optim::greedy::GreedyConfig;
use slot_optim::model::{
    Candidate, CandidateKey, Category, ConstraintSet, DisciplineId, EvaluationPeriod,
};
use slot_optim::pool::CandidatePool;
use slot_optim::random::create_rng;
use slot_optim::restart::RestartConfig;
use slot_optim::solver::{SolveContext, Solver};

// ===========================================================================
// Synthetic pool
// ===========================================================================

fn synthetic_pool(authors: u64, per_author: u64) -> CandidatePool {
    let mut rng = create_rng(42);
    let discipline = DisciplineId::from("synthetic");
    let mut candidates = Vec::new();
    for author in 1..=authors {
        for p in 0..per_author {
            let category = match rng.random_range(0..10) {
                0 => Category::Monograph,
                1 | 2 => Category::Chapter,
                _ => Category::Article,
            };
            let share = [1.0, 0.5, 0.25][rng.random_range(0..3)];
            candidates.push(
                Candidate::new(
                    CandidateKey::new(format!("pub-{author}-{p}"), author),
                    discipline.clone(),
                    rng.random_range(5..=200) as f64,
                    share,
                    category,
                    2023,
                )
                .expect("synthetic candidate is valid"),
            );
        }
    }
    let quota = authors as f64 * 3.0 * 0.8;
    CandidatePool::new(
        discipline,
        EvaluationPeriod::default(),
        candidates,
        ConstraintSet::new(quota, 4.0, 2.0).expect("synthetic caps are valid"),
    )
    .expect("synthetic pool is valid")
}

const SIZES: [(u64, u64); 3] = [(10, 8), (40, 10), (120, 12)];

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_strategy(c: &mut Criterion, name: &str, solver: Solver) {
    let mut group = c.benchmark_group(name);
    group.sample_size(10);

    for (authors, per_author) in SIZES {
        let pool = synthetic_pool(authors, per_author);
        group.bench_with_input(
            BenchmarkId::from_parameter(pool.len()),
            &(pool, solver.clone()),
            |b, (pool, solver)| {
                b.iter(|| {
                    let outcome = solver
                        .solve(black_box(pool), &[], None, &SolveContext::new())
                        .expect("synthetic solve succeeds");
                    black_box(outcome)
                })
            },
        );
    }
    group.finish();
}

fn bench_greedy(c: &mut Criterion) {
    bench_strategy(c, "greedy", Solver::Greedy(GreedyConfig::default()));
}

fn bench_genetic(c: &mut Criterion) {
    let config = GaConfig::default()
        .with_population_size(60)
        .with_max_generations(50)
        .with_saturate(0)
        .with_seed(42);
    bench_strategy(c, "genetic", Solver::Genetic(config));
}

fn bench_restart(c: &mut Criterion) {
    let config = RestartConfig::default().with_num_restarts(100).with_seed(42);
    bench_strategy(c, "random_restart", Solver::RandomRestart(config));
}

criterion_group!(benches, bench_greedy, bench_genetic, bench_restart);
criterion_main!(benches);
