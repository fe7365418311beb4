//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! seeding → selection → crossover → mutation → repair → repeat,
//! followed by a final greedy polish of the best chromosome.

use super::config::GaConfig;
use super::operators::bit_flip_mutation;
use super::types::{Chromosome, Encoding};
use crate::greedy::{GreedyConfig, GreedyRunner};
use crate::model::Solution;
use crate::random::rng_from;
use crate::solver::{PinnedPool, SolveContext, StopReason};
use rand::Rng;
use std::time::Instant;
use tracing::{debug, trace};

/// Improvements smaller than this do not reset the saturation counter.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Result of a GA optimization run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Best chromosome found, decoded and polished.
    pub best: Solution,

    /// Objective value of `best`.
    pub best_fitness: f64,

    /// Total number of generations executed across all epochs.
    pub generations: usize,

    /// Epochs started.
    pub epochs: usize,

    pub stop: StopReason,

    /// Best fitness before the first generation and after each generation.
    /// Non-decreasing.
    pub fitness_history: Vec<f64>,
}

/// Executes the GA evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let pinned = PinnedPool::new(&pool, &pins)?;
/// let config = GaConfig::default().with_seed(42);
/// let result = GaRunner::run(&pinned, &config, None, &SolveContext::new());
/// println!("Best fitness: {}", result.best_fitness);
/// ```
pub struct GaRunner;

impl GaRunner {
    /// Runs the GA.
    ///
    /// The population is seeded from the greedy solution (warm-started from
    /// `warm` when given). Cancellation and the time limit are checked at the
    /// start of each generation; either stops the run with the best
    /// chromosome found so far.
    ///
    /// The configuration must be valid; [`Solver::solve`](crate::solver::Solver::solve)
    /// checks it before calling.
    pub fn run(
        pinned: &PinnedPool<'_>,
        config: &GaConfig,
        warm: Option<&Solution>,
        ctx: &SolveContext,
    ) -> GaResult {
        let encoding = Encoding::new(pinned, config.cost_model);
        let mut rng = rng_from(config.seed);
        let started = Instant::now();

        let greedy = GreedyConfig::default().with_cost_model(config.cost_model);
        let seed_mask = GreedyRunner::select(pinned, &greedy, warm);
        let mut best = Chromosome::repaired(encoding.encode(&seed_mask), &encoding);

        let upper_bound = encoding.upper_bound();
        let total_generations = config.max_generations * config.epochs;
        let mut fitness_history = Vec::with_capacity(total_generations + 1);
        fitness_history.push(best.fitness);

        let mut generations = 0usize;
        let mut epochs = 0usize;
        let mut stop = StopReason::Completed;

        'epochs: for epoch in 0..config.epochs {
            epochs += 1;
            let mut population = initial_population(&best, config, &encoding, &mut rng);
            let mut stale = 0usize;
            debug!(epoch, seed_fitness = best.fitness, "epoch started");

            for gen in 0..config.max_generations {
                if best.fitness >= upper_bound - IMPROVEMENT_EPSILON {
                    stop = StopReason::UpperBound;
                    break 'epochs;
                }
                if ctx.is_cancelled() {
                    stop = StopReason::Cancelled;
                    break 'epochs;
                }
                if let Some(limit) = config.time_limit_ms {
                    if started.elapsed().as_millis() >= u128::from(limit) {
                        stop = StopReason::TimeLimit;
                        break 'epochs;
                    }
                }

                population = next_generation(population, config, &encoding, &mut rng);
                generations += 1;

                let gen_best = find_best(&population);
                if gen_best.fitness > best.fitness + IMPROVEMENT_EPSILON {
                    trace!(generation = generations, fitness = gen_best.fitness, "improved");
                    best = gen_best.clone();
                    stale = 0;
                } else {
                    stale += 1;
                }
                fitness_history.push(best.fitness);

                let done = epoch * config.max_generations + gen + 1;
                ctx.report(
                    done as f64 / total_generations as f64 * 100.0,
                    best.fitness,
                    generations,
                );

                if config.saturate > 0 && stale >= config.saturate {
                    debug!(epoch, generation = generations, "saturated");
                    stop = StopReason::Saturated;
                    let epoch_end = (epoch + 1) * config.max_generations;
                    ctx.report(
                        epoch_end as f64 / total_generations as f64 * 100.0,
                        best.fitness,
                        generations,
                    );
                    continue 'epochs;
                }
            }
            stop = StopReason::Completed;
        }

        let solution = encoding.polish(&best.genes);
        if stop == StopReason::UpperBound {
            ctx.report(100.0, solution.total_score(), generations);
        }
        debug!(
            generations,
            epochs,
            fitness = best.fitness,
            polished = solution.total_score(),
            stop = ?stop,
            "ga finished"
        );

        GaResult {
            best_fitness: solution.total_score(),
            best: solution,
            generations,
            epochs,
            stop,
            fitness_history,
        }
    }
}

/// The seed itself plus perturbed, repaired copies of it.
fn initial_population<R: Rng>(
    seed: &Chromosome,
    config: &GaConfig,
    encoding: &Encoding<'_>,
    rng: &mut R,
) -> Vec<Chromosome> {
    let mut population = Vec::with_capacity(config.population_size);
    population.push(seed.clone());
    let perturbed: Vec<Vec<bool>> = (1..config.population_size)
        .map(|_| {
            let mut genes = seed.genes.clone();
            bit_flip_mutation(&mut genes, config.seed_flip_rate, rng);
            genes
        })
        .collect();
    population.extend(evaluate(perturbed, encoding, config.parallel));
    population
}

/// Elites plus repaired offspring.
fn next_generation<R: Rng>(
    mut population: Vec<Chromosome>,
    config: &GaConfig,
    encoding: &Encoding<'_>,
    rng: &mut R,
) -> Vec<Chromosome> {
    // Best first.
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

    let elite_count = config.elite_count();
    let mut offspring: Vec<Vec<bool>> =
        Vec::with_capacity(config.population_size - elite_count);
    while elite_count + offspring.len() < config.population_size {
        let p1 = &population[config.selection.select(&population, rng)];
        let p2 = &population[config.selection.select(&population, rng)];

        let (c1, c2) = if rng.random_bool(config.crossover_rate) {
            config.crossover.apply(&p1.genes, &p2.genes, rng)
        } else {
            (p1.genes.clone(), p2.genes.clone())
        };

        for mut child in [c1, c2] {
            if elite_count + offspring.len() >= config.population_size {
                break;
            }
            bit_flip_mutation(&mut child, config.mutation_rate, rng);
            offspring.push(child);
        }
    }

    population.truncate(elite_count);
    population.extend(evaluate(offspring, encoding, config.parallel));
    population
}

/// Repairs and scores gene vectors, in parallel when enabled.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn evaluate(genes: Vec<Vec<bool>>, encoding: &Encoding<'_>, parallel: bool) -> Vec<Chromosome> {
    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        return genes
            .into_par_iter()
            .map(|g| Chromosome::repaired(g, encoding))
            .collect();
    }
    genes
        .into_iter()
        .map(|g| Chromosome::repaired(g, encoding))
        .collect()
}

/// Chromosome with the highest fitness; the first one on ties.
fn find_best(population: &[Chromosome]) -> &Chromosome {
    let mut best = &population[0];
    for c in &population[1..] {
        if c.fitness > best.fitness {
            best = c;
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================
