//! Selection strategies for the GA.
//!
//! Selection determines which chromosomes are chosen as parents for
//! crossover. Different strategies provide different selection pressure.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::Chromosome;
use rand::Rng;

/// Selection strategy for choosing parents.
///
/// All strategies assume **maximization** (higher fitness = better).
///
/// # Examples
///
/// ```
/// use slot_optim::ga::Selection;
///
/// // Tournament with size 3 (moderate selection pressure)
/// let sel = Selection::Tournament(3);
///
/// // Roulette wheel (fitness-proportionate)
/// let sel = Selection::Roulette;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Tournament selection: pick `k` chromosomes at random, select the best.
    ///
    /// Higher `k` = stronger selection pressure.
    Tournament(usize),

    /// Fitness-proportionate (roulette wheel) selection.
    ///
    /// Weights are fitness shifted by the population minimum, so the
    /// selection pressure does not depend on the absolute score level.
    Roulette,

    /// Linear rank-based selection: the best of `n` gets weight `n`, the
    /// worst weight `1`.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Select a parent index from the population.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<R: Rng>(&self, population: &[Chromosome], rng: &mut R) -> usize {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

fn tournament<R: Rng>(population: &[Chromosome], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = population.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if population[idx].fitness > population[best_idx].fitness {
            best_idx = idx;
        }
    }
    best_idx
}

fn roulette<R: Rng>(population: &[Chromosome], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let min_fitness = population
        .iter()
        .map(|c| c.fitness)
        .fold(f64::INFINITY, f64::min);
    let epsilon = 1e-10;
    let weights: Vec<f64> = population
        .iter()
        .map(|c| (c.fitness - min_fitness).max(0.0) + epsilon)
        .collect();

    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    n - 1 // floating-point fallback
}

fn rank<R: Rng>(population: &[Chromosome], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    // Best first.
    let mut indexed: Vec<usize> = (0..n).collect();
    indexed.sort_by(|&a, &b| population[b].fitness.total_cmp(&population[a].fitness));

    let total: f64 = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (rank, &original_idx) in indexed.iter().enumerate() {
        cumulative += (n - rank) as f64;
        if cumulative > threshold {
            return original_idx;
        }
    }

    indexed[n - 1]
}
