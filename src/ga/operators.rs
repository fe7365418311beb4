//! Genetic operators for inclusion vectors.
//!
//! Chromosomes are `Vec<bool>` masks over the free candidates. Operators here
//! never look at candidate data; feasibility is restored afterwards by
//! [`repair`](super::repair).
//!
//! # Crossover Operators
//!
//! - [`uniform_crossover`]: each gene drawn from either parent with p = 0.5
//! - [`single_point_crossover`]: prefix of one parent, suffix of the other
//!
//! # Mutation Operators
//!
//! - [`bit_flip_mutation`]: flip each gene independently with probability `rate`
//!
//! # References
//!
//! - Syswerda (1989), "Uniform Crossover in Genetic Algorithms"
//! - Chu & Beasley (1998), "A Genetic Algorithm for the Multidimensional
//!   Knapsack Problem"

use rand::Rng;

/// Recombination operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Crossover {
    #[default]
    Uniform,
    SinglePoint,
}

impl Crossover {
    /// Produces two children from two parents of equal length.
    pub fn apply<R: Rng>(
        &self,
        parent1: &[bool],
        parent2: &[bool],
        rng: &mut R,
    ) -> (Vec<bool>, Vec<bool>) {
        match self {
            Crossover::Uniform => uniform_crossover(parent1, parent2, rng),
            Crossover::SinglePoint => single_point_crossover(parent1, parent2, rng),
        }
    }
}

// ============================================================================
// Crossover operators
// ============================================================================

/// Uniform crossover: each position swaps between the children with p = 0.5.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn uniform_crossover<R: Rng>(
    parent1: &[bool],
    parent2: &[bool],
    rng: &mut R,
) -> (Vec<bool>, Vec<bool>) {
    assert_eq!(parent1.len(), parent2.len(), "parents must have equal length");
    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();
    for i in 0..parent1.len() {
        if rng.random_bool(0.5) {
            child1[i] = parent2[i];
            child2[i] = parent1[i];
        }
    }
    (child1, child2)
}

/// Single-point crossover at a random cut in `1..n`.
///
/// # Panics
/// Panics if parents have different lengths.
pub fn single_point_crossover<R: Rng>(
    parent1: &[bool],
    parent2: &[bool],
    rng: &mut R,
) -> (Vec<bool>, Vec<bool>) {
    let n = parent1.len();
    assert_eq!(n, parent2.len(), "parents must have equal length");
    if n < 2 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let cut = rng.random_range(1..n);
    let mut child1 = parent1[..cut].to_vec();
    child1.extend_from_slice(&parent2[cut..]);
    let mut child2 = parent2[..cut].to_vec();
    child2.extend_from_slice(&parent1[cut..]);
    (child1, child2)
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Flips each gene with probability `rate`. Returns the number of flips.
pub fn bit_flip_mutation<R: Rng>(genes: &mut [bool], rate: f64, rng: &mut R) -> usize {
    if rate <= 0.0 {
        return 0;
    }
    let rate = rate.min(1.0);
    let mut flips = 0;
    for gene in genes.iter_mut() {
        if rng.random_bool(rate) {
            *gene = !*gene;
            flips += 1;
        }
    }
    flips
}
