//! Genetic Algorithm solver.
//!
//! A chromosome is a boolean inclusion vector over the free (unpinned)
//! candidates. The initial population is the greedy solution plus perturbed
//! copies of it; every offspring is repaired to feasibility before it is
//! scored, and the best chromosome ever seen is always kept (elitism). An
//! epoch stops early once the best fitness has not improved for `saturate`
//! generations.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (population size, selection, presets)
//! - [`GaRunner`]: Executes the evolutionary loop
//! - [`GaResult`]: Final result with statistics
//! - [`Chromosome`] / [`Encoding`]: gene layout over a pinned pool
//! - [`repair`]: pure feasibility repair
//!
//! # Submodules
//!
//! - [`operators`]: uniform / single-point crossover and bit-flip mutation
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Chu & Beasley (1998), "A Genetic Algorithm for the Multidimensional Knapsack Problem"

mod config;
pub mod operators;
mod repair;
mod runner;
mod selection;
mod types;

pub use config::GaConfig;
pub use operators::Crossover;
pub use repair::repair;
pub use runner::{GaResult, GaRunner};
pub use selection::Selection;
pub use types::{Chromosome, Encoding};
