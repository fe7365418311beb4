//! Greedy/knapsack solver.
//!
//! Deterministic baseline: one pass over the free candidates in score-density
//! order, admitting each candidate that keeps the running selection feasible.
//! O(n log n). Also the seed of the genetic population, restart 0 of the
//! randomized-restart solver, and the fallback when other strategies are
//! disabled.
//!
//! # Key Types
//!
//! - [`GreedyConfig`]: cost model and warm-start switch
//! - [`GreedyRunner`]: executes the pass

mod config;
mod runner;

pub use config::GreedyConfig;
pub use runner::GreedyRunner;
