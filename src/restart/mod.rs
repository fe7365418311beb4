//! Randomized-restart solver.
//!
//! Runs the greedy admission rule `num_restarts` times over perturbed
//! candidate orderings and keeps the best feasible selection. Single
//! threaded and reproducible for a fixed seed.
//!
//! # Key Types
//!
//! - [`RestartConfig`]: restart count, shuffle policy, seed
//! - [`RestartRunner`]: executes the loop
//! - [`RestartResult`]: best solution with per-restart history

mod config;
mod runner;

pub use config::RestartConfig;
pub use runner::{RestartResult, RestartRunner};
