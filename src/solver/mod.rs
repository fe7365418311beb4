//! Strategy dispatch.
//!
//! The three solving strategies form a closed set, [`Strategy`]. A [`Solver`]
//! pairs a strategy with its configuration and exposes one entry point,
//! [`Solver::solve`], used by the interactive layer and the run controller.
//!
//! Every strategy receives the pool with its pins already resolved
//! ([`PinnedPool`]) and a [`SolveContext`] carrying the cancellation token
//! and an optional [`ProgressObserver`].

mod context;
mod problem;

pub use context::{CancelToken, ProgressObserver, ProgressUpdate, SolveContext};
pub use problem::{fill, PinnedPool};

use crate::constraint;
use crate::error::SolveError;
use crate::ga::{GaConfig, GaRunner};
use crate::greedy::{GreedyConfig, GreedyRunner};
use crate::model::{Pin, Solution};
use crate::pool::CandidatePool;
use crate::restart::{RestartConfig, RestartRunner};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Solving strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Greedy,
    Genetic,
    RandomRestart,
}

impl Strategy {
    /// Lower-case name used in file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Greedy => "greedy",
            Strategy::Genetic => "genetic",
            Strategy::RandomRestart => "random_restart",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    /// Ran its full iteration budget.
    Completed,
    /// Best score did not improve for the saturation window.
    Saturated,
    /// Every candidate is selected; nothing left to gain.
    UpperBound,
    TimeLimit,
    Cancelled,
}

/// Final answer of a strategy.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub solution: Solution,
    pub strategy: Strategy,
    /// Generations (genetic), restarts (random restart) or `1` (greedy).
    pub iterations: usize,
    pub stop: StopReason,
    /// Best score after each iteration. Non-decreasing.
    pub history: Vec<f64>,
}

impl SolveOutcome {
    pub fn cancelled(&self) -> bool {
        self.stop == StopReason::Cancelled
    }
}

/// A strategy with its configuration.
#[derive(Debug, Clone)]
pub enum Solver {
    Greedy(GreedyConfig),
    Genetic(GaConfig),
    RandomRestart(RestartConfig),
}

impl Solver {
    /// Solver for `strategy` with default parameters.
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Greedy => Solver::Greedy(GreedyConfig::default()),
            Strategy::Genetic => Solver::Genetic(GaConfig::default()),
            Strategy::RandomRestart => Solver::RandomRestart(RestartConfig::default()),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Solver::Greedy(_) => Strategy::Greedy,
            Solver::Genetic(_) => Strategy::Genetic,
            Solver::RandomRestart(_) => Strategy::RandomRestart,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Solver::Greedy(c) => c.validate(),
            Solver::Genetic(c) => c.validate(),
            Solver::RandomRestart(c) => c.validate(),
        }
    }

    /// Selects a feasible subset of `pool` honoring `pins`.
    ///
    /// `warm` is a previous solution whose unpinned members seed the search.
    ///
    /// # Errors
    ///
    /// [`SolveError::PinConflict`] for contradictory or infeasible pins and
    /// [`SolveError::InvalidConfig`] for invalid parameters. Ordinary
    /// infeasibility of single candidates is never an error.
    pub fn solve(
        &self,
        pool: &CandidatePool,
        pins: &[Pin],
        warm: Option<&Solution>,
        ctx: &SolveContext,
    ) -> Result<SolveOutcome, SolveError> {
        self.validate().map_err(SolveError::InvalidConfig)?;
        let pinned = PinnedPool::new(pool, pins)?;
        let strategy = self.strategy();
        debug!(
            discipline = %pool.discipline_id(),
            strategy = %strategy,
            candidates = pool.len(),
            forced_in = pinned.forced_in().len(),
            pins = pinned.pins().len(),
            "solve started"
        );

        let outcome = match self {
            Solver::Greedy(config) => {
                let solution = GreedyRunner::run(&pinned, config, warm);
                ctx.report(100.0, solution.total_score(), 1);
                SolveOutcome {
                    history: vec![solution.total_score()],
                    solution,
                    strategy,
                    iterations: 1,
                    stop: StopReason::Completed,
                }
            }
            Solver::Genetic(config) => {
                let result = GaRunner::run(&pinned, config, warm, ctx);
                SolveOutcome {
                    solution: result.best,
                    strategy,
                    iterations: result.generations,
                    stop: result.stop,
                    history: result.fitness_history,
                }
            }
            Solver::RandomRestart(config) => {
                let result = RestartRunner::run(&pinned, config, warm, ctx);
                SolveOutcome {
                    solution: result.best,
                    strategy,
                    iterations: result.restarts,
                    stop: result.stop,
                    history: result.score_history,
                }
            }
        };

        debug_assert!(
            constraint::validate(&outcome.solution, pool.constraints(), &pinned.pins().to_pins())
                .is_ok_and(|f| f.is_ok()),
            "solver emitted an infeasible solution"
        );
        info!(
            discipline = %pool.discipline_id(),
            strategy = %strategy,
            score = outcome.solution.total_score(),
            selected = outcome.solution.len(),
            iterations = outcome.iterations,
            stop = ?outcome.stop,
            "solve finished"
        );
        Ok(outcome)
    }
}
