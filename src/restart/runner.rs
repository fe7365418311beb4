//! Randomized-restart loop.

use super::config::RestartConfig;
use crate::greedy::{GreedyConfig, GreedyRunner};
use crate::model::Solution;
use crate::random::{rng_from, shuffle_segment};
use crate::solver::{fill, PinnedPool, SolveContext, StopReason};
use rand::seq::SliceRandom;
use tracing::trace;

/// Result of a randomized-restart run.
#[derive(Debug, Clone)]
pub struct RestartResult {
    /// Best solution over all restarts.
    pub best: Solution,

    /// Restarts actually executed.
    pub restarts: usize,

    pub stop: StopReason,

    /// Best score after each restart.
    pub score_history: Vec<f64>,
}

/// Executes repeated greedy passes over perturbed orderings.
///
/// Restart 0 is the plain greedy pass (with warm start when given), so the
/// result never scores below it. Later restarts shuffle the density order and
/// run the same admission rule; pins are unaffected. Cancellation is checked
/// before each restart.
pub struct RestartRunner;

impl RestartRunner {
    pub fn run(
        pinned: &PinnedPool<'_>,
        config: &RestartConfig,
        warm: Option<&Solution>,
        ctx: &SolveContext,
    ) -> RestartResult {
        let total = config.num_restarts.max(1);
        let greedy = GreedyConfig::default().with_cost_model(config.cost_model);
        let order = pinned.ranked_free(&config.cost_model);

        let mut best_mask = GreedyRunner::select(pinned, &greedy, warm);
        let mut best_score = pinned.mask_score(&best_mask);
        let mut score_history = Vec::with_capacity(total);
        score_history.push(best_score);
        ctx.report(100.0 / total as f64, best_score, 1);

        let mut rng = rng_from(config.seed);
        let mut stop = StopReason::Completed;
        let mut restarts = 1;

        for restart in 1..total {
            if ctx.is_cancelled() {
                stop = StopReason::Cancelled;
                break;
            }

            let mut shuffled = order.clone();
            if config.full_shuffle_every > 0 && restart % config.full_shuffle_every == 0 {
                shuffled.shuffle(&mut rng);
            } else {
                shuffle_segment(&mut shuffled, &mut rng);
            }

            let (mut tracker, mut mask) = pinned.base_state();
            fill(&mut tracker, &mut mask, pinned, &shuffled);
            let score = pinned.mask_score(&mask);
            if score > best_score {
                trace!(restart, score, "restart improved");
                best_score = score;
                best_mask = mask;
            }

            restarts += 1;
            score_history.push(best_score);
            ctx.report(
                restarts as f64 / total as f64 * 100.0,
                best_score,
                restarts,
            );
        }

        RestartResult {
            best: pinned.decode(&best_mask),
            restarts,
            stop,
            score_history,
        }
    }
}
