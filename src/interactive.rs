//! Pinning-aware interactive solving.
//!
//! [`solve`] is the one-shot form: reject contradictory pins, then delegate
//! to the chosen strategy. [`InteractiveSession`] keeps a pool, a pin set and
//! the last answer so an operator can flip pins and re-solve incrementally;
//! each re-solve warm-starts from the previous solution.

use crate::constraint::check_pins;
use crate::error::SolveError;
use crate::model::{CandidateKey, Pin, PinSet, PinState, Solution};
use crate::pool::CandidatePool;
use crate::solver::{SolveContext, SolveOutcome, Solver};
use tracing::info;

/// Solves `pool` under `pins` with `solver`.
///
/// # Errors
///
/// [`SolveError::PinConflict`] before any search when the pins contradict
/// each other, reference unknown candidates, or force in an infeasible set.
pub fn solve(
    pool: &CandidatePool,
    pins: &[Pin],
    solver: &Solver,
    ctx: &SolveContext,
) -> Result<SolveOutcome, SolveError> {
    let resolved =
        check_pins(pool.candidates(), pool.constraints(), pins).map_err(SolveError::PinConflict)?;
    solver.solve(pool, &resolved.to_pins(), None, ctx)
}

/// Operator session over one discipline's pool.
#[derive(Debug, Clone)]
pub struct InteractiveSession {
    pool: CandidatePool,
    solver: Solver,
    pins: PinSet,
    current: Option<SolveOutcome>,
    /// Pins `current` was solved under.
    solved_under: PinSet,
}

impl InteractiveSession {
    pub fn new(pool: CandidatePool, solver: Solver) -> Self {
        Self {
            pool,
            solver,
            pins: PinSet::new(),
            current: None,
            solved_under: PinSet::new(),
        }
    }

    /// Replaces the pin set, validating it against the pool first.
    pub fn set_pins(&mut self, pins: &[Pin]) -> Result<(), SolveError> {
        self.pins = check_pins(self.pool.candidates(), self.pool.constraints(), pins)
            .map_err(SolveError::PinConflict)?;
        Ok(())
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn set_solver(&mut self, solver: Solver) {
        self.solver = solver;
    }

    pub fn outcome(&self) -> Option<&SolveOutcome> {
        self.current.as_ref()
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.current.as_ref().map(|o| &o.solution)
    }

    /// Re-solves under the current pins, warm-starting from the last answer.
    pub fn resolve(&mut self, ctx: &SolveContext) -> Result<&SolveOutcome, SolveError> {
        let pins = self.pins.clone();
        self.commit(pins, ctx)
    }

    /// Flips one candidate's pin and re-solves.
    ///
    /// Unpinned becomes FORCED_IN; pinned states swap. If the re-solve fails
    /// the session keeps its previous pins and answer.
    pub fn toggle_pin(
        &mut self,
        key: &CandidateKey,
        ctx: &SolveContext,
    ) -> Result<&SolveOutcome, SolveError> {
        let mut pins = self.pins.clone();
        let state = pins.toggle(key.clone());
        info!(candidate = %key, state = ?state, "pin toggled");
        self.commit(pins, ctx)
    }

    /// Sets one candidate's pin explicitly and re-solves.
    pub fn set_pin(
        &mut self,
        key: &CandidateKey,
        state: PinState,
        ctx: &SolveContext,
    ) -> Result<&SolveOutcome, SolveError> {
        let mut pins = self.pins.clone();
        pins.set(key.clone(), state);
        self.commit(pins, ctx)
    }

    /// Removes one candidate's pin and re-solves.
    pub fn clear_pin(
        &mut self,
        key: &CandidateKey,
        ctx: &SolveContext,
    ) -> Result<&SolveOutcome, SolveError> {
        let mut pins = self.pins.clone();
        pins.clear(key);
        self.commit(pins, ctx)
    }

    /// Switches the session to another pool, dropping pins and the last
    /// answer. The solver is kept.
    pub fn swap_pool(&mut self, pool: CandidatePool) {
        info!(
            from = %self.pool.discipline_id(),
            to = %pool.discipline_id(),
            "session pool swapped"
        );
        self.pool = pool;
        self.pins = PinSet::new();
        self.current = None;
        self.solved_under = PinSet::new();
    }

    /// Members of the last answer that were free when it was solved.
    ///
    /// A candidate that was only selected because it was FORCED_IN must not
    /// carry over once that pin is gone.
    fn warm_start(&self) -> Option<Solution> {
        let current = self.current.as_ref()?;
        Some(Solution::from_candidates(
            current
                .solution
                .selected()
                .iter()
                .filter(|c| self.solved_under.get(c.key()).is_none())
                .cloned(),
        ))
    }

    /// Solves under `pins` and adopts both only on success.
    fn commit(&mut self, pins: PinSet, ctx: &SolveContext) -> Result<&SolveOutcome, SolveError> {
        let warm = self.warm_start();
        let outcome = self
            .solver
            .solve(&self.pool, &pins.to_pins(), warm.as_ref(), ctx)?;
        self.solved_under = pins.clone();
        self.pins = pins;
        Ok(&*self.current.insert(outcome))
    }
}
