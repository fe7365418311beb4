//! Run persistence.

use super::types::{OptimizationRun, RunId, RunStatus};
use crate::error::RunError;
use crate::model::Solution;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Storage of runs and their solutions.
///
/// State changes go through [`transition`](RunRepository::transition), which
/// applies an update only while the run is in the expected state. That keeps
/// a late worker from overwriting a run the stale sweep has already failed.
pub trait RunRepository: Send + Sync {
    fn insert(&self, run: OptimizationRun) -> Result<(), RunError>;

    fn fetch(&self, id: RunId) -> Result<Option<OptimizationRun>, RunError>;

    /// All runs, ordered by id.
    fn list(&self) -> Result<Vec<OptimizationRun>, RunError>;

    /// Applies `update` if the run is currently in `expected`.
    ///
    /// Returns whether the update was applied.
    fn transition(
        &self,
        id: RunId,
        expected: RunStatus,
        update: &mut dyn FnMut(&mut OptimizationRun),
    ) -> Result<bool, RunError>;

    fn save_solution(&self, id: RunId, solution: &Solution) -> Result<(), RunError>;

    fn solution(&self, id: RunId) -> Result<Option<Solution>, RunError>;
}

/// Repository held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRunRepository {
    runs: Mutex<BTreeMap<RunId, OptimizationRun>>,
    solutions: Mutex<BTreeMap<RunId, Solution>>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn runs(&self) -> MutexGuard<'_, BTreeMap<RunId, OptimizationRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn solutions(&self) -> MutexGuard<'_, BTreeMap<RunId, Solution>> {
        self.solutions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RunRepository for InMemoryRunRepository {
    fn insert(&self, run: OptimizationRun) -> Result<(), RunError> {
        let mut runs = self.runs();
        if runs.contains_key(&run.id) {
            return Err(RunError::Repository(format!("{} already exists", run.id)));
        }
        runs.insert(run.id, run);
        Ok(())
    }

    fn fetch(&self, id: RunId) -> Result<Option<OptimizationRun>, RunError> {
        Ok(self.runs().get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<OptimizationRun>, RunError> {
        Ok(self.runs().values().cloned().collect())
    }

    fn transition(
        &self,
        id: RunId,
        expected: RunStatus,
        update: &mut dyn FnMut(&mut OptimizationRun),
    ) -> Result<bool, RunError> {
        let mut runs = self.runs();
        let run = runs.get_mut(&id).ok_or(RunError::NotFound(id))?;
        if run.status != expected {
            return Ok(false);
        }
        update(run);
        Ok(true)
    }

    fn save_solution(&self, id: RunId, solution: &Solution) -> Result<(), RunError> {
        self.solutions().insert(id, solution.clone());
        Ok(())
    }

    fn solution(&self, id: RunId) -> Result<Option<Solution>, RunError> {
        Ok(self.solutions().get(&id).cloned())
    }
}
