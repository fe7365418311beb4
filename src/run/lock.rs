//! Per-discipline mutual exclusion.

use super::types::RunId;
use crate::error::RunError;
use crate::model::DisciplineId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Named locks keyed by discipline: at most one active run per discipline.
///
/// Cloning shares the lock table.
#[derive(Debug, Clone, Default)]
pub struct DisciplineLocks {
    held: Arc<Mutex<HashMap<DisciplineId, RunId>>>,
}

impl DisciplineLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<DisciplineId, RunId>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `discipline` for `run`.
    ///
    /// # Errors
    ///
    /// [`RunError::AlreadyRunning`] naming the current holder.
    pub fn try_acquire(
        &self,
        discipline: &DisciplineId,
        run: RunId,
    ) -> Result<DisciplineLock, RunError> {
        let mut table = self.table();
        if let Some(&holder) = table.get(discipline) {
            return Err(RunError::AlreadyRunning {
                discipline: discipline.clone(),
                run: holder,
            });
        }
        table.insert(discipline.clone(), run);
        Ok(DisciplineLock {
            locks: self.clone(),
            discipline: discipline.clone(),
            run,
        })
    }

    pub fn holder(&self, discipline: &DisciplineId) -> Option<RunId> {
        self.table().get(discipline).copied()
    }

    /// Releases `discipline` if `run` still holds it.
    pub fn release(&self, discipline: &DisciplineId, run: RunId) -> bool {
        let mut table = self.table();
        if table.get(discipline) == Some(&run) {
            table.remove(discipline);
            true
        } else {
            false
        }
    }
}

/// Held discipline lock. Released on drop unless another run has since
/// claimed the discipline.
#[derive(Debug)]
pub struct DisciplineLock {
    locks: DisciplineLocks,
    discipline: DisciplineId,
    run: RunId,
}

impl DisciplineLock {
    pub fn discipline(&self) -> &DisciplineId {
        &self.discipline
    }

    pub fn run(&self) -> RunId {
        self.run
    }
}

impl Drop for DisciplineLock {
    fn drop(&mut self) {
        self.locks.release(&self.discipline, self.run);
    }
}
