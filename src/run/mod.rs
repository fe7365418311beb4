//! Run controller and persistence.
//!
//! An [`OptimizationRun`] moves `PENDING → RUNNING → {COMPLETED, FAILED,
//! CANCELLED}`. The [`RunController`] executes each run on its own worker
//! thread, holding a per-discipline lock ([`DisciplineLocks`]) for the
//! lifetime of the worker, and records progress, heartbeats and the final
//! solution through a [`RunRepository`].
//!
//! Failures inside a run (missing quota data, pin conflicts, a panicking
//! solver) end the run FAILED with a [`FailureKind`]; they never escape the
//! worker. Runs whose worker stops sending heartbeats are reclaimed by
//! [`RunController::sweep_stale`].

mod controller;
mod institution;
mod lock;
mod repository;
mod types;

pub use controller::{RunController, RunRequest};
pub use institution::{
    solve_institution, InstitutionReport, InstitutionRequest, SkippedDiscipline,
    DEFAULT_MIN_HEADCOUNT,
};
pub use lock::{DisciplineLock, DisciplineLocks};
pub use repository::{InMemoryRunRepository, RunRepository};
pub use types::{FailureKind, OptimizationRun, RunId, RunProgress, RunStatus};
