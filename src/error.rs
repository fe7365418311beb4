//! Error taxonomy.
//!
//! Ordinary infeasibility is not an error: the constraint model reports it
//! as a [`Feasibility`](crate::constraint::Feasibility) value. The types here
//! cover malformed input, configuration-level impossibility and
//! infrastructure failures.

use crate::config::ConfigError;
use crate::constraint::Violation;
use crate::model::{AuthorId, CandidateKey, DisciplineId};
use crate::run::{FailureKind, RunId};
use crate::telemetry::TelemetryError;

/// Malformed input data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("candidate {key}: points must be finite and non-negative, got {points}")]
    InvalidPoints { key: CandidateKey, points: f64 },
    #[error("candidate {key}: participation share must lie in (0, 1], got {share}")]
    InvalidShare { key: CandidateKey, share: f64 },
    #[error("duplicate assignment of publication {} to author {}", .0.publication_id, .0.author_id)]
    DuplicateAssignment(CandidateKey),
    #[error("invalid caps for {scope}: {reason}")]
    InvalidCaps { scope: String, reason: String },
    #[error("global quota must be finite and non-negative, got {0}")]
    InvalidQuota(f64),
    #[error("candidate {key} belongs to discipline {found}, pool is for {expected}")]
    ForeignDiscipline {
        key: CandidateKey,
        expected: DisciplineId,
        found: DisciplineId,
    },
    #[error("author {0} has no caps and no discipline default applies")]
    MissingCaps(AuthorId),
}

/// Failure reading the bibliographic store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors that abort a solve.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("data unavailable for discipline {discipline}: {reason}")]
    DataUnavailable {
        discipline: DisciplineId,
        reason: String,
    },
    #[error("pin conflict: {0}")]
    PinConflict(Violation),
    #[error(transparent)]
    InvalidInput(#[from] ModelError),
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the run controller.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("discipline {discipline} already has an active run ({run})")]
    AlreadyRunning { discipline: DisciplineId, run: RunId },
    #[error("run {0} not found")]
    NotFound(RunId),
    #[error("run repository error: {0}")]
    Repository(String),
    #[error("failed to spawn worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("worker for run {0} panicked outside the solve")]
    WorkerPanicked(RunId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Top-level error surfaced by the command-line entry points.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("run {run} ended {status}: {message}")]
    RunFailed {
        run: RunId,
        status: String,
        message: String,
        kind: Option<FailureKind>,
    },
    #[error("missing input: {0}")]
    MissingInput(String),
}

impl AppError {
    /// Process exit code for this error.
    ///
    /// `2` for missing quota data, `3` for pin conflicts, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Solve(SolveError::DataUnavailable { .. }) => 2,
            AppError::Solve(SolveError::PinConflict(_)) => 3,
            AppError::RunFailed {
                kind: Some(FailureKind::DataUnavailable),
                ..
            } => 2,
            AppError::RunFailed {
                kind: Some(FailureKind::PinConflict),
                ..
            } => 3,
            _ => 1,
        }
    }
}
