//! Persisted run records.

use crate::error::SolveError;
use crate::model::{ConstraintSet, DisciplineId};
use crate::solver::{StopReason, Strategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an [`OptimizationRun`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Lifecycle state of a run.
///
/// `Pending → Running → {Completed, Failed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }

    /// Whether a solution is attached in this state.
    pub fn has_solution(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Cancelled)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStatus::Pending => "PENDING",
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
            RunStatus::Cancelled => "CANCELLED",
        };
        f.write_str(name)
    }
}

/// Why a run ended FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    DataUnavailable,
    PinConflict,
    InvalidInput,
    /// Worker panic, store failure or stale heartbeat.
    Internal,
}

impl From<&SolveError> for FailureKind {
    fn from(err: &SolveError) -> Self {
        match err {
            SolveError::DataUnavailable { .. } => FailureKind::DataUnavailable,
            SolveError::PinConflict(_) => FailureKind::PinConflict,
            SolveError::InvalidInput(_) | SolveError::InvalidConfig(_) => {
                FailureKind::InvalidInput
            }
            SolveError::Store(_) => FailureKind::Internal,
        }
    }
}

/// A persisted optimization job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub id: RunId,
    pub discipline_id: DisciplineId,
    pub strategy: Strategy,
    pub status: RunStatus,
    pub progress_percent: f64,
    /// Best objective value reported so far. Never decreases.
    pub best_score: Option<f64>,
    /// Repository key of the attached solution.
    pub best_solution_ref: Option<RunId>,
    pub iterations: usize,
    pub stop: Option<StopReason>,
    pub created_on: DateTime<Utc>,
    pub started_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
    /// Last sign of life from the worker.
    pub heartbeat: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub failure_kind: Option<FailureKind>,
    /// Rules the attached solution was solved under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintSet>,
}

impl OptimizationRun {
    pub fn pending(id: RunId, discipline_id: DisciplineId, strategy: Strategy) -> Self {
        Self {
            id,
            discipline_id,
            strategy,
            status: RunStatus::Pending,
            progress_percent: 0.0,
            best_score: None,
            best_solution_ref: None,
            iterations: 0,
            stop: None,
            created_on: Utc::now(),
            started_on: None,
            finished_on: None,
            heartbeat: None,
            error_message: None,
            failure_kind: None,
            constraints: None,
        }
    }

    /// Raises progress and best score, never lowering either.
    pub fn record_progress(&mut self, percent: f64, best_score: f64, at: DateTime<Utc>) {
        self.progress_percent = self.progress_percent.max(percent.clamp(0.0, 100.0));
        self.best_score = Some(self.best_score.map_or(best_score, |s| s.max(best_score)));
        self.heartbeat = Some(at);
    }

    pub fn fail(&mut self, kind: FailureKind, message: impl Into<String>, at: DateTime<Utc>) {
        self.status = RunStatus::Failed;
        self.failure_kind = Some(kind);
        self.error_message = Some(message.into());
        self.finished_on = Some(at);
    }
}

/// Snapshot returned by progress queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunProgress {
    pub status: RunStatus,
    pub progress_percent: f64,
    pub best_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Violation, ViolationKind};

    #[test]
    fn test_progress_is_monotone() {
        let mut run = OptimizationRun::pending(RunId(1), DisciplineId::from("x"), Strategy::Genetic);
        let now = Utc::now();
        run.record_progress(40.0, 100.0, now);
        run.record_progress(30.0, 90.0, now);
        assert_eq!(run.progress_percent, 40.0);
        assert_eq!(run.best_score, Some(100.0));
        run.record_progress(250.0, 120.0, now);
        assert_eq!(run.progress_percent, 100.0);
        assert_eq!(run.best_score, Some(120.0));
    }

    #[test]
    fn test_failure_kind_mapping() {
        let err = SolveError::PinConflict(Violation::new(ViolationKind::PinConflict, "x", vec![]));
        assert_eq!(FailureKind::from(&err), FailureKind::PinConflict);
        let err = SolveError::InvalidConfig("bad".into());
        assert_eq!(FailureKind::from(&err), FailureKind::InvalidInput);
    }

    #[test]
    fn test_status_json() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Cancelled).unwrap(),
            "\"CANCELLED\""
        );
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(!RunStatus::Failed.has_solution());
        assert_eq!(RunId(7).to_string(), "run-7");
    }
}
