//! Whole-institution batch: one run per eligible discipline.

use super::controller::{RunController, RunRequest};
use super::types::OptimizationRun;
use crate::error::RunError;
use crate::model::{DisciplineId, EvaluationPeriod};
use crate::solver::Solver;
use serde::Serialize;
use tracing::{info, warn};

/// Disciplines below this headcount are not evaluated.
pub const DEFAULT_MIN_HEADCOUNT: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct InstitutionRequest {
    pub solver: Solver,
    pub period: EvaluationPeriod,
    pub min_headcount: f64,
}

impl InstitutionRequest {
    pub fn new(solver: Solver) -> Self {
        Self {
            solver,
            period: EvaluationPeriod::default(),
            min_headcount: DEFAULT_MIN_HEADCOUNT,
        }
    }

    pub fn with_period(mut self, period: EvaluationPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_min_headcount(mut self, min_headcount: f64) -> Self {
        self.min_headcount = min_headcount;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDiscipline {
    pub discipline_id: DisciplineId,
    pub reason: String,
}

/// Outcome of [`solve_institution`].
#[derive(Debug, Clone, Serialize)]
pub struct InstitutionReport {
    /// Final records, ordered by discipline.
    pub runs: Vec<OptimizationRun>,
    pub skipped: Vec<SkippedDiscipline>,
}

/// Starts a run for every discipline whose headcount reaches
/// `request.min_headcount`, then waits for all of them.
///
/// Runs execute concurrently. A discipline that already has an active run
/// is skipped rather than failing the batch; individual runs may still end
/// FAILED and are reported as such.
pub fn solve_institution(
    controller: &RunController,
    request: &InstitutionRequest,
) -> Result<InstitutionReport, RunError> {
    let mut started = Vec::new();
    let mut skipped = Vec::new();
    for summary in controller.store().disciplines()? {
        let eligible = summary
            .headcount
            .is_some_and(|h| h >= request.min_headcount);
        if !eligible {
            skipped.push(SkippedDiscipline {
                reason: match summary.headcount {
                    Some(h) => format!("headcount {h} below {}", request.min_headcount),
                    None => "headcount missing".to_string(),
                },
                discipline_id: summary.discipline_id,
            });
            continue;
        }
        let run = RunRequest::new(summary.discipline_id.clone(), request.solver.clone())
            .with_period(request.period);
        match controller.start(run) {
            Ok(id) => started.push(id),
            Err(RunError::AlreadyRunning { discipline, run }) => {
                warn!(discipline = %discipline, run_id = %run, "discipline busy, skipped");
                skipped.push(SkippedDiscipline {
                    discipline_id: discipline,
                    reason: format!("already running as {run}"),
                });
            }
            Err(err) => return Err(err),
        }
    }

    let mut runs = started
        .into_iter()
        .map(|id| controller.wait(id))
        .collect::<Result<Vec<_>, _>>()?;
    runs.sort_by(|a, b| a.discipline_id.cmp(&b.discipline_id));
    info!(
        runs = runs.len(),
        skipped = skipped.len(),
        strategy = %request.solver.strategy(),
        "institution batch finished"
    );
    Ok(InstitutionReport { runs, skipped })
}
