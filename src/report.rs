//! Result artifact consumed by downstream reporting.
//!
//! One JSON document per solved discipline: the strategy, the final score,
//! every selected assignment and what each author consumed against their
//! caps.

use crate::error::AppError;
use crate::model::{
    AuthorId, Category, ConstraintSet, DisciplineId, EvaluationPeriod, PublicationId, Solution,
};
use crate::pool::CandidatePool;
use crate::run::{OptimizationRun, RunId, RunStatus};
use crate::solver::{SolveOutcome, StopReason, Strategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEntry {
    pub publication_id: PublicationId,
    pub author_id: AuthorId,
    pub category: Category,
    pub year: i32,
    pub points: f64,
    pub participation_share: f64,
    /// `points * participation_share`, the amount credited.
    pub weighted_points: f64,
}

/// Per-author consumption against the applicable caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub author_id: AuthorId,
    pub participation_used: f64,
    pub monograph_used: f64,
    pub points: f64,
    pub cap_total: f64,
    pub cap_monograph: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultArtifact {
    pub discipline_id: DisciplineId,
    pub period: EvaluationPeriod,
    pub strategy: Strategy,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopReason>,
    pub total_score: f64,
    pub participation_used: f64,
    pub global_quota_n: f64,
    pub selected: Vec<SelectedEntry>,
    pub authors: Vec<AuthorSummary>,
    pub generated_on: DateTime<Utc>,
}

impl ResultArtifact {
    /// Artifact for an in-process solve.
    pub fn from_outcome(pool: &CandidatePool, outcome: &SolveOutcome) -> Self {
        let status = if outcome.cancelled() {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        let mut artifact = Self::build(
            pool.discipline_id().clone(),
            pool.period(),
            outcome.strategy,
            status,
            &outcome.solution,
            pool.constraints(),
        );
        artifact.stop = Some(outcome.stop);
        artifact
    }

    /// Artifact for a finished controller run.
    pub fn from_run(
        run: &OptimizationRun,
        period: EvaluationPeriod,
        solution: &Solution,
        constraints: &ConstraintSet,
    ) -> Self {
        let mut artifact = Self::build(
            run.discipline_id.clone(),
            period,
            run.strategy,
            run.status,
            solution,
            constraints,
        );
        artifact.run_id = Some(run.id);
        artifact.stop = run.stop;
        artifact
    }

    fn build(
        discipline_id: DisciplineId,
        period: EvaluationPeriod,
        strategy: Strategy,
        status: RunStatus,
        solution: &Solution,
        constraints: &ConstraintSet,
    ) -> Self {
        let selected = solution
            .selected()
            .iter()
            .map(|c| SelectedEntry {
                publication_id: c.publication_id().clone(),
                author_id: c.author_id(),
                category: c.category(),
                year: c.year(),
                points: c.points(),
                participation_share: c.participation_share(),
                weighted_points: c.weighted_points(),
            })
            .collect();
        let authors = solution
            .per_author_used()
            .into_iter()
            .map(|(author_id, usage)| {
                let caps = constraints.caps_for(author_id);
                AuthorSummary {
                    author_id,
                    participation_used: usage.total,
                    monograph_used: usage.monograph,
                    points: usage.points,
                    cap_total: caps.total,
                    cap_monograph: caps.monograph,
                }
            })
            .collect();
        Self {
            discipline_id,
            period,
            strategy,
            status,
            run_id: None,
            stop: None,
            total_score: solution.total_score(),
            participation_used: solution.participation_used(),
            global_quota_n: constraints.global_quota_n,
            selected,
            authors,
            generated_on: Utc::now(),
        }
    }

    /// `{strategy}_{discipline}.json`
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.strategy, self.discipline_id)
    }

    /// Writes the artifact as pretty JSON.
    ///
    /// With no `output` the document goes to stdout. An existing directory
    /// receives [`file_name`](Self::file_name); any other path is written
    /// as-is, creating missing parent directories. Returns the file written.
    pub fn write(&self, output: Option<&Path>) -> Result<Option<PathBuf>, AppError> {
        let Some(output) = output else {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, self)?;
            writeln!(lock)?;
            return Ok(None);
        };
        let path = if output.is_dir() {
            output.join(self.file_name())
        } else {
            output.to_path_buf()
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        fs::write(&path, text)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greedy::GreedyConfig;
    use crate::model::{AuthorCaps, Candidate, CandidateKey};
    use crate::solver::{SolveContext, Solver};

    fn pool() -> CandidatePool {
        let c = |p: &str, a: u64, points: f64, share: f64, category: Category| {
            Candidate::new(
                CandidateKey::new(p, a),
                DisciplineId::from("philosophy"),
                points,
                share,
                category,
                2024,
            )
            .unwrap()
        };
        CandidatePool::new(
            DisciplineId::from("philosophy"),
            EvaluationPeriod::default(),
            vec![
                c("p1", 1, 200.0, 1.0, Category::Monograph),
                c("p2", 1, 100.0, 0.5, Category::Article),
                c("p3", 2, 70.0, 1.0, Category::Chapter),
            ],
            ConstraintSet::new(10.0, 4.0, 2.0)
                .unwrap()
                .with_author_override(AuthorId(2), AuthorCaps::new(1.5, 0.5))
                .unwrap(),
        )
        .unwrap()
    }

    fn artifact() -> ResultArtifact {
        let pool = pool();
        let outcome = Solver::Greedy(GreedyConfig::default())
            .solve(&pool, &[], None, &SolveContext::new())
            .unwrap();
        ResultArtifact::from_outcome(&pool, &outcome)
    }

    #[test]
    fn test_artifact_contents() {
        let artifact = artifact();
        assert_eq!(artifact.status, RunStatus::Completed);
        assert_eq!(artifact.selected.len(), 3);
        assert!((artifact.total_score - 320.0).abs() < 1e-9);
        assert!((artifact.participation_used - 2.5).abs() < 1e-9);
        assert_eq!(artifact.authors.len(), 2);
        let first = &artifact.authors[0];
        assert_eq!(first.author_id, AuthorId(1));
        assert!((first.participation_used - 1.5).abs() < 1e-9);
        assert!((first.monograph_used - 1.0).abs() < 1e-9);
        assert_eq!(artifact.authors[1].cap_total, 1.5);
        assert_eq!(artifact.file_name(), "greedy_philosophy.json");
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(artifact()).unwrap();
        assert_eq!(value["strategy"], "GREEDY");
        assert_eq!(value["status"], "COMPLETED");
        assert_eq!(value["selected"][0]["category"], "MONOGRAPH");
        assert!(value.get("run_id").is_none());
        assert_eq!(value["stop"], "COMPLETED");
    }

    #[test]
    fn test_write_into_directory() {
        let dir = std::env::temp_dir().join(format!("slot-report-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let artifact = artifact();
        let written = artifact.write(Some(&dir)).unwrap().unwrap();
        assert_eq!(written, dir.join("greedy_philosophy.json"));
        let back: ResultArtifact =
            serde_json::from_str(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(back.selected, artifact.selected);
        fs::remove_dir_all(&dir).unwrap();
    }
}
