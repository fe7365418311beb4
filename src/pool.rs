//! Candidate pool construction.
//!
//! [`PoolBuilder`] reads eligible (publication, author) rows for one
//! discipline and period from a [`BibliographicStore`], filters and validates
//! them, and attaches the discipline's [`ConstraintSet`]. The result is a
//! [`CandidatePool`], the input to every solver.
//!
//! The store is a read-only collaborator. [`InMemoryStore`] is the bundled
//! implementation, loaded from a JSON document:
//!
//! ```json
//! {
//!   "disciplines": [
//!     { "discipline_id": "chemistry", "headcount": 14.0, "sanctions": 0.0,
//!       "author_limits": [ { "author_id": 7, "total": 3.0, "monograph": 1.0 } ] }
//!   ],
//!   "candidates": [
//!     { "publication_id": "p-1", "author_id": 7, "discipline_id": "chemistry",
//!       "points": 140.0, "participation_share": 1.0, "category": "ARTICLE", "year": 2023 }
//!   ]
//! }
//! ```

use crate::error::{ModelError, SolveError, StoreError};
use crate::model::{
    AuthorCaps, AuthorId, Candidate, CandidateKey, CandidateRecord, ConstraintSet, DisciplineId,
    EvaluationPeriod,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Author-specific participation limits configured in the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthorLimit {
    pub author_id: AuthorId,
    pub total: f64,
    pub monograph: f64,
}

/// Staffing data of one discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineProfile {
    pub discipline_id: DisciplineId,
    /// Registered research-staff headcount. `None` when never reported.
    #[serde(default)]
    pub headcount: Option<f64>,
    /// Participation units deducted from the quota.
    #[serde(default)]
    pub sanctions: f64,
    #[serde(default)]
    pub author_limits: Vec<AuthorLimit>,
}

impl DisciplineProfile {
    pub fn new(discipline_id: impl Into<DisciplineId>, headcount: f64) -> Self {
        Self {
            discipline_id: discipline_id.into(),
            headcount: Some(headcount),
            sanctions: 0.0,
            author_limits: Vec::new(),
        }
    }
}

/// Read-only source of candidate rows and discipline profiles.
pub trait BibliographicStore: Send + Sync {
    /// Every discipline known to the store.
    fn disciplines(&self) -> Result<Vec<DisciplineSummary>, StoreError>;

    /// Staffing data for a discipline, `None` if the store has none.
    fn profile(&self, discipline: &DisciplineId) -> Result<Option<DisciplineProfile>, StoreError>;

    /// Raw candidate rows for a discipline whose year falls in `period`.
    fn candidate_rows(
        &self,
        discipline: &DisciplineId,
        period: EvaluationPeriod,
    ) -> Result<Vec<CandidateRecord>, StoreError>;
}

/// Discipline listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisciplineSummary {
    pub discipline_id: DisciplineId,
    pub headcount: Option<f64>,
}

/// JSON-backed store held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryStore {
    #[serde(default)]
    disciplines: Vec<DisciplineProfile>,
    #[serde(default)]
    candidates: Vec<CandidateRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Adds or replaces a discipline profile.
    pub fn with_profile(mut self, profile: DisciplineProfile) -> Self {
        self.disciplines
            .retain(|p| p.discipline_id != profile.discipline_id);
        self.disciplines.push(profile);
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = CandidateRecord>) -> Self {
        self.candidates.extend(rows);
        self
    }
}

impl BibliographicStore for InMemoryStore {
    fn disciplines(&self) -> Result<Vec<DisciplineSummary>, StoreError> {
        let mut out: Vec<DisciplineSummary> = self
            .disciplines
            .iter()
            .map(|p| DisciplineSummary {
                discipline_id: p.discipline_id.clone(),
                headcount: p.headcount,
            })
            .collect();
        out.sort_by(|a, b| a.discipline_id.cmp(&b.discipline_id));
        Ok(out)
    }

    fn profile(&self, discipline: &DisciplineId) -> Result<Option<DisciplineProfile>, StoreError> {
        Ok(self
            .disciplines
            .iter()
            .find(|p| &p.discipline_id == discipline)
            .cloned())
    }

    fn candidate_rows(
        &self,
        discipline: &DisciplineId,
        period: EvaluationPeriod,
    ) -> Result<Vec<CandidateRecord>, StoreError> {
        Ok(self
            .candidates
            .iter()
            .filter(|r| &r.discipline_id == discipline && period.contains(r.year))
            .cloned()
            .collect())
    }
}

/// Pool construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Participation units granted per registered staff member.
    pub quota_multiplier: f64,
    /// Rows with a smaller participation share are not candidates.
    pub min_share: f64,
    /// Regulatory ceiling on an author's total participation.
    pub author_cap: f64,
    /// Regulatory ceiling on an author's monograph participation.
    pub monograph_cap: f64,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            quota_multiplier: 3.0,
            min_share: 0.1,
            author_cap: ConstraintSet::DEFAULT_AUTHOR_CAP,
            monograph_cap: ConstraintSet::DEFAULT_MONOGRAPH_CAP,
        }
    }
}

impl PoolOptions {
    pub fn with_quota_multiplier(mut self, multiplier: f64) -> Self {
        self.quota_multiplier = multiplier;
        self
    }

    pub fn with_min_share(mut self, min_share: f64) -> Self {
        self.min_share = min_share;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.quota_multiplier.is_finite() || self.quota_multiplier <= 0.0 {
            return Err("quota_multiplier must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.min_share) {
            return Err("min_share must lie in [0, 1]".into());
        }
        if self.monograph_cap < 0.0 || self.monograph_cap > self.author_cap {
            return Err("monograph_cap must lie in [0, author_cap]".into());
        }
        Ok(())
    }
}

/// Candidates of one discipline and period with the rules they are judged by.
///
/// Candidates are sorted by key and unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidatePool {
    discipline_id: DisciplineId,
    period: EvaluationPeriod,
    candidates: Vec<Candidate>,
    constraints: ConstraintSet,
}

impl CandidatePool {
    /// Builds a pool from already validated candidates.
    ///
    /// Rejects candidates of another discipline and duplicate keys.
    pub fn new(
        discipline_id: DisciplineId,
        period: EvaluationPeriod,
        mut candidates: Vec<Candidate>,
        constraints: ConstraintSet,
    ) -> Result<Self, ModelError> {
        constraints.validate()?;
        candidates.sort_by(|a, b| a.key().cmp(b.key()));
        for pair in candidates.windows(2) {
            if pair[0].key() == pair[1].key() {
                return Err(ModelError::DuplicateAssignment(pair[0].key().clone()));
            }
        }
        if let Some(foreign) = candidates
            .iter()
            .find(|c| c.discipline_id() != &discipline_id)
        {
            return Err(ModelError::ForeignDiscipline {
                key: foreign.key().clone(),
                expected: discipline_id,
                found: foreign.discipline_id().clone(),
            });
        }
        Ok(Self {
            discipline_id,
            period,
            candidates,
            constraints,
        })
    }

    pub fn discipline_id(&self) -> &DisciplineId {
        &self.discipline_id
    }

    pub fn period(&self) -> EvaluationPeriod {
        self.period
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn index_of(&self, key: &CandidateKey) -> Option<usize> {
        self.candidates.binary_search_by(|c| c.key().cmp(key)).ok()
    }

    pub fn get(&self, key: &CandidateKey) -> Option<&Candidate> {
        self.index_of(key).map(|i| &self.candidates[i])
    }

    /// Score of selecting every candidate, ignoring all rules.
    pub fn upper_bound(&self) -> f64 {
        crate::objective::score_candidates(&self.candidates)
    }
}

/// Builds [`CandidatePool`]s from a store.
#[derive(Debug)]
pub struct PoolBuilder<'a, S: BibliographicStore + ?Sized> {
    store: &'a S,
    options: PoolOptions,
}

impl<'a, S: BibliographicStore + ?Sized> PoolBuilder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            options: PoolOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PoolOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Reads and filters the candidates of `discipline` for `period`.
    ///
    /// # Errors
    ///
    /// [`SolveError::DataUnavailable`] when the discipline has no profile or a
    /// zero headcount, [`SolveError::InvalidInput`] for malformed rows.
    pub fn build(
        &self,
        discipline: &DisciplineId,
        period: EvaluationPeriod,
    ) -> Result<CandidatePool, SolveError> {
        self.options.validate().map_err(SolveError::InvalidConfig)?;

        let unavailable = |reason: &str| SolveError::DataUnavailable {
            discipline: discipline.clone(),
            reason: reason.to_string(),
        };
        let profile = self
            .store
            .profile(discipline)?
            .ok_or_else(|| unavailable("discipline has no staffing profile"))?;
        let headcount = match profile.headcount {
            Some(h) if h.is_finite() && h > 0.0 => h,
            Some(_) => return Err(unavailable("registered headcount is zero")),
            None => return Err(unavailable("registered headcount is missing")),
        };
        let quota = (self.options.quota_multiplier * headcount - profile.sanctions).max(0.0);
        let constraints = self.constraints(quota, &profile)?;

        let rows = self.store.candidate_rows(discipline, period)?;
        let total_rows = rows.len();
        let mut by_key: BTreeMap<CandidateKey, Candidate> = BTreeMap::new();
        for row in rows {
            if &row.discipline_id != discipline || !period.contains(row.year) {
                continue;
            }
            if row.points == 0.0 || row.participation_share < self.options.min_share {
                continue;
            }
            let candidate = Candidate::try_from(row)?;
            match by_key.get(candidate.key()) {
                Some(existing) => {
                    warn!(
                        discipline = %discipline,
                        candidate = %candidate.key(),
                        "duplicate candidate row, keeping the higher value"
                    );
                    if candidate.weighted_points() > existing.weighted_points() {
                        by_key.insert(candidate.key().clone(), candidate);
                    }
                }
                None => {
                    by_key.insert(candidate.key().clone(), candidate);
                }
            }
        }

        let candidates: Vec<Candidate> = by_key.into_values().collect();
        debug!(
            discipline = %discipline,
            period = %period,
            rows = total_rows,
            candidates = candidates.len(),
            quota,
            "candidate pool built"
        );
        Ok(CandidatePool::new(
            discipline.clone(),
            period,
            candidates,
            constraints,
        )?)
    }

    /// Discipline rules with custom author limits clamped to the ceilings.
    fn constraints(
        &self,
        quota: f64,
        profile: &DisciplineProfile,
    ) -> Result<ConstraintSet, ModelError> {
        let mut set = ConstraintSet::new(
            quota,
            self.options.author_cap,
            self.options.monograph_cap,
        )?;
        for limit in &profile.author_limits {
            let total = limit.total.min(self.options.author_cap);
            let monograph = limit.monograph.min(self.options.monograph_cap).min(total);
            set = set.with_author_override(limit.author_id, AuthorCaps::new(total, monograph))?;
        }
        Ok(set)
    }
}
