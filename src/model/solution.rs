//! Selected assignments produced by a solve.

use super::candidate::{AuthorId, Candidate, CandidateKey};
use crate::objective;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Participation consumed by one author within a solution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorUsage {
    /// Participation units across all categories.
    pub total: f64,
    /// Participation units on monographs.
    pub monograph: f64,
    /// Weighted points credited to the author.
    pub points: f64,
}

impl AuthorUsage {
    pub fn add(&mut self, candidate: &Candidate) {
        let share = candidate.participation_share();
        self.total += share;
        if candidate.is_monograph() {
            self.monograph += share;
        }
        self.points += candidate.weighted_points();
    }

    pub fn remove(&mut self, candidate: &Candidate) {
        let share = candidate.participation_share();
        self.total -= share;
        if candidate.is_monograph() {
            self.monograph -= share;
        }
        self.points -= candidate.weighted_points();
    }
}

/// A set of selected candidates with its objective value.
///
/// Candidates are kept sorted by [`CandidateKey`], so two solutions selecting
/// the same assignments serialize identically. Deserialization rebuilds
/// through [`Solution::from_candidates`], so the order and the score never
/// come from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SolutionRecord")]
pub struct Solution {
    selected: Vec<Candidate>,
    total_score: f64,
}

/// Wire form of a [`Solution`]; a stored `total_score` is ignored.
#[derive(Deserialize)]
struct SolutionRecord {
    selected: Vec<Candidate>,
}

impl From<SolutionRecord> for Solution {
    fn from(record: SolutionRecord) -> Self {
        Self::from_candidates(record.selected)
    }
}

impl Solution {
    /// Builds a solution from any collection of candidates.
    ///
    /// Does not check feasibility; see [`crate::constraint::validate`].
    pub fn from_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut selected: Vec<Candidate> = candidates.into_iter().collect();
        selected.sort_by(|a, b| a.key().cmp(b.key()));
        let total_score = objective::score_candidates(&selected);
        Self {
            selected,
            total_score,
        }
    }

    pub fn empty() -> Self {
        Self {
            selected: Vec::new(),
            total_score: 0.0,
        }
    }

    pub fn selected(&self) -> &[Candidate] {
        &self.selected
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, key: &CandidateKey) -> bool {
        self.selected
            .binary_search_by(|c| c.key().cmp(key))
            .is_ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CandidateKey> {
        self.selected.iter().map(Candidate::key)
    }

    /// Total participation units consumed.
    pub fn participation_used(&self) -> f64 {
        self.selected
            .iter()
            .map(Candidate::participation_share)
            .sum()
    }

    /// Participation consumed per author, derived on demand.
    pub fn per_author_used(&self) -> BTreeMap<AuthorId, AuthorUsage> {
        let mut usage: BTreeMap<AuthorId, AuthorUsage> = BTreeMap::new();
        for candidate in &self.selected {
            usage.entry(candidate.author_id()).or_default().add(candidate);
        }
        usage
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::empty()
    }
}
