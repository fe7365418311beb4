//! Objective function and density ranking.
//!
//! The objective of a solution is the sum of `points * participation_share`
//! over its selected candidates. All weights are non-negative, so adding a
//! feasible candidate never lowers the score; the greedy and repair passes
//! rely on this.

use crate::model::{Candidate, Category, Solution};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Objective value of a solution.
pub fn score(solution: &Solution) -> f64 {
    score_candidates(solution.selected())
}

/// Objective value of an arbitrary candidate slice.
pub fn score_candidates(candidates: &[Candidate]) -> f64 {
    candidates.iter().map(Candidate::weighted_points).sum()
}

/// Fixed ranking cost per category, used by [`CostModel::PerCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryUnits {
    pub article: f64,
    pub monograph: f64,
    pub chapter: f64,
    pub other: f64,
}

impl Default for CategoryUnits {
    fn default() -> Self {
        Self {
            article: 1.0,
            monograph: 1.0,
            chapter: 1.0,
            other: 1.0,
        }
    }
}

impl CategoryUnits {
    pub fn unit(&self, category: Category) -> f64 {
        match category {
            Category::Article => self.article,
            Category::Monograph => self.monograph,
            Category::Chapter => self.chapter,
            Category::Other => self.other,
        }
    }
}

/// Denominator of the score-density ranking.
///
/// Only the ranking changes with the cost model; capacity is always charged
/// in participation units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostModel {
    /// Cost is the participation share, so density equals raw points.
    #[default]
    Share,
    /// Cost is a fixed unit per category.
    PerCategory(CategoryUnits),
}

impl CostModel {
    /// Score density of a candidate under this cost model.
    pub fn density(&self, candidate: &Candidate) -> f64 {
        let cost = match self {
            CostModel::Share => candidate.participation_share(),
            CostModel::PerCategory(units) => units.unit(candidate.category()),
        };
        if cost > 0.0 {
            candidate.weighted_points() / cost
        } else {
            f64::INFINITY
        }
    }

    /// Greedy admission order: density descending, then points descending,
    /// then candidate key ascending.
    pub fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        self.density(b)
            .total_cmp(&self.density(a))
            .then_with(|| b.points().total_cmp(&a.points()))
            .then_with(|| a.key().cmp(b.key()))
    }

    /// Validates the cost parameters.
    pub fn validate(&self) -> Result<(), String> {
        if let CostModel::PerCategory(units) = self {
            for (name, unit) in [
                ("article", units.article),
                ("monograph", units.monograph),
                ("chapter", units.chapter),
                ("other", units.other),
            ] {
                if !unit.is_finite() || unit <= 0.0 {
                    return Err(format!("{name} cost unit must be positive"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateKey, DisciplineId};

    fn cand(publication: &str, points: f64, share: f64, category: Category) -> Candidate {
        Candidate::new(
            CandidateKey::new(publication, 1),
            DisciplineId::from("math"),
            points,
            share,
            category,
            2024,
        )
        .unwrap()
    }

    #[test]
    fn test_score_sums_weighted_points() {
        let s = Solution::from_candidates(vec![
            cand("a", 100.0, 0.5, Category::Article),
            cand("b", 20.0, 1.0, Category::Article),
        ]);
        assert!((score(&s) - 70.0).abs() < 1e-12);
        assert_eq!(score(&Solution::empty()), 0.0);
    }

    #[test]
    fn test_share_density_is_points() {
        let c = cand("a", 140.0, 0.25, Category::Article);
        assert!((CostModel::Share.density(&c) - 140.0).abs() < 1e-12);
    }

    #[test]
    fn test_per_category_density() {
        let units = CategoryUnits {
            monograph: 2.0,
            ..CategoryUnits::default()
        };
        let model = CostModel::PerCategory(units);
        let mono = cand("m", 200.0, 1.0, Category::Monograph);
        assert!((model.density(&mono) - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_compare_tie_breaks() {
        let model = CostModel::Share;
        let high = cand("z", 100.0, 1.0, Category::Article);
        let low = cand("a", 50.0, 1.0, Category::Article);
        assert_eq!(model.compare(&high, &low), Ordering::Less);

        // Equal density and points: key ascending decides.
        let a = cand("a", 100.0, 0.5, Category::Article);
        let b = cand("b", 100.0, 1.0, Category::Article);
        assert_eq!(model.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_validate_units() {
        assert!(CostModel::Share.validate().is_ok());
        let bad = CostModel::PerCategory(CategoryUnits {
            chapter: 0.0,
            ..CategoryUnits::default()
        });
        assert!(bad.validate().is_err());
    }
}
