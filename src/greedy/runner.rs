//! Single density-ordered admission pass.

use super::config::GreedyConfig;
use crate::model::Solution;
use crate::solver::{fill, PinnedPool};

/// Executes the greedy pass.
///
/// FORCED_IN candidates are charged first. The free candidates are then
/// visited by density descending (points descending, key ascending on ties)
/// and each is admitted iff it still fits. There is no backtracking, so the
/// result depends only on the pool, the pins and the warm start.
pub struct GreedyRunner;

impl GreedyRunner {
    pub fn run(
        pinned: &PinnedPool<'_>,
        config: &GreedyConfig,
        warm: Option<&Solution>,
    ) -> Solution {
        pinned.decode(&Self::select(pinned, config, warm))
    }

    /// Selection mask over the pool's candidates.
    pub fn select(
        pinned: &PinnedPool<'_>,
        config: &GreedyConfig,
        warm: Option<&Solution>,
    ) -> Vec<bool> {
        let order = pinned.ranked_free(&config.cost_model);
        let (mut tracker, mut mask) = pinned.base_state();

        if let Some(warm) = warm.filter(|_| config.warm_start) {
            let mut member = vec![false; mask.len()];
            for i in pinned.warm_members(warm) {
                member[i] = true;
            }
            let warm_order: Vec<usize> = order.iter().copied().filter(|&i| member[i]).collect();
            fill(&mut tracker, &mut mask, pinned, &warm_order);
        }

        fill(&mut tracker, &mut mask, pinned, &order);
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{validate, Feasibility};
    use crate::model::{
        Candidate, CandidateKey, Category, ConstraintSet, DisciplineId, EvaluationPeriod, Pin,
    };
    use crate::objective::{CategoryUnits, CostModel};
    use crate::pool::CandidatePool;

    fn cand(publication: &str, author: u64, points: f64, share: f64, category: Category) -> Candidate {
        Candidate::new(
            CandidateKey::new(publication, author),
            DisciplineId::from("geo"),
            points,
            share,
            category,
            2022,
        )
        .unwrap()
    }

    fn pool_of(candidates: Vec<Candidate>, rules: ConstraintSet) -> CandidatePool {
        CandidatePool::new(
            DisciplineId::from("geo"),
            EvaluationPeriod::default(),
            candidates,
            rules,
        )
        .unwrap()
    }

    fn two_authors() -> CandidatePool {
        pool_of(
            vec![
                cand("a1", 1, 100.0, 1.0, Category::Article),
                cand("a2", 1, 90.0, 1.0, Category::Article),
                cand("a3", 1, 10.0, 1.0, Category::Article),
                cand("b1", 2, 80.0, 1.0, Category::Article),
                cand("b2", 2, 70.0, 1.0, Category::Article),
                cand("b3", 2, 20.0, 1.0, Category::Article),
            ],
            ConstraintSet::new(5.0, 4.0, 2.0).unwrap(),
        )
    }

    #[test]
    fn test_drops_lowest_under_global_quota() {
        let pool = two_authors();
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let s = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        assert_eq!(s.len(), 5);
        assert!(!s.contains(&CandidateKey::new("a3", 1)));
        assert!((s.total_score() - 360.0).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic() {
        let pool = two_authors();
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let a = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        let b = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_pins_honored() {
        let pool = two_authors();
        let pins = vec![
            Pin::forced_in(CandidateKey::new("a3", 1)),
            Pin::forced_out(CandidateKey::new("a1", 1)),
        ];
        let pinned = PinnedPool::new(&pool, &pins).unwrap();
        let s = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        assert!(s.contains(&CandidateKey::new("a3", 1)));
        assert!(!s.contains(&CandidateKey::new("a1", 1)));
        assert_eq!(
            validate(&s, pool.constraints(), &pins).unwrap(),
            Feasibility::Ok
        );
    }

    #[test]
    fn test_author_and_monograph_caps() {
        let pool = pool_of(
            vec![
                cand("m1", 1, 200.0, 1.0, Category::Monograph),
                cand("m2", 1, 180.0, 1.0, Category::Monograph),
                cand("m3", 1, 160.0, 1.0, Category::Monograph),
                cand("x1", 1, 20.0, 1.0, Category::Article),
                cand("x2", 1, 15.0, 1.0, Category::Article),
                cand("x3", 1, 10.0, 1.0, Category::Article),
            ],
            ConstraintSet::new(20.0, 4.0, 2.0).unwrap(),
        );
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let s = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        let keys: Vec<String> = s.keys().map(|k| k.publication_id.to_string()).collect();
        assert_eq!(keys, vec!["m1", "m2", "x1", "x2"]);
    }

    #[test]
    fn test_warm_start_reuses_prior_members() {
        let pool = two_authors();
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let prior = Solution::from_candidates(vec![pool.candidates()[2].clone()]);
        let s = GreedyRunner::run(&pinned, &GreedyConfig::default(), Some(&prior));
        assert!(s.contains(&CandidateKey::new("a3", 1)));
        assert_eq!(s.len(), 5);

        let cold = GreedyConfig::default().with_warm_start(false);
        let s = GreedyRunner::run(&pinned, &cold, Some(&prior));
        assert!(!s.contains(&CandidateKey::new("a3", 1)));
    }

    #[test]
    fn test_warm_start_with_own_result_is_stable() {
        let pool = two_authors();
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let first = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        let again = GreedyRunner::run(&pinned, &GreedyConfig::default(), Some(&first));
        assert_eq!(first, again);
    }

    #[test]
    fn test_per_category_cost_changes_order() {
        let pool = pool_of(
            vec![
                cand("art", 1, 100.0, 1.0, Category::Article),
                cand("mono", 2, 150.0, 1.0, Category::Monograph),
            ],
            ConstraintSet::new(1.0, 4.0, 2.0).unwrap(),
        );
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let share = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        assert!(share.contains(&CandidateKey::new("mono", 2)));

        let units = CategoryUnits {
            monograph: 2.0,
            ..CategoryUnits::default()
        };
        let config = GreedyConfig::default().with_cost_model(CostModel::PerCategory(units));
        let per_category = GreedyRunner::run(&pinned, &config, None);
        assert!(per_category.contains(&CandidateKey::new("art", 1)));
    }

    #[test]
    fn test_empty_pool() {
        let pool = pool_of(vec![], ConstraintSet::new(0.0, 4.0, 2.0).unwrap());
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let s = GreedyRunner::run(&pinned, &GreedyConfig::default(), None);
        assert!(s.is_empty());
    }
}
