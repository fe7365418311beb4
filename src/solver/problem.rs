//! Pool view with pins resolved, the common input of every strategy.

use crate::constraint::{check_pins, CapacityTracker};
use crate::error::SolveError;
use crate::model::{Candidate, Pin, PinSet, PinState, Solution};
use crate::objective::CostModel;
use crate::pool::CandidatePool;

/// A [`CandidatePool`] split by pin state.
///
/// Indices refer to [`CandidatePool::candidates`]. FORCED_OUT candidates
/// appear in neither list.
#[derive(Debug, Clone)]
pub struct PinnedPool<'a> {
    pool: &'a CandidatePool,
    pins: PinSet,
    forced_in: Vec<usize>,
    free: Vec<usize>,
}

impl<'a> PinnedPool<'a> {
    /// Resolves `pins` against `pool`.
    ///
    /// # Errors
    ///
    /// [`SolveError::PinConflict`] if the pins contradict each other, name
    /// unknown candidates, or the FORCED_IN set alone breaks a rule.
    pub fn new(pool: &'a CandidatePool, pins: &[Pin]) -> Result<Self, SolveError> {
        let pins = check_pins(pool.candidates(), pool.constraints(), pins)
            .map_err(SolveError::PinConflict)?;
        let mut forced_in = Vec::new();
        let mut free = Vec::new();
        for (i, c) in pool.candidates().iter().enumerate() {
            match pins.get(c.key()) {
                Some(PinState::ForcedIn) => forced_in.push(i),
                Some(PinState::ForcedOut) => {}
                None => free.push(i),
            }
        }
        Ok(Self {
            pool,
            pins,
            forced_in,
            free,
        })
    }

    pub fn pool(&self) -> &'a CandidatePool {
        self.pool
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn candidate(&self, index: usize) -> &'a Candidate {
        &self.pool.candidates()[index]
    }

    pub fn forced_in(&self) -> &[usize] {
        &self.forced_in
    }

    pub fn free(&self) -> &[usize] {
        &self.free
    }

    /// Free indices in greedy admission order.
    pub fn ranked_free(&self, cost: &CostModel) -> Vec<usize> {
        let mut order = self.free.clone();
        order.sort_by(|&a, &b| cost.compare(self.candidate(a), self.candidate(b)));
        order
    }

    /// Tracker and selection mask with the FORCED_IN candidates charged.
    pub fn base_state(&self) -> (CapacityTracker<'a>, Vec<bool>) {
        let mut tracker = CapacityTracker::new(self.pool.constraints());
        let mut mask = vec![false; self.pool.len()];
        for &i in &self.forced_in {
            tracker.admit(self.candidate(i));
            mask[i] = true;
        }
        (tracker, mask)
    }

    /// Free indices of a prior solution's members still in this pool.
    pub fn warm_members(&self, warm: &Solution) -> Vec<usize> {
        warm.keys()
            .filter_map(|k| self.pool.index_of(k))
            .filter(|&i| self.pins.get(self.candidate(i).key()).is_none())
            .collect()
    }

    /// Score of a selection mask.
    pub fn mask_score(&self, mask: &[bool]) -> f64 {
        mask.iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .map(|(i, _)| self.candidate(i).weighted_points())
            .sum()
    }

    pub fn decode(&self, mask: &[bool]) -> Solution {
        Solution::from_candidates(
            mask.iter()
                .enumerate()
                .filter(|(_, &on)| on)
                .map(|(i, _)| self.candidate(i).clone()),
        )
    }
}

/// Admits candidates in `order` while they fit. Never removes anything.
pub fn fill(
    tracker: &mut CapacityTracker<'_>,
    mask: &mut [bool],
    pinned: &PinnedPool<'_>,
    order: &[usize],
) {
    for &i in order {
        if !mask[i] && tracker.try_admit(pinned.candidate(i)) {
            mask[i] = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateKey, Category, ConstraintSet, DisciplineId, EvaluationPeriod};

    fn pool() -> CandidatePool {
        let candidates = (0..4)
            .map(|i| {
                Candidate::new(
                    CandidateKey::new(format!("p{i}"), 1 + i % 2),
                    DisciplineId::from("art"),
                    10.0 * (i + 1) as f64,
                    1.0,
                    Category::Article,
                    2023,
                )
                .unwrap()
            })
            .collect();
        CandidatePool::new(
            DisciplineId::from("art"),
            EvaluationPeriod::default(),
            candidates,
            ConstraintSet::new(2.0, 4.0, 2.0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_partition_by_pins() {
        let pool = pool();
        let pins = vec![
            Pin::forced_in(CandidateKey::new("p0", 1)),
            Pin::forced_out(CandidateKey::new("p3", 2)),
        ];
        let pinned = PinnedPool::new(&pool, &pins).unwrap();
        assert_eq!(pinned.forced_in(), &[0]);
        assert_eq!(pinned.free(), &[1, 2]);
        assert_eq!(pinned.ranked_free(&CostModel::Share), vec![2, 1]);
    }

    #[test]
    fn test_fill_respects_quota() {
        let pool = pool();
        let pinned = PinnedPool::new(&pool, &[]).unwrap();
        let (mut tracker, mut mask) = pinned.base_state();
        let order = pinned.ranked_free(&CostModel::Share);
        fill(&mut tracker, &mut mask, &pinned, &order);
        assert_eq!(mask, vec![false, false, true, true]);
        assert!((pinned.mask_score(&mask) - 70.0).abs() < 1e-12);
    }

    #[test]
    fn test_conflict_surfaces() {
        let pool = pool();
        let key = CandidateKey::new("p1", 2);
        let pins = vec![Pin::forced_in(key.clone()), Pin::forced_out(key)];
        assert!(matches!(
            PinnedPool::new(&pool, &pins),
            Err(SolveError::PinConflict(_))
        ));
    }
}
