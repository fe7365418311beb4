//! Chromosome representation.
//!
//! A [`Chromosome`] is an inclusion mask over the *free* candidates of a
//! [`PinnedPool`]: FORCED_IN candidates are always selected and FORCED_OUT
//! candidates never are, so neither has a gene. [`Encoding`] maps genes back
//! to candidates and evaluates them.

use super::repair::repair;
use crate::model::{Candidate, Solution};
use crate::objective::CostModel;
use crate::solver::{fill, PinnedPool};

/// An inclusion vector with the fitness of its repaired form.
#[derive(Debug, Clone, PartialEq)]
pub struct Chromosome {
    pub genes: Vec<bool>,
    /// Objective value, including FORCED_IN candidates.
    pub fitness: f64,
}

impl Chromosome {
    /// Repairs `genes` and scores the result.
    pub fn repaired(mut genes: Vec<bool>, encoding: &Encoding<'_>) -> Self {
        repair(&mut genes, encoding);
        let fitness = encoding.fitness(&genes);
        Self { genes, fitness }
    }
}

/// Gene layout for one pinned pool.
#[derive(Debug, Clone)]
pub struct Encoding<'a> {
    pinned: &'a PinnedPool<'a>,
    cost_model: CostModel,
    /// Gene position -> pool index.
    genes: Vec<usize>,
    /// Gene positions by density ascending: the order repair drops them in.
    removal_order: Vec<usize>,
    forced_score: f64,
}

impl<'a> Encoding<'a> {
    pub fn new(pinned: &'a PinnedPool<'a>, cost_model: CostModel) -> Self {
        let genes = pinned.free().to_vec();
        let mut removal_order: Vec<usize> = (0..genes.len()).collect();
        removal_order.sort_by(|&a, &b| {
            cost_model
                .compare(pinned.candidate(genes[a]), pinned.candidate(genes[b]))
                .reverse()
        });
        let forced_score = pinned
            .forced_in()
            .iter()
            .map(|&i| pinned.candidate(i).weighted_points())
            .sum();
        Self {
            pinned,
            cost_model,
            genes,
            removal_order,
            forced_score,
        }
    }

    pub fn pinned(&self) -> &'a PinnedPool<'a> {
        self.pinned
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn candidate(&self, gene: usize) -> &'a Candidate {
        self.pinned.candidate(self.genes[gene])
    }

    pub fn removal_order(&self) -> &[usize] {
        &self.removal_order
    }

    /// Objective value of a (repaired) gene vector.
    pub fn fitness(&self, genes: &[bool]) -> f64 {
        self.forced_score
            + genes
                .iter()
                .enumerate()
                .filter(|(_, &on)| on)
                .map(|(g, _)| self.candidate(g).weighted_points())
                .sum::<f64>()
    }

    /// Score of selecting every free candidate, ignoring all rules.
    pub fn upper_bound(&self) -> f64 {
        self.fitness(&vec![true; self.genes.len()])
    }

    /// Genes of a pool-wide selection mask.
    pub fn encode(&self, mask: &[bool]) -> Vec<bool> {
        self.genes.iter().map(|&i| mask[i]).collect()
    }

    /// Pool-wide selection mask with FORCED_IN candidates set.
    pub fn to_mask(&self, genes: &[bool]) -> Vec<bool> {
        let (_, mut mask) = self.pinned.base_state();
        for (g, &on) in genes.iter().enumerate() {
            if on {
                mask[self.genes[g]] = true;
            }
        }
        mask
    }

    /// Admits every still-admissible free candidate in density order, then
    /// decodes. Never lowers the score.
    pub fn polish(&self, genes: &[bool]) -> Solution {
        let mut mask = self.to_mask(genes);
        let (mut tracker, _) = self.pinned.base_state();
        for (g, &on) in genes.iter().enumerate() {
            if on {
                tracker.admit(self.candidate(g));
            }
        }
        let order = self.pinned.ranked_free(&self.cost_model);
        fill(&mut tracker, &mut mask, self.pinned, &order);
        self.pinned.decode(&mask)
    }
}
