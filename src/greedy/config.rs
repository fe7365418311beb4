//! Greedy configuration.

use crate::objective::CostModel;

/// Configuration for the density-ordered greedy pass.
///
/// ```
/// use slot_optim::greedy::GreedyConfig;
/// use slot_optim::objective::CostModel;
///
/// let config = GreedyConfig::default();
/// assert_eq!(config.cost_model, CostModel::Share);
/// assert!(config.warm_start);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyConfig {
    /// Denominator of the density ranking.
    pub cost_model: CostModel,

    /// Admit the unpinned members of a previous solution before filling.
    pub warm_start: bool,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModel::Share,
            warm_start: true,
        }
    }
}

impl GreedyConfig {
    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_warm_start(mut self, warm_start: bool) -> Self {
        self.warm_start = warm_start;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.cost_model.validate()
    }
}
