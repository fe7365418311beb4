//! Randomized-restart configuration.

use crate::objective::CostModel;

/// Configuration for the randomized-restart solver.
///
/// # Defaults
///
/// ```
/// use slot_optim::restart::RestartConfig;
///
/// let config = RestartConfig::default();
/// assert_eq!(config.num_restarts, 500);
/// assert!(config.seed.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RestartConfig {
    /// Greedy passes to run, including the unshuffled first pass.
    pub num_restarts: usize,

    /// Every `full_shuffle_every`-th restart shuffles the whole order instead
    /// of a random segment. `0` never does.
    pub full_shuffle_every: usize,

    /// Denominator of the density ranking.
    pub cost_model: CostModel,

    /// Random seed for reproducibility. `None` draws one.
    pub seed: Option<u64>,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            num_restarts: 500,
            full_shuffle_every: 4,
            cost_model: CostModel::Share,
            seed: None,
        }
    }
}

impl RestartConfig {
    pub fn with_num_restarts(mut self, n: usize) -> Self {
        self.num_restarts = n;
        self
    }

    pub fn with_full_shuffle_every(mut self, n: usize) -> Self {
        self.full_shuffle_every = n;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Preset for quick interactive re-solves: 50 restarts.
    pub fn fast() -> Self {
        Self {
            num_restarts: 50,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_restarts == 0 {
            return Err("num_restarts must be at least 1".into());
        }
        self.cost_model.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = RestartConfig::default()
            .with_num_restarts(10)
            .with_full_shuffle_every(0)
            .with_seed(3);
        assert_eq!(config.num_restarts, 10);
        assert_eq!(config.full_shuffle_every, 0);
        assert_eq!(config.seed, Some(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_restarts() {
        assert!(RestartConfig::default()
            .with_num_restarts(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_fast_preset() {
        let config = RestartConfig::fast();
        assert_eq!(config.num_restarts, 50);
        assert!(config.validate().is_ok());
    }
}
