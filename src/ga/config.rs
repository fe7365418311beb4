//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the evolutionary loop.

use super::operators::Crossover;
use super::selection::Selection;
use crate::objective::CostModel;

/// Configuration for the Genetic Algorithm.
///
/// Controls population size, selection strategy, operator rates,
/// termination conditions, and parallelism.
///
/// # Defaults
///
/// ```
/// use slot_optim::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.max_generations, 1000);
/// assert_eq!(config.saturate, 300);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use slot_optim::ga::{Crossover, GaConfig, Selection};
///
/// let config = GaConfig::default()
///     .with_population_size(60)
///     .with_selection(Selection::Tournament(4))
///     .with_crossover(Crossover::SinglePoint)
///     .with_saturate(50)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GaConfig {
    /// Number of chromosomes in the population.
    pub population_size: usize,

    /// Generations per epoch.
    pub max_generations: usize,

    /// Generations without improvement of the best fitness before an epoch
    /// stops early. Set to 0 to disable.
    pub saturate: usize,

    /// Number of epochs. Each epoch re-seeds its population from the best
    /// chromosome found so far.
    pub epochs: usize,

    /// Selection strategy for choosing parents.
    pub selection: Selection,

    /// Recombination operator.
    pub crossover: Crossover,

    /// Fraction of the population preserved unchanged (0.0–1.0). At least
    /// one chromosome is always kept.
    pub elite_ratio: f64,

    /// Probability of recombining a pair of parents (0.0–1.0).
    pub crossover_rate: f64,

    /// Per-gene flip probability applied to every offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Per-gene flip probability used to perturb the greedy seed when
    /// building an initial population (0.0–1.0).
    pub seed_flip_rate: f64,

    /// Denominator of the density ranking used by seeding, repair and polish.
    pub cost_model: CostModel,

    /// Whether to repair and evaluate offspring in parallel. Only effective
    /// with the `parallel` feature; results are identical either way.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds, checked at the start
    /// of each generation.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 1000,
            saturate: 300,
            epochs: 1,
            selection: Selection::default(),
            crossover: Crossover::default(),
            elite_ratio: 0.05,
            crossover_rate: 0.9,
            mutation_rate: 0.01,
            seed_flip_rate: 0.02,
            cost_model: CostModel::Share,
            parallel: false,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the number of generations per epoch.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the saturation window (0 to disable).
    pub fn with_saturate(mut self, n: usize) -> Self {
        self.saturate = n;
        self
    }

    pub fn with_epochs(mut self, n: usize) -> Self {
        self.epochs = n;
        self
    }

    /// Sets the selection strategy.
    pub fn with_selection(mut self, sel: Selection) -> Self {
        self.selection = sel;
        self
    }

    pub fn with_crossover(mut self, crossover: Crossover) -> Self {
        self.crossover = crossover;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the per-gene mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed_flip_rate(mut self, rate: f64) -> Self {
        self.seed_flip_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Convenience builder for setting tournament size.
    ///
    /// Equivalent to `.with_selection(Selection::Tournament(k))`.
    pub fn with_tournament_size(self, k: usize) -> Self {
        self.with_selection(Selection::Tournament(k))
    }

    /// Preset for interactive re-solves.
    ///
    /// - Population: 40, Generations: 150, Saturate: 40, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 40,
            max_generations: 150,
            saturate: 40,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset for mid-sized disciplines.
    ///
    /// - Population: 100, Generations: 500, Saturate: 150, Time limit: 60s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            max_generations: 500,
            saturate: 150,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Preset for large disciplines: bigger population, two epochs.
    ///
    /// - Population: 150, Generations: 1000, Saturate: 300, Epochs: 2
    pub fn quality() -> Self {
        Self {
            population_size: 150,
            max_generations: 1000,
            saturate: 300,
            epochs: 2,
            ..Self::default()
        }
    }

    /// Selects a preset based on the number of candidates.
    ///
    /// - `candidates < 200` → [`fast()`](Self::fast)
    /// - `200 ≤ candidates < 2000` → [`balanced()`](Self::balanced)
    /// - `candidates ≥ 2000` → [`quality()`](Self::quality)
    pub fn auto_select(candidates: usize) -> Self {
        if candidates < 200 {
            Self::fast()
        } else if candidates < 2000 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Number of chromosomes copied unchanged into the next generation.
    pub fn elite_count(&self) -> usize {
        ((self.population_size as f64 * self.elite_ratio) as usize).max(1)
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.epochs == 0 {
            return Err("epochs must be at least 1".into());
        }
        if self.elite_count() >= self.population_size {
            return Err("elite_ratio too high: elites fill entire population".into());
        }
        for (name, rate) in [
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
            ("seed_flip_rate", self.seed_flip_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(format!("{name} must lie in [0, 1]"));
            }
        }
        if let Selection::Tournament(0) = self.selection {
            return Err("tournament size must be at least 1".into());
        }
        if self.time_limit_ms == Some(0) {
            return Err("time_limit_ms must be positive or None".into());
        }
        self.cost_model.validate()
    }
}
