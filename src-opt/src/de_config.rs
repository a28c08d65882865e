//! Differential Evolution parameters.

use serde::{Deserialize, Serialize};

use crate::error::{OptimError, Result};
use crate::{CrossoverStrategy, MutationStrategy};

/// Parameters specific to Differential Evolution. The shared ones (bounds,
/// budgets, seed) live in [`crate::OptimizerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DEConfig {
    /// Population size NP; `None` means `round(8 * N)`
    pub population_size: Option<usize>,
    pub mutation: MutationStrategy,
    pub crossover: CrossoverStrategy,
    /// Scale factor F, in (0, 2]
    pub scale_factor: f64,
    /// Crossover rate CR, in [0, 1]
    pub crossover_rate: f64,
    /// Initial diversity threshold as a fraction of each bound range
    pub initial_min_avg_dist: f64,
    /// Failed draws before the diversity threshold is relaxed
    pub distinct_entity_max_trials: usize,
    /// `best / average` above this extends the stagnation streak
    pub relative_difference_threshold: f64,
    pub relative_difference_streak_limit: usize,
    pub absolute_difference_threshold: f64,
}

impl Default for DEConfig {
    fn default() -> Self {
        Self {
            population_size: None,
            mutation: MutationStrategy::Rand1,
            crossover: CrossoverStrategy::Bin,
            scale_factor: 0.5,
            crossover_rate: 0.9,
            initial_min_avg_dist: 0.5,
            distinct_entity_max_trials: 10,
            relative_difference_threshold: 0.9999,
            relative_difference_streak_limit: 100,
            absolute_difference_threshold: 1e-12,
        }
    }
}

impl DEConfig {
    /// Population size for an `n`-dimensional problem
    pub fn population_for(&self, n: usize) -> usize {
        self.population_size
            .unwrap_or_else(|| (8.0 * n as f64).round() as usize)
    }

    /// Check the parameters against an `n`-dimensional problem and return
    /// the population size to use.
    pub fn validate(&self, n: usize) -> Result<usize> {
        let npop = self.population_for(n);
        let required = self.mutation.parent_count() + 1;
        if npop < required {
            return Err(OptimError::PopulationTooSmall {
                pop_size: npop,
                required,
            });
        }
        if !(self.scale_factor > 0.0 && self.scale_factor <= 2.0) {
            return Err(OptimError::InvalidMutationFactor {
                factor: self.scale_factor,
            });
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(OptimError::InvalidCrossoverRate {
                rate: self.crossover_rate,
            });
        }
        Ok(npop)
    }
}

/// Fluent builder for DEConfig
pub struct DEConfigBuilder {
    cfg: DEConfig,
}

impl Default for DEConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DEConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: DEConfig::default(),
        }
    }
    pub fn population_size(mut self, v: usize) -> Self {
        self.cfg.population_size = Some(v);
        self
    }
    pub fn mutation(mut self, v: MutationStrategy) -> Self {
        self.cfg.mutation = v;
        self
    }
    pub fn crossover(mut self, v: CrossoverStrategy) -> Self {
        self.cfg.crossover = v;
        self
    }
    pub fn scale_factor(mut self, v: f64) -> Self {
        self.cfg.scale_factor = v;
        self
    }
    pub fn crossover_rate(mut self, v: f64) -> Self {
        self.cfg.crossover_rate = v;
        self
    }
    pub fn initial_min_avg_dist(mut self, v: f64) -> Self {
        self.cfg.initial_min_avg_dist = v;
        self
    }
    pub fn distinct_entity_max_trials(mut self, v: usize) -> Self {
        self.cfg.distinct_entity_max_trials = v;
        self
    }
    pub fn relative_difference_threshold(mut self, v: f64) -> Self {
        self.cfg.relative_difference_threshold = v;
        self
    }
    pub fn relative_difference_streak_limit(mut self, v: usize) -> Self {
        self.cfg.relative_difference_streak_limit = v;
        self
    }
    pub fn absolute_difference_threshold(mut self, v: f64) -> Self {
        self.cfg.absolute_difference_threshold = v;
        self
    }
    pub fn build(self) -> DEConfig {
        self.cfg
    }
}
