//! Pattern search parameters.

use serde::{Deserialize, Serialize};

use crate::error::{OptimError, Result};

/// Parameters specific to the multistart pattern search. The shared ones
/// live in [`crate::OptimizerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSearchConfig {
    /// Independent runs from random starting points
    pub multistart_count: usize,
    /// Initial step is `max(bound range) / initial_step_divisor`
    pub initial_step_divisor: f64,
    /// A run stops once its step falls below this
    pub min_step: f64,
    /// Step multiplier after a sweep without improvement, in (0, 1)
    pub step_reducer: f64,
    /// Extra same-direction steps taken after an improving move
    pub max_exploit_count: usize,
}

impl Default for PatternSearchConfig {
    fn default() -> Self {
        Self {
            multistart_count: 4,
            initial_step_divisor: 4.0,
            min_step: 1e-8,
            step_reducer: 0.5,
            max_exploit_count: 0,
        }
    }
}

impl PatternSearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.multistart_count == 0 {
            return Err(OptimError::InvalidMultistartCount);
        }
        if !(self.initial_step_divisor > 0.0 && self.initial_step_divisor.is_finite()) {
            return Err(OptimError::InvalidStepParameters {
                reason: format!(
                    "initial step divisor must be positive, got {}",
                    self.initial_step_divisor
                ),
            });
        }
        if !(self.min_step > 0.0) {
            return Err(OptimError::InvalidStepParameters {
                reason: format!("min step must be positive, got {}", self.min_step),
            });
        }
        if !(self.step_reducer > 0.0 && self.step_reducer < 1.0) {
            return Err(OptimError::InvalidStepParameters {
                reason: format!("step reducer must be in (0, 1), got {}", self.step_reducer),
            });
        }
        Ok(())
    }
}

/// Fluent builder for PatternSearchConfig
pub struct PatternSearchConfigBuilder {
    cfg: PatternSearchConfig,
}

impl Default for PatternSearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternSearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PatternSearchConfig::default(),
        }
    }
    pub fn multistart_count(mut self, v: usize) -> Self {
        self.cfg.multistart_count = v;
        self
    }
    pub fn initial_step_divisor(mut self, v: f64) -> Self {
        self.cfg.initial_step_divisor = v;
        self
    }
    pub fn min_step(mut self, v: f64) -> Self {
        self.cfg.min_step = v;
        self
    }
    pub fn step_reducer(mut self, v: f64) -> Self {
        self.cfg.step_reducer = v;
        self
    }
    pub fn max_exploit_count(mut self, v: usize) -> Self {
        self.cfg.max_exploit_count = v;
        self
    }
    pub fn build(self) -> PatternSearchConfig {
        self.cfg
    }
}
