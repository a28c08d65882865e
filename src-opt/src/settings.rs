//! Whole-run configuration as one serialisable document.
//!
//! ```json
//! {
//!   "engine": "de",
//!   "lower": [-5.0, -5.0],
//!   "upper": [5.0, 5.0],
//!   "optimal_fitness": 1e-6,
//!   "de": { "mutation": "best1", "crossover": "exp" }
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::de_config::DEConfig;
use crate::differential_evolution::DifferentialEvolution;
use crate::error::Result;
use crate::optimizer::{Optimizer, OptimizerConfig};
use crate::parallel_eval::ParallelConfig;
use crate::pattern_search::PatternSearch;
use crate::pattern_search_config::PatternSearchConfig;

/// Which optimiser to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    De,
    Ps,
}

impl FromStr for EngineKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "de" | "differential_evolution" => Ok(EngineKind::De),
            "ps" | "pattern_search" => Ok(EngineKind::Ps),
            _ => Err(format!("unknown engine: {}", s)),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::De => f.write_str("de"),
            EngineKind::Ps => f.write_str("ps"),
        }
    }
}

fn default_max_generations() -> usize {
    1000
}

fn default_max_function_evaluations() -> usize {
    1_000_000
}

fn default_true() -> bool {
    true
}

/// Serialisable configuration surface of both engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    #[serde(default)]
    pub engine: EngineKind,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Absent means "never stop early"
    #[serde(default)]
    pub optimal_fitness: Option<f64>,
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    #[serde(default = "default_max_function_evaluations")]
    pub max_function_evaluations: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub log_points: bool,
    #[serde(default = "default_true")]
    pub sanity_check: bool,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default)]
    pub de: DEConfig,
    #[serde(default)]
    pub ps: PatternSearchConfig,
}

impl OptimizerSettings {
    /// Default settings over the given bounds
    pub fn new(engine: EngineKind, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            engine,
            lower,
            upper,
            optimal_fitness: None,
            max_generations: default_max_generations(),
            max_function_evaluations: default_max_function_evaluations(),
            seed: None,
            log_points: false,
            sanity_check: true,
            parallel: true,
            num_threads: None,
            de: DEConfig::default(),
            ps: PatternSearchConfig::default(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validated shared configuration
    pub fn optimizer_config(&self) -> Result<OptimizerConfig> {
        let bounds = Bounds::new(
            Array1::from(self.lower.clone()),
            Array1::from(self.upper.clone()),
        )?;
        let mut config = OptimizerConfig::new(bounds)
            .optimal_fitness(self.optimal_fitness.unwrap_or(f64::NEG_INFINITY))
            .max_generations(self.max_generations)
            .max_function_evaluations(self.max_function_evaluations)
            .log_points(self.log_points)
            .sanity_check(self.sanity_check)
            .parallel(ParallelConfig {
                enabled: self.parallel,
                num_threads: self.num_threads,
            });
        config.seed = self.seed;
        Ok(config)
    }
}

/// Build the optimiser described by `settings`. Bounds are validated here,
/// engine parameters when the optimiser runs.
pub fn build_optimizer(settings: &OptimizerSettings) -> Result<Box<dyn Optimizer>> {
    let config = settings.optimizer_config()?;
    Ok(match settings.engine {
        EngineKind::De => Box::new(DifferentialEvolution::new(config, settings.de.clone())),
        EngineKind::Ps => Box::new(PatternSearch::new(config, settings.ps.clone())),
    })
}
