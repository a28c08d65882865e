//! Derivative-free black-box optimisation over a box-bounded space.
//!
//! Two engines share one contract ([`Optimizer`]):
//! - [`DifferentialEvolution`]: population based, strategies rand1/best1/rand2/best2
//!   with binomial or exponential crossover, diversity-aware initialisation and
//!   a smooth clamp that keeps trials inside the bounds
//! - [`PatternSearch`]: multistart coordinate search with step halving and
//!   optional exploitation along an improving direction
//!
//! The objective is opaque: any `Fn(&Array1<f64>) -> f64 + Sync`. Failing or
//! non-finite evaluations count as `+inf` and never abort a run.
//!
//! ```rust
//! use bbopt::{DEConfigBuilder, OptimizerConfig, differential_evolution};
//! use ndarray::Array1;
//!
//! let sphere = |x: &Array1<f64>| x.iter().map(|v| v * v).sum::<f64>();
//! let config = OptimizerConfig::from_pairs(&[(-5.0, 5.0); 2])
//!     .unwrap()
//!     .optimal_fitness(1e-6)
//!     .seed(1);
//! let result = differential_evolution(&sphere, config, DEConfigBuilder::new().build());
//! assert!(result.success);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod bounds;
pub mod entity;
pub mod error;
pub mod objective;
pub mod optimizer;
pub mod parallel_eval;
pub mod termination;

pub mod distinct_indices;
pub mod init_distinct;
pub mod smooth_clamp;

pub mod mutant_best1;
pub mod mutant_best2;
pub mod mutant_rand1;
pub mod mutant_rand2;

pub mod crossover_binomial;
pub mod crossover_exponential;

pub mod de_config;
pub mod differential_evolution;
pub mod population;

pub mod local_search;
pub mod pattern_search;
pub mod pattern_search_config;

pub mod recorder;
pub mod settings;

#[cfg(test)]
mod tests;

pub use bounds::Bounds;
pub use de_config::{DEConfig, DEConfigBuilder};
pub use differential_evolution::{DifferentialEvolution, differential_evolution};
pub use entity::{Entity, Offspring};
pub use error::{ObjectiveError, OptimError, Result};
pub use objective::{Fallible, Objective, evaluate, sanity_check};
pub use optimizer::{OptimizationResult, Optimizer, OptimizerConfig, Progress, ProgressCallback};
pub use parallel_eval::ParallelConfig;
pub use pattern_search::{PatternSearch, pattern_search};
pub use pattern_search_config::{PatternSearchConfig, PatternSearchConfigBuilder};
pub use population::Population;
pub use recorder::{OptimizationRecorder, ProgressRecord, save_visited_points_csv};
pub use settings::{EngineKind, OptimizerSettings, build_optimizer};
pub use termination::{TerminationCriteria, TerminationReason};

/// Differential Evolution mutation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStrategy {
    /// `p0 + F * (p1 - p2)`
    #[default]
    Rand1,
    /// `best + F * (p0 - p1)`
    Best1,
    /// `p0 + F * (p1 - p2) + F * (p3 - p4)`
    Rand2,
    /// `best + F * (p0 - p1) + F * (p2 - p3)`
    Best2,
}

impl MutationStrategy {
    /// Number of distinct parents (other than the target) the rule draws
    pub fn parent_count(self) -> usize {
        match self {
            MutationStrategy::Best1 => 2,
            MutationStrategy::Rand1 => 3,
            MutationStrategy::Best2 => 4,
            MutationStrategy::Rand2 => 5,
        }
    }
}

impl FromStr for MutationStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.to_lowercase();
        match t.as_str() {
            "rand1" | "rand/1" => Ok(MutationStrategy::Rand1),
            "best1" | "best/1" => Ok(MutationStrategy::Best1),
            "rand2" | "rand/2" => Ok(MutationStrategy::Rand2),
            "best2" | "best/2" => Ok(MutationStrategy::Best2),
            _ => Err(format!("unknown mutation strategy: {}", s)),
        }
    }
}

impl fmt::Display for MutationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationStrategy::Rand1 => "rand1",
            MutationStrategy::Best1 => "best1",
            MutationStrategy::Rand2 => "rand2",
            MutationStrategy::Best2 => "best2",
        };
        f.write_str(name)
    }
}

/// Crossover type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossoverStrategy {
    /// Binomial (uniform) crossover
    #[default]
    Bin,
    /// Exponential crossover
    Exp,
}

impl FromStr for CrossoverStrategy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let t = s.to_lowercase();
        match t.as_str() {
            "bin" | "binomial" => Ok(CrossoverStrategy::Bin),
            "exp" | "exponential" => Ok(CrossoverStrategy::Exp),
            _ => Err(format!("unknown crossover strategy: {}", s)),
        }
    }
}

impl fmt::Display for CrossoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossoverStrategy::Bin => f.write_str("bin"),
            CrossoverStrategy::Exp => f.write_str("exp"),
        }
    }
}
