//! The contract shared by every optimiser: configuration, progress reporting
//! and the result surface.

use std::fmt;

use log::warn;
use ndarray::Array1;

use crate::bounds::Bounds;
use crate::error::{OptimError, Result};
use crate::objective::{Objective, sanity_check};
use crate::parallel_eval::ParallelConfig;
use crate::termination::TerminationReason;

/// Configuration common to all optimisers
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub bounds: Bounds,
    /// Stop as soon as the best fitness reaches this value (default: never)
    pub optimal_fitness: f64,
    pub max_generations: usize,
    pub max_function_evaluations: usize,
    /// Base seed; every task derives its own stream from it
    pub seed: Option<u64>,
    /// Keep the visited-point history in the result
    pub log_points: bool,
    /// Run the two-call objective self-test before optimising
    pub sanity_check: bool,
    /// Parallel evaluation configuration
    pub parallel: ParallelConfig,
}

impl OptimizerConfig {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            optimal_fitness: f64::NEG_INFINITY,
            max_generations: 1000,
            max_function_evaluations: 1_000_000,
            seed: None,
            log_points: false,
            sanity_check: true,
            parallel: ParallelConfig::default(),
        }
    }

    /// Convenience constructor from `(lower, upper)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Ok(Self::new(Bounds::from_pairs(pairs)?))
    }

    pub fn optimal_fitness(mut self, v: f64) -> Self {
        self.optimal_fitness = v;
        self
    }
    pub fn max_generations(mut self, v: usize) -> Self {
        self.max_generations = v;
        self
    }
    pub fn max_function_evaluations(mut self, v: usize) -> Self {
        self.max_function_evaluations = v;
        self
    }
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = Some(v);
        self
    }
    pub fn log_points(mut self, v: bool) -> Self {
        self.log_points = v;
        self
    }
    pub fn sanity_check(mut self, v: bool) -> Self {
        self.sanity_check = v;
        self
    }
    pub fn parallel(mut self, parallel: ParallelConfig) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn enable_parallel(mut self, enable: bool) -> Self {
        self.parallel.enabled = enable;
        self
    }
    pub fn parallel_threads(mut self, num_threads: usize) -> Self {
        self.parallel.num_threads = Some(num_threads);
        self
    }

    /// Checks shared by every optimiser before the first evaluation.
    pub(crate) fn prepare(&self, objective: &dyn Objective) -> Result<()> {
        if self.sanity_check {
            sanity_check(objective, &self.bounds)?;
        }
        self.parallel.install_global_pool();
        Ok(())
    }
}

/// Information passed to the progress callback after each generation (DE)
/// or sweep (pattern search)
#[derive(Debug, Clone)]
pub struct Progress {
    /// Multistart run index; always 0 for DE
    pub run: usize,
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    /// Current pattern search step, `None` for DE
    pub step: Option<f64>,
    pub best_params: Array1<f64>,
}

/// Per-generation progress hook for plotting/logging consumers.
///
/// Must return promptly; pattern search calls it from worker threads behind
/// a mutex.
pub type ProgressCallback = Box<dyn FnMut(&Progress) + Send>;

/// Outcome of one `optimize` call
#[derive(Clone)]
pub struct OptimizationResult {
    pub best_params: Array1<f64>,
    pub best_fitness: f64,
    pub success: bool,
    pub termination_reason: TerminationReason,
    pub function_evaluations: usize,
    /// Generations (DE) or sweeps summed over runs (pattern search)
    pub generations: usize,
    /// `[run][step][dimension]` when point logging is enabled
    pub visited_points: Option<Vec<Vec<Vec<f64>>>>,
    /// Configuration error that rejected the run, if any
    pub error: Option<String>,
}

impl OptimizationResult {
    /// Empty result for a configuration rejected before any evaluation
    pub(crate) fn rejected(err: &OptimError) -> Self {
        Self {
            best_params: Array1::zeros(0),
            best_fitness: f64::INFINITY,
            success: false,
            termination_reason: TerminationReason::InvalidConfiguration,
            function_evaluations: 0,
            generations: 0,
            visited_points: None,
            error: Some(err.to_string()),
        }
    }

    /// Human-readable termination message
    pub fn message(&self) -> String {
        match &self.error {
            Some(err) => format!("{}: {}", self.termination_reason, err),
            None => self.termination_reason.to_string(),
        }
    }
}

impl fmt::Debug for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationResult")
            .field("best_params", &self.best_params)
            .field("best_fitness", &self.best_fitness)
            .field("success", &self.success)
            .field("termination_reason", &self.termination_reason)
            .field("function_evaluations", &self.function_evaluations)
            .field("generations", &self.generations)
            .field(
                "visited_points",
                &self.visited_points.as_ref().map(|v| format!("runs={}", v.len())),
            )
            .field("error", &self.error)
            .finish()
    }
}

/// Common surface of the optimiser family
pub trait Optimizer {
    /// Short algorithm name used in logs
    fn name(&self) -> &'static str;

    fn config(&self) -> &OptimizerConfig;

    /// Install a progress callback, replacing any previous one
    fn set_progress_callback(&mut self, callback: ProgressCallback);

    /// Run the optimisation, reporting configuration errors as `Err`
    fn try_optimize(&mut self, objective: &dyn Objective) -> Result<OptimizationResult>;

    /// Run the optimisation; configuration errors come back as a result with
    /// `TerminationReason::InvalidConfiguration` and no evaluations
    fn optimize(&mut self, objective: &dyn Objective) -> OptimizationResult {
        match self.try_optimize(objective) {
            Ok(result) => result,
            Err(err) => {
                warn!("{}: rejected configuration: {}", self.name(), err);
                OptimizationResult::rejected(&err)
            }
        }
    }
}
