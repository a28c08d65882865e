use log::debug;
use ndarray::Array1;
use rayon::prelude::*;

use crate::objective::{Objective, evaluate};

/// Parallel evaluation configuration
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Enable parallel evaluation
    pub enabled: bool,
    /// Number of threads to use (None = use rayon default)
    pub num_threads: Option<usize>,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_threads: None, // Use rayon's default (typically num_cpus)
        }
    }
}

impl ParallelConfig {
    /// Configure the global rayon pool once if a thread count was requested.
    /// A pool that is already built is left alone.
    pub(crate) fn install_global_pool(&self) {
        if let Some(n) = self.num_threads {
            if rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build_global()
                .is_err()
            {
                debug!("global rayon pool already initialised, keeping it");
            }
        }
    }
}

/// Evaluate a batch of points, in parallel when enabled.
///
/// Small batches are evaluated sequentially. Failures come back as `+inf`.
pub fn evaluate_points_parallel<O: Objective + ?Sized>(
    points: &[Array1<f64>],
    objective: &O,
    config: &ParallelConfig,
) -> Vec<f64> {
    if !config.enabled || points.len() < 4 {
        return points.iter().map(|x| evaluate(objective, x)).collect();
    }

    // Always use global thread pool (configured once per optimize call)
    points.par_iter().map(|x| evaluate(objective, x)).collect()
}
