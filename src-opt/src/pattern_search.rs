//! Multistart coordinate pattern search.
//!
//! Every run starts from its own random point and is independent of the
//! others except for the shared evaluation budget (with its abort flag) and
//! the global best, updated under a mutex when a run completes.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::entity::Entity;
use crate::error::{OptimError, Result};
use crate::local_search::{LocalSearch, RunContext, RunOutcome, SharedBudget};
use crate::objective::Objective;
use crate::optimizer::{OptimizationResult, Optimizer, OptimizerConfig, ProgressCallback};
use crate::pattern_search_config::PatternSearchConfig;
use crate::termination::{TerminationCriteria, TerminationReason};

enum RunStatus {
    Skipped,
    Panicked,
    Finished(RunOutcome),
}

/// Multistart axis-aligned search with step reduction and optional
/// exploitation along improving directions.
pub struct PatternSearch {
    config: OptimizerConfig,
    ps: PatternSearchConfig,
    callback: Option<ProgressCallback>,
}

impl PatternSearch {
    pub fn new(config: OptimizerConfig, ps: PatternSearchConfig) -> Self {
        Self {
            config,
            ps,
            callback: None,
        }
    }

    pub fn ps_config(&self) -> &PatternSearchConfig {
        &self.ps
    }

    fn criteria(&self) -> TerminationCriteria {
        TerminationCriteria {
            optimal_fitness: self.config.optimal_fitness,
            inclusive_optimum: false,
            max_generations: self.config.max_generations,
            max_function_evaluations: self.config.max_function_evaluations,
            relative_streak_limit: None,
            absolute_difference_threshold: None,
            min_step: Some(self.ps.min_step),
        }
    }
}

/// Starting-point RNG for one run
fn run_rng(seed: Option<u64>, run: usize) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(run as u64)),
        None => {
            let mut thread_rng = rand::rng();
            StdRng::from_rng(&mut thread_rng)
        }
    }
}

/// Replace the global best if `candidate` is strictly better
fn offer_best(
    global_best: &Mutex<Option<(Entity, TerminationReason)>>,
    candidate: &Entity,
    reason: TerminationReason,
) {
    let mut best = global_best.lock();
    if best.as_ref().is_none_or(|(b, _)| candidate.fitness < b.fitness) {
        *best = Some((candidate.clone(), reason));
    }
}

impl Optimizer for PatternSearch {
    fn name(&self) -> &'static str {
        "pattern search"
    }

    fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.callback = Some(callback);
    }

    fn try_optimize(&mut self, objective: &dyn Objective) -> Result<OptimizationResult> {
        self.ps.validate()?;
        if self.config.max_function_evaluations == 0 {
            return Err(OptimError::InvalidBudget {
                reason: "pattern search needs at least one function evaluation".into(),
            });
        }
        self.config.prepare(objective)?;

        let bounds = &self.config.bounds;
        let initial_step = bounds.max_range() / self.ps.initial_step_divisor;
        info!(
            "PS start: {} dimensions, {} runs, initial step={:.3e}, min step={:.1e}, exploit={}",
            bounds.dim(),
            self.ps.multistart_count,
            initial_step,
            self.ps.min_step,
            self.ps.max_exploit_count
        );

        let budget = SharedBudget::new(self.config.max_function_evaluations);
        let callback = Mutex::new(self.callback.take());
        let global_best: Mutex<Option<(Entity, TerminationReason)>> = Mutex::new(None);
        let ctx = RunContext {
            bounds,
            objective,
            budget: &budget,
            criteria: self.criteria(),
            step_reducer: self.ps.step_reducer,
            max_exploit_count: self.ps.max_exploit_count,
            log_points: self.config.log_points,
            callback: &callback,
        };
        let optimal = self.config.optimal_fitness;
        let seed = self.config.seed;

        let run_one = |run: usize| -> RunStatus {
            let solved = global_best
                .lock()
                .as_ref()
                .is_some_and(|(best, _)| best.fitness < optimal);
            if solved || budget.aborted() {
                debug!("PS run {} skipped", run);
                return RunStatus::Skipped;
            }
            let mut rng = run_rng(seed, run);
            let start = bounds.sample_uniform(&mut rng);
            let checkpoint = Mutex::new(None);
            let searched = panic::catch_unwind(AssertUnwindSafe(|| {
                LocalSearch::new(&ctx, run, start, initial_step)
                    .with_checkpoint(&checkpoint)
                    .run()
            }));
            match searched {
                Ok(outcome) => {
                    offer_best(&global_best, &outcome.best, outcome.reason);
                    RunStatus::Finished(outcome)
                }
                Err(_) => {
                    warn!("PS run {} failed unexpectedly, keeping its last checkpoint", run);
                    if let Some(best) = checkpoint.into_inner() {
                        offer_best(&global_best, &best, TerminationReason::UnexpectedError);
                    }
                    RunStatus::Panicked
                }
            }
        };

        let runs = self.ps.multistart_count;
        let statuses: Vec<RunStatus> = if self.config.parallel.enabled {
            (0..runs).into_par_iter().map(run_one).collect()
        } else {
            (0..runs).map(run_one).collect()
        };
        self.callback = callback.into_inner();

        let generations: usize = statuses
            .iter()
            .map(|s| match s {
                RunStatus::Finished(o) => o.sweeps,
                _ => 0,
            })
            .sum();
        let function_evaluations = budget.used();

        let (best, reason) = match global_best.into_inner() {
            None => (
                Entity::new(bounds.midpoint()),
                TerminationReason::UnexpectedError,
            ),
            Some((best, _)) if best.fitness < optimal => {
                (best, TerminationReason::OptimalFitnessReached)
            }
            Some((best, _)) if budget.aborted() => {
                (best, TerminationReason::MaximumFunctionEvaluationsReached)
            }
            Some((best, reason)) => (best, reason),
        };

        let visited = self.config.log_points.then(|| {
            statuses
                .into_iter()
                .map(|s| match s {
                    RunStatus::Finished(o) => o.visited,
                    RunStatus::Skipped | RunStatus::Panicked => Vec::new(),
                })
                .collect()
        });

        info!(
            "PS done after {} sweeps, {} evaluations: {} (best={:.6e})",
            generations, function_evaluations, reason, best.fitness
        );

        Ok(OptimizationResult {
            best_params: best.params,
            best_fitness: best.fitness,
            success: reason.is_success(),
            termination_reason: reason,
            function_evaluations,
            generations,
            visited_points: visited,
            error: None,
        })
    }
}

/// Run the multistart pattern search on `objective`.
pub fn pattern_search<O: Objective>(
    objective: &O,
    config: OptimizerConfig,
    ps: PatternSearchConfig,
) -> OptimizationResult {
    PatternSearch::new(config, ps).optimize(objective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Progress;
    use crate::pattern_search_config::PatternSearchConfigBuilder;
    use ndarray::Array1;

    fn sphere(x: &Array1<f64>) -> f64 {
        x.iter().map(|v| v * v).sum()
    }

    fn config(n: usize) -> OptimizerConfig {
        OptimizerConfig::from_pairs(&vec![(-5.0, 5.0); n])
            .unwrap()
            .seed(11)
    }

    #[test]
    fn test_sphere_converges() {
        let result = pattern_search(
            &sphere,
            config(4).optimal_fitness(1e-8),
            PatternSearchConfig::default(),
        );
        assert!(result.success, "{:?}", result);
        assert!(result.best_fitness < 1e-8);
    }

    #[test]
    fn test_optimum_is_strict() {
        let flat = |_: &Array1<f64>| 0.0;
        let result = pattern_search(
            &flat,
            config(2).optimal_fitness(0.0),
            PatternSearchConfigBuilder::new().multistart_count(1).min_step(1e-3).build(),
        );
        assert!(!result.success);
        assert_eq!(result.termination_reason, TerminationReason::MinimumStepReached);
    }

    #[test]
    fn test_budget_is_global() {
        let result = pattern_search(
            &sphere,
            config(3).max_function_evaluations(50),
            PatternSearchConfigBuilder::new().multistart_count(8).build(),
        );
        assert_eq!(
            result.termination_reason,
            TerminationReason::MaximumFunctionEvaluationsReached
        );
        assert_eq!(result.function_evaluations, 50);
    }

    #[test]
    fn test_visited_points_per_run() {
        let result = pattern_search(
            &sphere,
            config(2).log_points(true).enable_parallel(false),
            PatternSearchConfigBuilder::new().multistart_count(3).min_step(1e-4).build(),
        );
        let visited = result.visited_points.unwrap();
        assert_eq!(visited.len(), 3);
        let total: usize = visited.iter().map(|v| v.len()).sum();
        assert_eq!(total, result.function_evaluations);
        assert!(visited.iter().all(|v| !v.is_empty()));
    }

    #[test]
    fn test_solved_runs_skip_the_rest() {
        let result = pattern_search(
            &sphere,
            config(2)
                .optimal_fitness(1.0)
                .log_points(true)
                .enable_parallel(false),
            PatternSearchConfigBuilder::new().multistart_count(5).build(),
        );
        assert!(result.success);
        let visited = result.visited_points.unwrap();
        assert!(!visited[0].is_empty());
        assert!(visited[1..].iter().all(|v| v.is_empty()));
    }

    #[test]
    fn test_rejects_zero_budget() {
        let result = pattern_search(
            &sphere,
            config(2).max_function_evaluations(0),
            PatternSearchConfig::default(),
        );
        assert_eq!(result.termination_reason, TerminationReason::InvalidConfiguration);
        assert_eq!(result.function_evaluations, 0);
    }

    #[test]
    fn test_panicking_callback_keeps_best_found() {
        let mut ps = PatternSearch::new(
            config(2).enable_parallel(false),
            PatternSearchConfigBuilder::new().multistart_count(2).build(),
        );
        ps.set_progress_callback(Box::new(|p: &Progress| {
            if p.generation == 3 {
                panic!("callback failure");
            }
        }));
        let result = ps.optimize(&sphere);
        assert_eq!(result.termination_reason, TerminationReason::UnexpectedError);
        assert!(!result.success);
        assert!(result.best_fitness.is_finite());
        assert_eq!(result.best_fitness, sphere(&result.best_params));
        assert!(result.best_params.iter().any(|&v| v != 0.0));
        assert!(result.function_evaluations > 2 * 3 * 2 * 2);
    }
}
