//! One pattern search run: axis-aligned probing at a shrinking step.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::debug;
use ndarray::Array1;
use parking_lot::Mutex;

use crate::bounds::Bounds;
use crate::entity::Entity;
use crate::objective::{Objective, evaluate};
use crate::optimizer::{Progress, ProgressCallback};
use crate::smooth_clamp::smooth_clamp;
use crate::termination::{TerminationCriteria, TerminationReason, TerminationSnapshot};

/// Evaluation budget shared by all runs of one `optimize` call.
pub(crate) struct SharedBudget {
    used: AtomicUsize,
    abort: AtomicBool,
    max: usize,
}

impl SharedBudget {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            used: AtomicUsize::new(0),
            abort: AtomicBool::new(false),
            max,
        }
    }

    /// Reserve one evaluation. The abort flag is raised with the last one
    /// the budget allows.
    fn try_consume(&self) -> bool {
        if self.aborted() {
            return false;
        }
        let reserved = self
            .used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                (c < self.max).then_some(c + 1)
            });
        match reserved {
            Ok(previous) => {
                if previous + 1 >= self.max {
                    self.abort.store(true, Ordering::Relaxed);
                }
                true
            }
            Err(_) => {
                self.abort.store(true, Ordering::Relaxed);
                false
            }
        }
    }

    pub(crate) fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    pub(crate) fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}

/// Read-only inputs shared by every run
pub(crate) struct RunContext<'a> {
    pub bounds: &'a Bounds,
    pub objective: &'a dyn Objective,
    pub budget: &'a SharedBudget,
    pub criteria: TerminationCriteria,
    pub step_reducer: f64,
    pub max_exploit_count: usize,
    pub log_points: bool,
    pub callback: &'a Mutex<Option<ProgressCallback>>,
}

/// Final state of one run
#[derive(Debug, Clone)]
pub(crate) struct RunOutcome {
    pub run: usize,
    pub best: Entity,
    pub reason: TerminationReason,
    pub evaluations: usize,
    pub sweeps: usize,
    pub step: f64,
    pub visited: Vec<Vec<f64>>,
}

struct SweepOutcome {
    improved: bool,
    exhausted: bool,
}

/// Per-run search state
pub(crate) struct LocalSearch<'a> {
    ctx: &'a RunContext<'a>,
    run: usize,
    main: Entity,
    step: f64,
    /// The 2N probes of the last sweep
    pattern: Vec<Entity>,
    evaluations: usize,
    sweeps: usize,
    visited: Vec<Vec<f64>>,
    /// Last completed state, readable after a panic
    checkpoint: Option<&'a Mutex<Option<Entity>>>,
}

impl<'a> LocalSearch<'a> {
    pub(crate) fn new(ctx: &'a RunContext<'a>, run: usize, start: Array1<f64>, step: f64) -> Self {
        Self {
            ctx,
            run,
            main: Entity::new(start),
            step,
            pattern: Vec::with_capacity(2 * ctx.bounds.dim()),
            evaluations: 0,
            sweeps: 0,
            visited: Vec::new(),
            checkpoint: None,
        }
    }

    /// Publish the main point into `slot` after every completed step.
    pub(crate) fn with_checkpoint(mut self, slot: &'a Mutex<Option<Entity>>) -> Self {
        self.checkpoint = Some(slot);
        self
    }

    fn save_checkpoint(&self) {
        if let Some(slot) = self.checkpoint {
            *slot.lock() = Some(self.main.clone());
        }
    }

    /// Fitness of `x`, or `None` if the shared budget is exhausted
    fn eval(&mut self, x: &Array1<f64>) -> Option<f64> {
        if !self.ctx.budget.try_consume() {
            return None;
        }
        self.evaluations += 1;
        if self.ctx.log_points {
            self.visited.push(x.to_vec());
        }
        Some(evaluate(self.ctx.objective, x))
    }

    /// Move `main` by `direction * step` along dimension `j`
    fn probe(&self, j: usize, direction: f64) -> Array1<f64> {
        let mut x = self.main.params.clone();
        let lower = self.ctx.bounds.lower()[j];
        let upper = self.ctx.bounds.upper()[j];
        x[j] = smooth_clamp(x[j] + direction * self.step, self.main.params[j], lower, upper);
        x
    }

    /// Keep stepping along an improving direction while it pays off.
    /// Returns `false` if the budget ran out.
    fn exploit(&mut self, j: usize, direction: f64) -> bool {
        for _ in 0..self.ctx.max_exploit_count {
            let x = self.probe(j, direction);
            if x[j] == self.main.params[j] {
                break;
            }
            let Some(f) = self.eval(&x) else {
                return false;
            };
            if f < self.main.fitness {
                self.main = Entity::with_fitness(x, f);
            } else {
                break;
            }
        }
        true
    }

    /// Probe every dimension at `+step` and `-step`; the first strict
    /// improvement in a dimension is adopted before moving on.
    fn sweep(&mut self) -> SweepOutcome {
        self.pattern.clear();
        let mut improved = false;
        for j in 0..self.ctx.bounds.dim() {
            let mut adopted = None;
            for direction in [1.0, -1.0] {
                let x = self.probe(j, direction);
                let Some(f) = self.eval(&x) else {
                    return SweepOutcome {
                        improved,
                        exhausted: true,
                    };
                };
                if adopted.is_none() && f < self.main.fitness {
                    adopted = Some((direction, Entity::with_fitness(x.clone(), f)));
                }
                self.pattern.push(Entity::with_fitness(x, f));
            }
            if let Some((direction, entity)) = adopted {
                self.main = entity;
                improved = true;
                if !self.exploit(j, direction) {
                    return SweepOutcome {
                        improved,
                        exhausted: true,
                    };
                }
            }
        }
        SweepOutcome {
            improved,
            exhausted: false,
        }
    }

    fn average_pattern_fitness(&self) -> f64 {
        if self.pattern.is_empty() {
            return self.main.fitness;
        }
        self.pattern.iter().map(|e| e.fitness).sum::<f64>() / self.pattern.len() as f64
    }

    /// Evaluate the start point, then sweep until a stopping rule fires.
    pub(crate) fn run(mut self) -> RunOutcome {
        let start = self.main.params.clone();
        let reason = match self.eval(&start) {
            None => TerminationReason::MaximumFunctionEvaluationsReached,
            Some(f) => {
                self.main.fitness = f;
                self.save_checkpoint();
                self.sweep_until_done()
            }
        };
        debug!(
            "PS run {} done after {} sweeps, {} evaluations: {} (best={:.6e}, step={:.3e})",
            self.run, self.sweeps, self.evaluations, reason, self.main.fitness, self.step
        );
        RunOutcome {
            run: self.run,
            best: self.main,
            reason,
            evaluations: self.evaluations,
            sweeps: self.sweeps,
            step: self.step,
            visited: self.visited,
        }
    }

    fn sweep_until_done(&mut self) -> TerminationReason {
        loop {
            let reason = self.ctx.criteria.check(&TerminationSnapshot {
                generation: self.sweeps,
                best_fitness: self.main.fitness,
                function_evaluations: self.ctx.budget.used(),
                relative_difference_streak: 0,
                absolute_difference: None,
                step: Some(self.step),
            });
            if reason.is_terminated() {
                return reason;
            }
            if self.ctx.budget.aborted() {
                return TerminationReason::MaximumFunctionEvaluationsReached;
            }

            self.sweeps += 1;
            let outcome = self.sweep();
            if outcome.exhausted {
                return TerminationReason::MaximumFunctionEvaluationsReached;
            }
            if !outcome.improved {
                self.step *= self.ctx.step_reducer;
            }
            self.save_checkpoint();

            let mut callback = self.ctx.callback.lock();
            if let Some(cb) = callback.as_mut() {
                cb(&Progress {
                    run: self.run,
                    generation: self.sweeps,
                    best_fitness: self.main.fitness,
                    average_fitness: self.average_pattern_fitness(),
                    step: Some(self.step),
                    best_params: self.main.params.clone(),
                });
            }
        }
    }
}
