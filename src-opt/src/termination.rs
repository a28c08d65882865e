//! Termination reasons and the ordered stopping rules evaluated after every
//! generation (DE) or sweep (pattern search).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a run stopped. Exactly one reason is the terminal state of a run;
/// `NotTerminated` is only ever an intermediate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    NotTerminated,
    OptimalFitnessReached,
    MaximumGenerationsReached,
    MaximumFunctionEvaluationsReached,
    NoImprovementRelative,
    NoImprovementAbsolute,
    MinimumStepReached,
    UnexpectedError,
    /// Configuration rejected before any evaluation.
    InvalidConfiguration,
}

impl TerminationReason {
    /// Only reaching the target fitness counts as success
    pub fn is_success(self) -> bool {
        self == TerminationReason::OptimalFitnessReached
    }

    pub fn is_terminated(self) -> bool {
        self != TerminationReason::NotTerminated
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::NotTerminated => "not terminated",
            TerminationReason::OptimalFitnessReached => "optimal fitness reached",
            TerminationReason::MaximumGenerationsReached => "maximum number of generations reached",
            TerminationReason::MaximumFunctionEvaluationsReached => {
                "maximum number of function evaluations reached"
            }
            TerminationReason::NoImprovementRelative => {
                "no improvement: best and average fitness stayed relatively close"
            }
            TerminationReason::NoImprovementAbsolute => {
                "no improvement: best and average fitness are within the absolute threshold"
            }
            TerminationReason::MinimumStepReached => "minimum step size reached",
            TerminationReason::UnexpectedError => "unexpected error occurred",
            TerminationReason::InvalidConfiguration => "invalid configuration",
        };
        f.write_str(text)
    }
}

/// Stopping thresholds. Stagnation rules are disabled when their field is
/// `None`.
#[derive(Debug, Clone, Copy)]
pub struct TerminationCriteria {
    pub optimal_fitness: f64,
    /// DE stops at `best <= optimal`, pattern search only at `best < optimal`
    pub inclusive_optimum: bool,
    pub max_generations: usize,
    pub max_function_evaluations: usize,
    /// Streak length after which `NoImprovementRelative` fires
    pub relative_streak_limit: Option<usize>,
    /// `average - best` below this fires `NoImprovementAbsolute`
    pub absolute_difference_threshold: Option<f64>,
    /// Step below this fires `MinimumStepReached`
    pub min_step: Option<f64>,
}

/// State observed at the end of a generation or sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminationSnapshot {
    pub generation: usize,
    pub best_fitness: f64,
    pub function_evaluations: usize,
    pub relative_difference_streak: usize,
    pub absolute_difference: Option<f64>,
    pub step: Option<f64>,
}

impl TerminationCriteria {
    /// Evaluate the stopping rules in order; first match wins.
    ///
    /// Order: optimal fitness, minimum step, maximum generations, maximum
    /// function evaluations, relative stagnation, absolute stagnation.
    pub fn check(&self, s: &TerminationSnapshot) -> TerminationReason {
        let reached = if self.inclusive_optimum {
            s.best_fitness <= self.optimal_fitness
        } else {
            s.best_fitness < self.optimal_fitness
        };
        if reached {
            return TerminationReason::OptimalFitnessReached;
        }
        if let (Some(min_step), Some(step)) = (self.min_step, s.step) {
            if step < min_step {
                return TerminationReason::MinimumStepReached;
            }
        }
        if s.generation >= self.max_generations {
            return TerminationReason::MaximumGenerationsReached;
        }
        if s.function_evaluations >= self.max_function_evaluations {
            return TerminationReason::MaximumFunctionEvaluationsReached;
        }
        if let Some(limit) = self.relative_streak_limit {
            if s.relative_difference_streak > limit {
                return TerminationReason::NoImprovementRelative;
            }
        }
        if let (Some(threshold), Some(diff)) = (self.absolute_difference_threshold, s.absolute_difference) {
            if diff < threshold {
                return TerminationReason::NoImprovementAbsolute;
            }
        }
        TerminationReason::NotTerminated
    }
}
