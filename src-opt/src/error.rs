//! Error types for the optimisers.
//!
//! Configuration problems are reported through [`OptimError`] before any
//! evaluation loop starts. Objective failures use [`ObjectiveError`] and never
//! escape an optimisation run: they are turned into an infinite fitness.

use thiserror::Error;

/// Errors that can occur while setting up or reporting an optimisation run.
#[derive(Debug, Error)]
pub enum OptimError {
    /// No dimension at all.
    #[error("empty bounds: the problem needs at least one dimension")]
    EmptyBounds,

    /// Lower and upper bounds have different lengths.
    #[error("bounds mismatch: lower has {lower_len} elements, upper has {upper_len}")]
    BoundsMismatch {
        /// Length of the lower bounds array
        lower_len: usize,
        /// Length of the upper bounds array
        upper_len: usize,
    },

    /// A lower bound exceeds its corresponding upper bound.
    #[error("invalid bounds at index {index}: lower ({lower}) > upper ({upper})")]
    InvalidBounds {
        /// Index of the invalid bound pair
        index: usize,
        /// The lower bound value
        lower: f64,
        /// The upper bound value
        upper: f64,
    },

    /// A bound is NaN or infinite.
    #[error("non-finite bound at index {index}")]
    NonFiniteBound {
        /// Index of the offending bound pair
        index: usize,
    },

    /// Population too small for the selected mutation strategy.
    #[error("population size ({pop_size}) must be >= {required}")]
    PopulationTooSmall {
        /// The invalid population size
        pop_size: usize,
        /// Smallest size the mutation strategy can work with
        required: usize,
    },

    /// Mutation factor is out of valid range (0, 2].
    #[error("invalid scale factor: {factor} (must be in (0, 2])")]
    InvalidMutationFactor {
        /// The invalid scale factor
        factor: f64,
    },

    /// Crossover rate is out of valid range [0, 1].
    #[error("invalid crossover rate: {rate} (must be in [0, 1])")]
    InvalidCrossoverRate {
        /// The invalid crossover rate
        rate: f64,
    },

    /// Pattern search step parameters do not describe a shrinking step.
    #[error("invalid step parameters: {reason}")]
    InvalidStepParameters {
        /// What is wrong
        reason: String,
    },

    /// An evaluation or generation budget that cannot run anything.
    #[error("invalid budget: {reason}")]
    InvalidBudget {
        /// What is wrong
        reason: String,
    },

    /// Pattern search needs at least one run.
    #[error("multistart count must be >= 1")]
    InvalidMultistartCount,

    /// The objective failed the pre-run sanity check.
    #[error("objective sanity check failed: {reason}")]
    SanityCheckFailed {
        /// What the check observed
        reason: String,
    },

    /// No test function registered under that name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// Filesystem error while saving records.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialisation error while saving records.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error while reading or writing settings.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for optimiser operations.
pub type Result<T> = std::result::Result<T, OptimError>;

impl OptimError {
    /// Returns `true` if this is a bounds-related error.
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            OptimError::EmptyBounds
                | OptimError::BoundsMismatch { .. }
                | OptimError::InvalidBounds { .. }
                | OptimError::NonFiniteBound { .. }
        )
    }

    /// Returns `true` if this is an algorithm configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            OptimError::PopulationTooSmall { .. }
                | OptimError::InvalidMutationFactor { .. }
                | OptimError::InvalidCrossoverRate { .. }
                | OptimError::InvalidStepParameters { .. }
                | OptimError::InvalidMultistartCount
                | OptimError::InvalidBudget { .. }
        )
    }
}

/// Error returned by a fallible objective function.
#[derive(Debug, Clone, Error)]
pub enum ObjectiveError {
    /// The objective could not produce a value for this point.
    #[error("evaluation failed: {0}")]
    Failed(String),

    /// The objective panicked while evaluating this point.
    #[error("objective panicked")]
    Panicked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OptimError::BoundsMismatch {
            lower_len: 3,
            upper_len: 5,
        };
        assert_eq!(
            err.to_string(),
            "bounds mismatch: lower has 3 elements, upper has 5"
        );
    }

    #[test]
    fn test_error_categories() {
        let bounds_err = OptimError::InvalidBounds {
            index: 0,
            lower: 5.0,
            upper: 3.0,
        };
        let config_err = OptimError::InvalidCrossoverRate { rate: 1.5 };

        assert!(bounds_err.is_bounds_error());
        assert!(!bounds_err.is_config_error());
        assert!(config_err.is_config_error());
        assert!(!config_err.is_bounds_error());
        assert!(!OptimError::SanityCheckFailed { reason: "nan".into() }.is_config_error());
    }
}
