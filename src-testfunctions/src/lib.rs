//! Optimization test functions library
//!
//! Analytic objectives with known minima, used to validate and benchmark the
//! optimisers in `bbopt`. Functions are organized by category:
//!
//! - **Unimodal**: single global optimum (sphere, rosenbrock, booth, ...)
//! - **Multimodal**: many local minima (rastrigin, ackley, griewank, ...)
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use bbopt_testfunctions::*;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//!
//! let bounds = get_function_bounds("sphere");
//! assert!(bounds.is_some());
//! ```

use ndarray::Array1;
use std::collections::HashMap;

pub mod functions;
pub use functions::*;

/// Signature shared by every function in this crate
pub type TestFunction = fn(&Array1<f64>) -> f64;

/// Metadata for a test function: default bounds and known global minima
#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    /// Function name
    pub name: String,
    /// Default bounds for each dimension (min, max)
    pub bounds: Vec<(f64, f64)>,
    /// Global minima locations and values
    pub global_minima: Vec<(Vec<f64>, f64)>,
    /// Whether the function is multimodal
    pub multimodal: bool,
    /// Whether the function accepts any dimension (otherwise 2D only)
    pub any_dimension: bool,
    /// Function pointer
    pub function: TestFunction,
}

impl FunctionMetadata {
    /// Bounds expanded to `n` dimensions, or `None` for fixed-dimension functions
    /// when `n` differs from the default dimension.
    pub fn bounds_for_dim(&self, n: usize) -> Option<Vec<(f64, f64)>> {
        if n == self.bounds.len() {
            return Some(self.bounds.clone());
        }
        if self.any_dimension && n > 0 {
            return Some(vec![self.bounds[0]; n]);
        }
        None
    }
}

fn entry(
    name: &str,
    function: TestFunction,
    bounds: Vec<(f64, f64)>,
    global_minima: Vec<(Vec<f64>, f64)>,
    multimodal: bool,
    any_dimension: bool,
) -> (String, FunctionMetadata) {
    (
        name.to_string(),
        FunctionMetadata {
            name: name.to_string(),
            bounds,
            global_minima,
            multimodal,
            any_dimension,
            function,
        },
    )
}

/// Get metadata for all available test functions
pub fn get_function_metadata() -> HashMap<String, FunctionMetadata> {
    HashMap::from([
        entry("sphere", sphere, vec![(-5.0, 5.0); 2], vec![(vec![0.0, 0.0], 0.0)], false, true),
        entry(
            "quadratic",
            quadratic,
            vec![(-5.0, 5.0); 2],
            vec![(vec![0.0, 0.0], 0.0)],
            false,
            true,
        ),
        entry(
            "rosenbrock",
            rosenbrock,
            vec![(-4.5, 4.5); 2],
            vec![(vec![1.0, 1.0], 0.0)],
            false,
            true,
        ),
        entry("booth", booth, vec![(-10.0, 10.0); 2], vec![(vec![1.0, 3.0], 0.0)], false, false),
        entry("matyas", matyas, vec![(-10.0, 10.0); 2], vec![(vec![0.0, 0.0], 0.0)], false, false),
        entry(
            "sum_squares",
            sum_squares,
            vec![(-10.0, 10.0); 2],
            vec![(vec![0.0, 0.0], 0.0)],
            false,
            true,
        ),
        entry(
            "rastrigin",
            rastrigin,
            vec![(-5.12, 5.12); 2],
            vec![(vec![0.0, 0.0], 0.0)],
            true,
            true,
        ),
        entry(
            "ackley",
            ackley,
            vec![(-32.768, 32.768); 2],
            vec![(vec![0.0, 0.0], 0.0)],
            true,
            true,
        ),
        entry(
            "griewank",
            griewank,
            vec![(-600.0, 600.0); 2],
            vec![(vec![0.0, 0.0], 0.0)],
            true,
            true,
        ),
        entry(
            "himmelblau",
            himmelblau,
            vec![(-5.0, 5.0); 2],
            vec![
                (vec![3.0, 2.0], 0.0),
                (vec![-2.805118, 3.131312], 0.0),
                (vec![-3.779310, -3.283186], 0.0),
                (vec![3.584428, -1.848126], 0.0),
            ],
            true,
            false,
        ),
    ])
}

/// Look up a test function by name
pub fn get_function(function_name: &str) -> Option<TestFunction> {
    get_function_metadata()
        .get(function_name)
        .map(|meta| meta.function)
}

/// Helper function to get bounds for a specific function from metadata
/// Returns None if function is not found in metadata
pub fn get_function_bounds(function_name: &str) -> Option<Vec<(f64, f64)>> {
    let metadata = get_function_metadata();
    metadata.get(function_name).map(|meta| meta.bounds.clone())
}

/// Helper function to get bounds as a Vec, falling back to `default_bounds` in 2D
pub fn get_function_bounds_vec(function_name: &str, default_bounds: (f64, f64)) -> Vec<(f64, f64)> {
    match get_function_bounds(function_name) {
        Some(bounds) if !bounds.is_empty() => bounds,
        _ => vec![default_bounds; 2],
    }
}
