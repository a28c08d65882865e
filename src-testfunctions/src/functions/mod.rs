//! Objective implementations grouped by landscape shape
//!
//! - `unimodal`: single basin (sphere, rosenbrock, booth, ...)
//! - `multimodal`: many local minima (rastrigin, ackley, griewank, ...)

pub mod multimodal;
pub mod unimodal;

pub use multimodal::*;
pub use unimodal::*;
