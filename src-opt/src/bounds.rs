//! Box constraints shared by every optimiser.

use ndarray::Array1;
use rand::Rng;

use crate::error::{OptimError, Result};

/// Per-dimension lower/upper bounds of the search space.
///
/// Validated once on construction: equal lengths, at least one dimension,
/// finite values and `lower[i] <= upper[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Create bounds from separate lower and upper vectors
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(OptimError::BoundsMismatch {
                lower_len: lower.len(),
                upper_len: upper.len(),
            });
        }
        if lower.is_empty() {
            return Err(OptimError::EmptyBounds);
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(OptimError::NonFiniteBound { index });
            }
            if lo > hi {
                return Err(OptimError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Create bounds from `(lower, upper)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        let lower = pairs.iter().map(|&(lo, _)| lo).collect::<Array1<f64>>();
        let upper = pairs.iter().map(|&(_, hi)| hi).collect::<Array1<f64>>();
        Self::new(lower, upper)
    }

    /// Number of dimensions N
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Width of dimension `i`
    pub fn range(&self, i: usize) -> f64 {
        self.upper[i] - self.lower[i]
    }

    /// Largest width over all dimensions
    pub fn max_range(&self) -> f64 {
        (0..self.dim()).map(|i| self.range(i)).fold(0.0, f64::max)
    }

    /// Centre of the box
    pub fn midpoint(&self) -> Array1<f64> {
        (&self.lower + &self.upper) * 0.5
    }

    /// Whether every coordinate of `x` lies inside the box
    pub fn contains(&self, x: &Array1<f64>) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .enumerate()
                .all(|(i, &v)| v >= self.lower[i] && v <= self.upper[i])
    }

    /// Draw a point uniformly inside the box
    pub fn sample_uniform<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f64> {
        Array1::from_shape_fn(self.dim(), |i| {
            let u: f64 = rng.random::<f64>();
            self.lower[i] + u * self.range(i)
        })
    }

    /// Average per-dimension distance between `a` and `b`, each dimension
    /// normalised by its width. Zero-width dimensions are ignored; if every
    /// dimension is fixed the distance is 0.
    pub fn normalized_distance(&self, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        let mut sum = 0.0;
        let mut free = 0usize;
        for i in 0..self.dim() {
            let width = self.range(i);
            if width > 0.0 {
                sum += (a[i] - b[i]).abs() / width;
                free += 1;
            }
        }
        if free == 0 { 0.0 } else { sum / free as f64 }
    }
}
