use ndarray::Array1;

use crate::entity::Entity;

/// `best + F * (p0 - p1) + F * (p2 - p3)`
pub(crate) fn mutant_best2(
    pop: &[Entity],
    parents: &[usize],
    best: &Array1<f64>,
    f: f64,
) -> Array1<f64> {
    let p = |k: usize| &pop[parents[k]].params;
    best + &((p(0) - p(1)) * f) + &((p(2) - p(3)) * f)
}
