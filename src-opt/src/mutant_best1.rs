use ndarray::Array1;

use crate::entity::Entity;

/// `best + F * (p0 - p1)`
pub(crate) fn mutant_best1(
    pop: &[Entity],
    parents: &[usize],
    best: &Array1<f64>,
    f: f64,
) -> Array1<f64> {
    let p0 = &pop[parents[0]].params;
    let p1 = &pop[parents[1]].params;
    best + &((p0 - p1) * f)
}
