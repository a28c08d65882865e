use ndarray::Array1;

use crate::entity::Entity;

/// `p0 + F * (p1 - p2) + F * (p3 - p4)`
pub(crate) fn mutant_rand2(pop: &[Entity], parents: &[usize], f: f64) -> Array1<f64> {
    let p = |k: usize| &pop[parents[k]].params;
    p(0) + &((p(1) - p(2)) * f) + &((p(3) - p(4)) * f)
}
