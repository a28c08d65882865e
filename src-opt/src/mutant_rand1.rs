use ndarray::Array1;

use crate::entity::Entity;

/// `p0 + F * (p1 - p2)`
pub(crate) fn mutant_rand1(pop: &[Entity], parents: &[usize], f: f64) -> Array1<f64> {
    let p0 = &pop[parents[0]].params;
    let p1 = &pop[parents[1]].params;
    let p2 = &pop[parents[2]].params;
    p0 + &((p1 - p2) * f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutant_rand1_formula() {
        let pop: Vec<Entity> = [[1.0, 2.0], [3.0, 5.0], [1.0, 1.0]]
            .iter()
            .map(|p| Entity::new(Array1::from(p.to_vec())))
            .collect();
        let m = mutant_rand1(&pop, &[0, 1, 2], 0.5);
        assert_eq!(m, Array1::from(vec![2.0, 4.0]));
    }
}
