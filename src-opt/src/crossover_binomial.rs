use rand::Rng;

/// Binomial crossover mask: each dimension is taken from the mutant with
/// probability `cr`, and one randomly chosen dimension always is.
pub(crate) fn binomial_mask<R: Rng + ?Sized>(n: usize, cr: f64, rng: &mut R) -> Vec<bool> {
    let jrand = rng.random_range(0..n);
    let mut mask = vec![false; n];
    for (j, m) in mask.iter_mut().enumerate() {
        *m = j == jrand || rng.random::<f64>() < cr;
    }
    mask
}
