use rand::Rng;

/// Exponential crossover mask: a contiguous, wrapping run of dimensions
/// starting at a random position, extended while Bernoulli(`cr`) trials
/// succeed. Length is between 1 and `n`.
pub(crate) fn exponential_mask<R: Rng + ?Sized>(n: usize, cr: f64, rng: &mut R) -> Vec<bool> {
    let mut mask = vec![false; n];
    let mut j = rng.random_range(0..n);
    let mut l = 0usize;
    // ensure at least one parameter from mutant
    loop {
        mask[j] = true;
        l += 1;
        j = (j + 1) % n;
        if rng.random::<f64>() >= cr || l >= n {
            break;
        }
    }
    mask
}
