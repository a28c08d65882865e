use rand::Rng;
use rand::seq::SliceRandom;

/// Parent indices for entity `exclude`: `count` distinct members of
/// `0..pool_size`, in shuffled order, never the entity itself.
pub(crate) fn distinct_indices<R: Rng + ?Sized>(
    exclude: usize,
    count: usize,
    pool_size: usize,
    rng: &mut R,
) -> Vec<usize> {
    debug_assert!(count <= pool_size.saturating_sub(1));
    let mut pool: Vec<usize> = (0..pool_size).collect();
    pool.shuffle(rng);
    pool.into_iter().filter(|&i| i != exclude).take(count).collect()
}
