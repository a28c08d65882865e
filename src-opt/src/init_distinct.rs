use log::debug;
use ndarray::Array1;
use rand::Rng;

use crate::bounds::Bounds;

/// Below this the distance threshold is treated as exhausted and every draw
/// is accepted (all-fixed bounds have zero distance between any two points).
const MIN_DISTANCE_FLOOR: f64 = 1e-12;

/// Uniform initial population with a minimum pairwise spread.
///
/// Candidate `i` is redrawn until its normalised distance to every accepted
/// candidate `0..i` exceeds the current threshold. After `max_trials`
/// consecutive failures the threshold shrinks by `relax` and stays relaxed
/// for the remaining candidates.
///
/// Returns the points and the threshold in force when the last candidate was
/// accepted.
pub(crate) fn init_distinct<R: Rng + ?Sized>(
    bounds: &Bounds,
    count: usize,
    initial_min_avg_dist: f64,
    max_trials: usize,
    relax: f64,
    rng: &mut R,
) -> (Vec<Array1<f64>>, f64) {
    let max_trials = max_trials.max(1);
    let mut min_avg_dist = initial_min_avg_dist;
    let mut points: Vec<Array1<f64>> = Vec::with_capacity(count);

    while points.len() < count {
        let mut trials = 0usize;
        loop {
            let candidate = bounds.sample_uniform(rng);
            let spread = min_avg_dist < MIN_DISTANCE_FLOOR
                || points
                    .iter()
                    .all(|p| bounds.normalized_distance(p, &candidate) > min_avg_dist);
            if spread {
                points.push(candidate);
                break;
            }
            trials += 1;
            if trials >= max_trials {
                min_avg_dist *= relax;
                trials = 0;
            }
        }
    }

    if min_avg_dist < initial_min_avg_dist {
        debug!(
            "initial population: min average distance relaxed from {} to {:.3e}",
            initial_min_avg_dist, min_avg_dist
        );
    }
    (points, min_avg_dist)
}
