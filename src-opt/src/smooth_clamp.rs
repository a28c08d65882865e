use ndarray::Array1;

use crate::bounds::Bounds;

/// Pull an out-of-range coordinate back inside `[lower, upper]`.
///
/// A violating value is replaced by the midpoint between `previous` (the
/// coordinate before the move, assumed in range) and the violated bound, not
/// by the bound itself, so repeated violations approach the bound gradually.
pub(crate) fn smooth_clamp(value: f64, previous: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        0.5 * (previous + lower)
    } else if value > upper {
        0.5 * (previous + upper)
    } else {
        value
    }
}

/// Apply [`smooth_clamp`] to every coordinate of `x`.
pub(crate) fn smooth_clamp_inplace(x: &mut Array1<f64>, previous: &Array1<f64>, bounds: &Bounds) {
    let lower = bounds.lower();
    let upper = bounds.upper();
    for i in 0..x.len() {
        x[i] = smooth_clamp(x[i], previous[i], lower[i], upper[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_range_is_untouched() {
        assert_eq!(smooth_clamp(0.3, 0.9, 0.0, 1.0), 0.3);
        assert_eq!(smooth_clamp(1.0, 0.9, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_violation_goes_halfway_to_bound() {
        assert_eq!(smooth_clamp(-5.0, 0.5, 0.0, 1.0), 0.25);
        assert_eq!(smooth_clamp(7.0, 0.5, 0.0, 1.0), 0.75);
        // previous already on the bound
        assert_eq!(smooth_clamp(2.0, 1.0, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_inplace() {
        let bounds = Bounds::from_pairs(&[(-1.0, 1.0), (-1.0, 1.0)]).unwrap();
        let previous = Array1::from(vec![0.0, 0.5]);
        let mut x = Array1::from(vec![-3.0, 4.0]);
        smooth_clamp_inplace(&mut x, &previous, &bounds);
        assert_eq!(x, Array1::from(vec![-0.5, 0.75]));
        assert!(bounds.contains(&x));
    }
}
