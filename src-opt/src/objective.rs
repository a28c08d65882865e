//! Objective function contract and guarded evaluation.

use std::panic::{self, AssertUnwindSafe};

use log::{trace, warn};
use ndarray::Array1;

use crate::bounds::Bounds;
use crate::error::{ObjectiveError, OptimError, Result};

/// A function to minimise.
///
/// Must be callable concurrently from several threads. Any
/// `Fn(&Array1<f64>) -> f64 + Sync` closure or function is an objective;
/// wrap a function returning `Result` in [`Fallible`] to report failures.
pub trait Objective: Sync {
    fn evaluate(&self, x: &Array1<f64>) -> std::result::Result<f64, ObjectiveError>;
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    fn evaluate(&self, x: &Array1<f64>) -> std::result::Result<f64, ObjectiveError> {
        Ok(self(x))
    }
}

/// Adapter for objectives that can fail on some inputs.
pub struct Fallible<F>(pub F);

impl<F> Objective for Fallible<F>
where
    F: Fn(&Array1<f64>) -> std::result::Result<f64, ObjectiveError> + Sync,
{
    fn evaluate(&self, x: &Array1<f64>) -> std::result::Result<f64, ObjectiveError> {
        (self.0)(x)
    }
}

/// Call the objective once, catching a panic inside it.
pub fn try_evaluate<O: Objective + ?Sized>(
    objective: &O,
    x: &Array1<f64>,
) -> std::result::Result<f64, ObjectiveError> {
    match panic::catch_unwind(AssertUnwindSafe(|| objective.evaluate(x))) {
        Ok(result) => result,
        Err(_) => Err(ObjectiveError::Panicked),
    }
}

/// Fitness of `x`; failures and non-finite values become `+inf` so that the
/// point can never win a comparison.
pub fn evaluate<O: Objective + ?Sized>(objective: &O, x: &Array1<f64>) -> f64 {
    match try_evaluate(objective, x) {
        Ok(v) if v.is_finite() => v,
        Ok(v) => {
            trace!("objective returned non-finite value {} at {:?}", v, x);
            f64::INFINITY
        }
        Err(e) => {
            trace!("objective failed at {:?}: {}", x, e);
            f64::INFINITY
        }
    }
}

/// Lightweight pre-run self-test: two calls at the bounds midpoint must both
/// succeed, be finite and agree in sign.
pub fn sanity_check<O: Objective + ?Sized>(objective: &O, bounds: &Bounds) -> Result<()> {
    let mid = bounds.midpoint();
    let check = || -> std::result::Result<f64, String> {
        match try_evaluate(objective, &mid) {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(v) => Err(format!("non-finite value {} at the bounds midpoint", v)),
            Err(e) => Err(format!("{} at the bounds midpoint", e)),
        }
    };
    let outcome = check().and_then(|first| {
        let second = check()?;
        let sign = |v: f64| (v > 0.0, v < 0.0);
        if sign(first) != sign(second) {
            return Err(format!(
                "inconsistent values at the bounds midpoint: {} then {}",
                first, second
            ));
        }
        Ok(())
    });
    outcome.map_err(|reason| {
        warn!("objective sanity check failed: {}", reason);
        OptimError::SanityCheckFailed { reason }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bounds() -> Bounds {
        Bounds::from_pairs(&[(-1.0, 1.0), (-1.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_closure_is_objective() {
        let f = |x: &Array1<f64>| x.sum();
        assert_eq!(evaluate(&f, &Array1::from(vec![1.0, 2.0])), 3.0);
    }

    #[test]
    fn test_failures_become_infinite() {
        let nan = |_: &Array1<f64>| f64::NAN;
        let neg_inf = |_: &Array1<f64>| f64::NEG_INFINITY;
        let failing = Fallible(|_: &Array1<f64>| -> std::result::Result<f64, ObjectiveError> {
            Err(ObjectiveError::Failed("boom".into()))
        });
        let panicking = |_: &Array1<f64>| -> f64 { panic!("objective exploded") };
        let x = Array1::zeros(2);
        assert_eq!(evaluate(&nan, &x), f64::INFINITY);
        assert_eq!(evaluate(&neg_inf, &x), f64::INFINITY);
        assert_eq!(evaluate(&failing, &x), f64::INFINITY);
        assert_eq!(evaluate(&panicking, &x), f64::INFINITY);
    }

    #[test]
    fn test_deterministic_objective_gives_same_value() {
        let f = |x: &Array1<f64>| x.iter().map(|v| (v * 3.0).sin()).sum::<f64>();
        let x = Array1::from(vec![0.25, -0.75]);
        let first = evaluate(&f, &x);
        for _ in 0..10 {
            assert_eq!(evaluate(&f, &x), first);
        }
        assert!(first.is_finite());
    }

    #[test]
    fn test_sanity_check() {
        let good = |x: &Array1<f64>| x.dot(x);
        assert!(sanity_check(&good, &bounds()).is_ok());

        let bad = |_: &Array1<f64>| f64::NAN;
        assert!(matches!(
            sanity_check(&bad, &bounds()),
            Err(OptimError::SanityCheckFailed { .. })
        ));

        let calls = AtomicUsize::new(0);
        let flipping = |_: &Array1<f64>| {
            if calls.fetch_add(1, Ordering::Relaxed) % 2 == 0 { 1.0 } else { -1.0 }
        };
        assert!(sanity_check(&flipping, &bounds()).is_err());
    }

    #[test]
    fn test_sanity_check_treats_signed_zeros_alike() {
        let calls = AtomicUsize::new(0);
        let zeros = |_: &Array1<f64>| {
            if calls.fetch_add(1, Ordering::Relaxed) % 2 == 0 { -0.0 } else { 0.0 }
        };
        assert!(sanity_check(&zeros, &bounds()).is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
