use std::sync::Arc;

use ndarray::Array1;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    Bounds, DEConfigBuilder, DifferentialEvolution, OptimizationRecorder, Optimizer,
    OptimizerConfig, PatternSearch, PatternSearchConfigBuilder, Progress, TerminationReason,
};

fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|v| v * v).sum()
}

/// Optimum at (10, .., 10), outside every box drawn below
fn far_sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|v| (v - 10.0).powi(2)).sum()
}

fn random_bounds(rng: &mut StdRng) -> Bounds {
    let n = rng.random_range(1..=4);
    let pairs: Vec<(f64, f64)> = (0..n)
        .map(|_| {
            let lo = rng.random_range(-8.0..2.0);
            let width = if rng.random::<f64>() < 0.15 {
                0.0
            } else {
                rng.random_range(0.01..6.0)
            };
            (lo, lo + width)
        })
        .collect();
    Bounds::from_pairs(&pairs).unwrap()
}

#[test]
fn test_best_params_stay_in_random_bounds() {
    let mut rng = StdRng::seed_from_u64(2024);
    for case in 0..12 {
        let bounds = random_bounds(&mut rng);
        let config = OptimizerConfig::new(bounds.clone())
            .max_generations(60)
            .seed(case);

        let mut de = DifferentialEvolution::new(
            config.clone(),
            DEConfigBuilder::new().population_size(12).build(),
        );
        let result = de.optimize(&far_sphere);
        assert!(bounds.contains(&result.best_params), "DE case {}: {:?}", case, result);
        assert_ne!(result.termination_reason, TerminationReason::NotTerminated);

        let mut ps = PatternSearch::new(
            config,
            PatternSearchConfigBuilder::new().multistart_count(2).max_exploit_count(2).build(),
        );
        let result = ps.optimize(&far_sphere);
        assert!(bounds.contains(&result.best_params), "PS case {}: {:?}", case, result);
        assert_ne!(result.termination_reason, TerminationReason::NotTerminated);
    }
}

#[test]
fn test_initial_population_is_diverse_every_time() {
    let bounds = Bounds::from_pairs(&[(0.0, 1.0), (-100.0, 100.0), (5.0, 5.5)]).unwrap();
    for _ in 0..2 {
        let config = OptimizerConfig::new(bounds.clone()).max_generations(0);
        let mut de = DifferentialEvolution::new(config, DEConfigBuilder::new().population_size(30).build());
        let result = de.optimize(&sphere);
        assert_eq!(result.termination_reason, TerminationReason::MaximumGenerationsReached);

        let threshold = de.init_min_avg_dist().unwrap();
        assert!(threshold > 0.0 && threshold <= 0.5);
        let pop = de.population().unwrap();
        assert_eq!(pop.size(), 30);
        for i in 0..pop.size() {
            for j in 0..i {
                let d = bounds.normalized_distance(&pop.entities[i].params, &pop.entities[j].params);
                assert!(d > threshold, "entities {} and {} too close: {}", i, j, d);
            }
        }
    }
}

#[test]
fn test_best_entity_ties_prefer_later_entity() {
    let flat = |_: &Array1<f64>| 1.0;
    let config = OptimizerConfig::from_pairs(&[(-1.0, 1.0); 2])
        .unwrap()
        .max_generations(0)
        .seed(5);
    let mut de = DifferentialEvolution::new(config, DEConfigBuilder::new().population_size(8).build());
    let result = de.optimize(&flat);
    let pop = de.population().unwrap();
    assert_eq!(pop.best_entity, pop.entities[7]);
    assert_eq!(result.best_params, pop.entities[7].params);
}

#[test]
fn test_flat_objective_stagnates() {
    let flat = |_: &Array1<f64>| 2.0;
    let config = OptimizerConfig::from_pairs(&[(-1.0, 1.0); 2])
        .unwrap()
        .seed(5);

    // best == average from the first generation on
    let mut de = DifferentialEvolution::new(config.clone(), DEConfigBuilder::new().build());
    let result = de.optimize(&flat);
    assert_eq!(result.termination_reason, TerminationReason::NoImprovementAbsolute);
    assert_eq!(result.generations, 1);

    let mut de = DifferentialEvolution::new(
        config,
        DEConfigBuilder::new().absolute_difference_threshold(0.0).build(),
    );
    let result = de.optimize(&flat);
    assert_eq!(result.termination_reason, TerminationReason::NoImprovementRelative);
    assert_eq!(result.generations, 101);
}

#[test]
fn test_negative_offset_objective_still_converges() {
    // every fitness below zero: best < average < 0
    let shifted = |x: &Array1<f64>| sphere(x) - 100.0;
    let config = OptimizerConfig::from_pairs(&[(-5.0, 5.0); 10])
        .unwrap()
        .optimal_fitness(-100.0 + 1e-4)
        .max_generations(2000)
        .seed(44);
    let mut de = DifferentialEvolution::new(config, DEConfigBuilder::new().build());
    let result = de.optimize(&shifted);
    assert_eq!(result.termination_reason, TerminationReason::OptimalFitnessReached, "{:?}", result);
    assert!(result.generations > 101);
}

#[test]
fn test_nan_objective() {
    let nan = |_: &Array1<f64>| f64::NAN;
    let config = OptimizerConfig::from_pairs(&[(-1.0, 1.0); 3]).unwrap().seed(1);

    let mut de = DifferentialEvolution::new(config.clone(), DEConfigBuilder::new().build());
    let rejected = de.optimize(&nan);
    assert_eq!(rejected.termination_reason, TerminationReason::InvalidConfiguration);
    assert_eq!(rejected.function_evaluations, 0);
    assert!(rejected.error.is_some());

    // Without the self-test every point is +inf and the run still ends cleanly
    let config = config.sanity_check(false).max_generations(10);
    let mut de = DifferentialEvolution::new(config.clone(), DEConfigBuilder::new().build());
    let result = de.optimize(&nan);
    assert_eq!(result.best_fitness, f64::INFINITY);
    assert!(!result.success);
    assert!(config.bounds.contains(&result.best_params));

    let mut ps = PatternSearch::new(config.clone(), PatternSearchConfigBuilder::new().build());
    let result = ps.optimize(&nan);
    assert_eq!(result.best_fitness, f64::INFINITY);
    assert!(config.bounds.contains(&result.best_params));
}

#[test]
fn test_recorder_collects_every_run() {
    let recorder = OptimizationRecorder::new("ps_sphere");
    let config = OptimizerConfig::from_pairs(&[(-3.0, 3.0); 2])
        .unwrap()
        .seed(9)
        .enable_parallel(false);
    let mut ps = PatternSearch::new(
        config,
        PatternSearchConfigBuilder::new().multistart_count(3).min_step(1e-3).build(),
    );
    ps.set_progress_callback(recorder.create_callback());
    let result = ps.optimize(&sphere);

    let records = recorder.get_records();
    assert_eq!(records.len(), result.generations);
    for run in 0..3 {
        assert!(records.iter().any(|r| r.run == run));
    }
    assert!(records.iter().all(|r| r.step.is_some()));
    let (_, best) = recorder.get_best_solution().unwrap();
    assert_eq!(best, result.best_fitness);
}

#[test]
fn test_callback_survives_repeated_runs() {
    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let config = OptimizerConfig::from_pairs(&[(-2.0, 2.0); 2])
        .unwrap()
        .max_generations(5)
        .seed(3);
    let mut de = DifferentialEvolution::new(config, DEConfigBuilder::new().build());
    de.set_progress_callback(Box::new(move |_: &Progress| *counter.lock() += 1));
    de.optimize(&sphere);
    de.optimize(&sphere);
    assert_eq!(*calls.lock(), 10);
}
