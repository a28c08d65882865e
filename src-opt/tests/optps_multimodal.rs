use bbopt::{OptimizerConfig, PatternSearchConfigBuilder, TerminationReason, pattern_search};
use bbopt_testfunctions::{booth, get_function_bounds, himmelblau};

#[test]
fn test_ps_booth() {
    let bounds = get_function_bounds("booth").unwrap();
    let config = OptimizerConfig::from_pairs(&bounds)
        .unwrap()
        .optimal_fitness(1e-8)
        .max_generations(5000)
        .seed(5);
    let result = pattern_search(&booth, config, PatternSearchConfigBuilder::new().build());
    assert!(result.success, "{:?}", result);
    assert!((result.best_params[0] - 1.0).abs() < 1e-3);
    assert!((result.best_params[1] - 3.0).abs() < 1e-3);
}

#[test]
fn test_ps_himmelblau_multistart() {
    // four global minima, all at f = 0
    let bounds = get_function_bounds("himmelblau").unwrap();
    let config = OptimizerConfig::from_pairs(&bounds)
        .unwrap()
        .max_generations(5000)
        .seed(8)
        .log_points(true);
    let result = pattern_search(
        &himmelblau,
        config,
        PatternSearchConfigBuilder::new()
            .multistart_count(6)
            .min_step(1e-7)
            .build(),
    );
    assert_eq!(result.termination_reason, TerminationReason::MinimumStepReached);
    assert!(result.best_fitness < 1e-6, "{:?}", result);
    assert_eq!(result.visited_points.unwrap().len(), 6);
}
