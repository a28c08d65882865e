use bbopt::{
    DEConfigBuilder, EngineKind, Fallible, ObjectiveError, OptimError, OptimizationRecorder,
    Optimizer, OptimizerConfig, OptimizerSettings, PatternSearchConfigBuilder, TerminationReason,
    build_optimizer, differential_evolution, evaluate, pattern_search, sanity_check,
    save_visited_points_csv,
};
use bbopt_testfunctions::{get_function_metadata, rastrigin, sphere};
use ndarray::Array1;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sphere_config() -> OptimizerConfig {
    OptimizerConfig::from_pairs(&[(-5.0, 5.0); 3]).unwrap().seed(1)
}

#[test]
fn test_invalid_configuration_runs_nothing() {
    init_logging();
    let cases = vec![
        differential_evolution(
            &sphere,
            sphere_config(),
            DEConfigBuilder::new().scale_factor(2.5).build(),
        ),
        differential_evolution(
            &sphere,
            sphere_config(),
            DEConfigBuilder::new().crossover_rate(-0.1).build(),
        ),
        pattern_search(
            &sphere,
            sphere_config(),
            PatternSearchConfigBuilder::new().multistart_count(0).build(),
        ),
        pattern_search(
            &sphere,
            sphere_config(),
            PatternSearchConfigBuilder::new().step_reducer(1.5).build(),
        ),
    ];
    for result in cases {
        assert_eq!(result.termination_reason, TerminationReason::InvalidConfiguration);
        assert!(!result.success);
        assert_eq!(result.function_evaluations, 0);
        assert!(result.best_params.is_empty());
        assert!(result.message().starts_with("invalid configuration: "));
    }
}

#[test]
fn test_bounds_errors_are_reported() {
    let err = OptimizerConfig::from_pairs(&[(1.0, 0.0)]).unwrap_err();
    assert!(matches!(err, OptimError::InvalidBounds { index: 0, .. }));
    let err = OptimizerConfig::from_pairs(&[]).unwrap_err();
    assert!(err.is_bounds_error());

    let settings = OptimizerSettings::from_json_str(r#"{"lower": [0, 0], "upper": [1]}"#).unwrap();
    assert!(matches!(
        build_optimizer(&settings).err(),
        Some(OptimError::BoundsMismatch { lower_len: 2, upper_len: 1 })
    ));
}

#[test]
fn test_try_optimize_exposes_errors() {
    let mut optimizer = build_optimizer(&OptimizerSettings {
        de: DEConfigBuilder::new().population_size(3).build(),
        ..OptimizerSettings::new(EngineKind::De, vec![-1.0; 2], vec![1.0; 2])
    })
    .unwrap();
    let err = optimizer.try_optimize(&sphere).unwrap_err();
    assert!(err.is_config_error());
    assert!(matches!(err, OptimError::PopulationTooSmall { pop_size: 3, required: 4 }));
}

#[test]
fn test_evaluate_is_deterministic_for_deterministic_objectives() {
    let x = Array1::from(vec![0.3, -1.2, 2.0]);
    let first = evaluate(&rastrigin, &x);
    assert!(first.is_finite());
    for _ in 0..5 {
        assert_eq!(evaluate(&rastrigin, &x), first);
    }
    let bounds = sphere_config().bounds;
    assert!(sanity_check(&rastrigin, &bounds).is_ok());
}

#[test]
fn test_fallible_objective_failures_are_absorbed() {
    init_logging();
    // fails on the left half of the box
    let objective = Fallible(|x: &Array1<f64>| -> Result<f64, ObjectiveError> {
        if x[0] < 0.0 {
            Err(ObjectiveError::Failed(format!("x0 = {}", x[0])))
        } else {
            Ok(x.iter().map(|v| (v - 1.0).powi(2)).sum())
        }
    });
    for engine in [EngineKind::De, EngineKind::Ps] {
        let mut settings = OptimizerSettings::new(engine, vec![-4.0; 2], vec![4.0; 2]);
        settings.seed = Some(12);
        settings.optimal_fitness = Some(1e-6);
        let mut optimizer = build_optimizer(&settings).unwrap();
        let result = optimizer.optimize(&objective);
        assert!(result.success, "{}: {:?}", engine, result);
        assert!(result.best_params[0] >= 0.0);
    }
}

#[test]
fn test_settings_file_drives_both_engines() {
    let dir = tempfile::tempdir().unwrap();
    for (engine, body) in [
        ("de", r#""de": {"mutation": "best1", "population_size": 20}"#),
        ("ps", r#""ps": {"multistart_count": 2, "max_exploit_count": 2}"#),
    ] {
        let path = dir.path().join(format!("{}.json", engine));
        let text = format!(
            r#"{{"engine": "{}", "lower": [-5, -5], "upper": [5, 5], "optimal_fitness": 1e-6, "seed": 4, {}}}"#,
            engine, body
        );
        std::fs::write(&path, text).unwrap();

        let settings = OptimizerSettings::from_json_file(&path).unwrap();
        let mut optimizer = build_optimizer(&settings).unwrap();
        let result = optimizer.optimize(&sphere);
        assert!(result.success, "{}: {:?}", engine, result);
    }
}

#[test]
fn test_recorder_and_visited_points_csv() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = OptimizerConfig::from_pairs(&[(-5.0, 5.0); 2])
        .unwrap()
        .max_generations(20)
        .log_points(true)
        .seed(2);
    let recorder = OptimizationRecorder::new("sphere_de");
    let mut optimizer = bbopt::DifferentialEvolution::new(config, DEConfigBuilder::new().build());
    optimizer.set_progress_callback(recorder.create_callback());
    let result = optimizer.optimize(&sphere);
    assert_eq!(result.termination_reason, TerminationReason::MaximumGenerationsReached);
    assert_eq!(recorder.num_records(), 20);

    let path = recorder.save_to_csv(dir.path()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 21);

    let visited_path = dir.path().join("visited.csv");
    let rows = save_visited_points_csv(&result, &visited_path).unwrap();
    // 16 entities, initial point plus one per generation
    assert_eq!(rows, 16 * 21);
    let text = std::fs::read_to_string(&visited_path).unwrap();
    assert_eq!(text.lines().next(), Some("run,step,x0,x1"));
}

#[test]
fn test_every_registered_function_runs_with_both_engines() {
    for (name, meta) in get_function_metadata() {
        let bounds = meta.bounds_for_dim(meta.bounds.len()).unwrap();
        let config = OptimizerConfig::from_pairs(&bounds)
            .unwrap()
            .max_generations(30)
            .seed(1);
        let de = differential_evolution(&meta.function, config.clone(), DEConfigBuilder::new().build());
        let ps = pattern_search(&meta.function, config.clone(), PatternSearchConfigBuilder::new().build());
        for result in [de, ps] {
            assert!(result.termination_reason.is_terminated(), "{}", name);
            assert!(config.bounds.contains(&result.best_params), "{}", name);
            assert!(result.best_fitness.is_finite(), "{}", name);
        }
    }
}
