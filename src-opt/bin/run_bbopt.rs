//! Run one of the optimisers on a registered benchmark function.
//!
//! ```text
//! run_bbopt --function rosenbrock --engine de --dim 2 --optimal-fitness 1e-4
//! run_bbopt --function rastrigin --engine ps --multistart 8 --csv out/
//! run_bbopt --function sphere --config settings.json
//! ```
//!
//! `RUST_LOG=debug` shows per-generation progress.

use std::error::Error;
use std::path::PathBuf;

use bbopt::{
    CrossoverStrategy, EngineKind, MutationStrategy, OptimError, OptimizationRecorder,
    OptimizerSettings, build_optimizer, save_visited_points_csv,
};
use bbopt_testfunctions::get_function_metadata;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Black-box optimisation of benchmark functions")]
struct Args {
    /// Benchmark function name (see --list)
    #[arg(long, default_value = "sphere")]
    function: String,

    /// Print the registered functions and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Optimiser: de or ps
    #[arg(long, default_value = "de")]
    engine: EngineKind,

    /// Problem dimension (defaults to the function's own)
    #[arg(long)]
    dim: Option<usize>,

    /// JSON settings file; overrides every engine option below
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "rand1")]
    strategy: MutationStrategy,

    #[arg(long, default_value = "bin")]
    crossover: CrossoverStrategy,

    /// DE population size (default 8 * dim)
    #[arg(long)]
    population: Option<usize>,

    /// DE scale factor F
    #[arg(long, default_value_t = 0.5)]
    f: f64,

    /// DE crossover rate CR
    #[arg(long, default_value_t = 0.9)]
    cr: f64,

    /// Pattern search runs
    #[arg(long, default_value_t = 4)]
    multistart: usize,

    /// Pattern search extra steps along an improving direction
    #[arg(long, default_value_t = 0)]
    exploit: usize,

    #[arg(long, default_value_t = 1e-8)]
    min_step: f64,

    #[arg(long)]
    optimal_fitness: Option<f64>,

    #[arg(long, default_value_t = 1000)]
    max_generations: usize,

    #[arg(long, default_value_t = 1_000_000)]
    max_evaluations: usize,

    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Directory for the progress CSV (and visited points)
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn settings_from_args(args: &Args, bounds: &[(f64, f64)]) -> Result<OptimizerSettings, OptimError> {
    if let Some(path) = &args.config {
        return OptimizerSettings::from_json_file(path);
    }
    let lower = bounds.iter().map(|b| b.0).collect();
    let upper = bounds.iter().map(|b| b.1).collect();
    let mut s = OptimizerSettings::new(args.engine, lower, upper);
    s.optimal_fitness = args.optimal_fitness;
    s.max_generations = args.max_generations;
    s.max_function_evaluations = args.max_evaluations;
    s.seed = args.seed;
    s.num_threads = args.threads;
    s.log_points = args.csv.is_some();
    s.de.population_size = args.population;
    s.de.mutation = args.strategy;
    s.de.crossover = args.crossover;
    s.de.scale_factor = args.f;
    s.de.crossover_rate = args.cr;
    s.ps.multistart_count = args.multistart;
    s.ps.max_exploit_count = args.exploit;
    s.ps.min_step = args.min_step;
    Ok(s)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let registry = get_function_metadata();

    if args.list {
        let mut names: Vec<&String> = registry.keys().collect();
        names.sort();
        for name in names {
            let meta = &registry[name];
            println!(
                "{:<12} dim={} multimodal={} any_dimension={}",
                name,
                meta.bounds.len(),
                meta.multimodal,
                meta.any_dimension
            );
        }
        return Ok(());
    }

    let meta = registry
        .get(&args.function)
        .ok_or_else(|| OptimError::UnknownFunction(args.function.clone()))?;
    let dim = args.dim.unwrap_or(meta.bounds.len());
    let bounds = meta
        .bounds_for_dim(dim)
        .ok_or_else(|| format!("{} is only defined for {} dimensions", meta.name, meta.bounds.len()))?;

    let settings = settings_from_args(&args, &bounds)?;
    let mut optimizer = build_optimizer(&settings)?;
    info!("running {} on {} ({} dimensions)", optimizer.name(), meta.name, dim);

    let recorder = OptimizationRecorder::new(format!("{}_{}", meta.name, settings.engine));
    if args.csv.is_some() {
        optimizer.set_progress_callback(recorder.create_callback());
    }

    let function = meta.function;
    let result = optimizer.optimize(&function);

    println!("termination: {}", result.message());
    println!("success: {}", result.success);
    println!("best fitness: {:.6e}", result.best_fitness);
    println!("best params: {:?}", result.best_params.to_vec());
    println!(
        "evaluations: {}, generations: {}",
        result.function_evaluations, result.generations
    );

    if let Some(dir) = &args.csv {
        let path = recorder.save_to_csv(dir)?;
        println!("progress saved to {}", path.display());
        let visited_path = dir.join(format!("{}_{}_visited.csv", meta.name, settings.engine));
        let rows = save_visited_points_csv(&result, &visited_path)?;
        println!("{} visited points saved to {}", rows, visited_path.display());
    }
    Ok(())
}
