//! Differential Evolution engine.
//!
//! Each generation builds one trial per entity from a read-only snapshot of
//! the population (parallel over entities), then applies greedy selection
//! and the best/average reduction sequentially.

use std::panic::{self, AssertUnwindSafe};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::crossover_binomial::binomial_mask;
use crate::crossover_exponential::exponential_mask;
use crate::de_config::DEConfig;
use crate::distinct_indices::distinct_indices;
use crate::entity::{Entity, Offspring};
use crate::error::Result;
use crate::init_distinct::init_distinct;
use crate::mutant_best1::mutant_best1;
use crate::mutant_best2::mutant_best2;
use crate::mutant_rand1::mutant_rand1;
use crate::mutant_rand2::mutant_rand2;
use crate::objective::{Objective, evaluate};
use crate::optimizer::{OptimizationResult, Optimizer, OptimizerConfig, Progress, ProgressCallback};
use crate::parallel_eval::evaluate_points_parallel;
use crate::population::Population;
use crate::smooth_clamp::smooth_clamp_inplace;
use crate::termination::{TerminationCriteria, TerminationReason, TerminationSnapshot};
use crate::{CrossoverStrategy, MutationStrategy};

/// Factor applied to the diversity threshold after too many failed draws
const MIN_AVG_DIST_RELAX: f64 = 0.8;

/// Population-based optimiser (DE/x/y/bin|exp with greedy selection).
pub struct DifferentialEvolution {
    config: OptimizerConfig,
    de: DEConfig,
    callback: Option<ProgressCallback>,
    population: Option<Population>,
    init_min_avg_dist: Option<f64>,
}

impl DifferentialEvolution {
    pub fn new(config: OptimizerConfig, de: DEConfig) -> Self {
        Self {
            config,
            de,
            callback: None,
            population: None,
            init_min_avg_dist: None,
        }
    }

    pub fn de_config(&self) -> &DEConfig {
        &self.de
    }

    /// Population of the last run, if any
    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// Diversity threshold in force at the end of the last initialisation
    pub fn init_min_avg_dist(&self) -> Option<f64> {
        self.init_min_avg_dist
    }

    fn criteria(&self) -> TerminationCriteria {
        TerminationCriteria {
            optimal_fitness: self.config.optimal_fitness,
            inclusive_optimum: true,
            max_generations: self.config.max_generations,
            max_function_evaluations: self.config.max_function_evaluations,
            relative_streak_limit: Some(self.de.relative_difference_streak_limit),
            absolute_difference_threshold: Some(self.de.absolute_difference_threshold),
            min_step: None,
        }
    }

    /// Draw and evaluate the initial population.
    fn initialize(&mut self, npop: usize, objective: &dyn Objective) -> Population {
        let mut rng: StdRng = match self.config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => {
                let mut thread_rng = rand::rng();
                StdRng::from_rng(&mut thread_rng)
            }
        };
        let (points, min_avg_dist) = init_distinct(
            &self.config.bounds,
            npop,
            self.de.initial_min_avg_dist,
            self.de.distinct_entity_max_trials,
            MIN_AVG_DIST_RELAX,
            &mut rng,
        );
        self.init_min_avg_dist = Some(min_avg_dist);

        let fitness = evaluate_points_parallel(&points, objective, &self.config.parallel);
        let entities = points
            .into_iter()
            .zip(fitness)
            .map(|(p, f)| Entity::with_fitness(p, f))
            .collect();
        Population::from_evaluated(entities)
    }

    /// Greedy selection; ties go to the trial.
    fn select(pop: &mut Population, offspring: Vec<Offspring>) {
        for (entity, off) in pop.entities.iter_mut().zip(offspring.iter()) {
            if off.entity.fitness <= entity.fitness {
                *entity = off.entity.clone();
            }
        }
        pop.function_evaluations += offspring.len();
        pop.offspring = offspring;
    }
}

/// RNG stream for one (generation, entity) task
fn task_rng(seed: Option<u64>, generation: usize, eid: usize) -> StdRng {
    match seed {
        Some(base_seed) => StdRng::seed_from_u64(
            base_seed
                .wrapping_add((generation as u64) << 32)
                .wrapping_add(eid as u64),
        ),
        None => {
            let mut thread_rng = rand::rng();
            StdRng::from_rng(&mut thread_rng)
        }
    }
}

/// Trial vector for entity `eid`, evaluated.
fn build_offspring(
    config: &OptimizerConfig,
    de: &DEConfig,
    pop: &Population,
    eid: usize,
    generation: usize,
    objective: &dyn Objective,
) -> Offspring {
    let n = config.bounds.dim();
    let mut rng = task_rng(config.seed, generation, eid);

    let parents = distinct_indices(eid, de.mutation.parent_count(), pop.size(), &mut rng);
    let mask = match de.crossover {
        CrossoverStrategy::Bin => binomial_mask(n, de.crossover_rate, &mut rng),
        CrossoverStrategy::Exp => exponential_mask(n, de.crossover_rate, &mut rng),
    };

    let f = de.scale_factor;
    let best = &pop.best_entity.params;
    let mutant = match de.mutation {
        MutationStrategy::Rand1 => mutant_rand1(&pop.entities, &parents, f),
        MutationStrategy::Best1 => mutant_best1(&pop.entities, &parents, best, f),
        MutationStrategy::Rand2 => mutant_rand2(&pop.entities, &parents, f),
        MutationStrategy::Best2 => mutant_best2(&pop.entities, &parents, best, f),
    };

    let target = &pop.entities[eid].params;
    let mut trial = target.clone();
    for (j, &take) in mask.iter().enumerate() {
        if take {
            trial[j] = mutant[j];
        }
    }
    smooth_clamp_inplace(&mut trial, target, &config.bounds);

    let fitness = evaluate(objective, &trial);
    Offspring {
        entity: Entity::with_fitness(trial, fitness),
        parent_indices: parents,
        crossover_mask: mask,
    }
}

/// All trials of one generation; reads `pop` only.
fn breed(
    config: &OptimizerConfig,
    de: &DEConfig,
    pop: &Population,
    generation: usize,
    objective: &dyn Objective,
) -> Vec<Offspring> {
    if config.parallel.enabled {
        (0..pop.size())
            .into_par_iter()
            .map(|eid| build_offspring(config, de, pop, eid, generation, objective))
            .collect()
    } else {
        (0..pop.size())
            .map(|eid| build_offspring(config, de, pop, eid, generation, objective))
            .collect()
    }
}

impl Optimizer for DifferentialEvolution {
    fn name(&self) -> &'static str {
        "differential evolution"
    }

    fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn set_progress_callback(&mut self, callback: ProgressCallback) {
        self.callback = Some(callback);
    }

    fn try_optimize(&mut self, objective: &dyn Objective) -> Result<OptimizationResult> {
        let n = self.config.bounds.dim();
        let npop = self.de.validate(n)?;
        self.config.prepare(objective)?;
        self.population = None;

        info!(
            "DE start: {} dimensions, population={}, strategy={}/{}, F={}, CR={}",
            n, npop, self.de.mutation, self.de.crossover, self.de.scale_factor, self.de.crossover_rate
        );

        let criteria = self.criteria();
        let mut pop = self.initialize(npop, objective);
        let mut visited: Option<Vec<Vec<Vec<f64>>>> = self
            .config
            .log_points
            .then(|| pop.entities.iter().map(|e| vec![e.params.to_vec()]).collect());
        debug!(
            "DE init: best={:.6e}, average={:.6e}",
            pop.best_entity.fitness, pop.average_fitness
        );

        let mut generation = 0usize;
        let mut callback = self.callback.take();
        let reason = loop {
            let reason = criteria.check(&TerminationSnapshot {
                generation,
                best_fitness: pop.best_entity.fitness,
                function_evaluations: pop.function_evaluations,
                relative_difference_streak: pop.relative_difference_streak,
                absolute_difference: Some(pop.absolute_difference),
                step: None,
            });
            if reason.is_terminated() {
                break reason;
            }

            generation += 1;
            let bred = panic::catch_unwind(AssertUnwindSafe(|| {
                breed(&self.config, &self.de, &pop, generation, objective)
            }));
            let offspring = match bred {
                Ok(offspring) => offspring,
                Err(_) => {
                    warn!("DE generation {} failed, keeping the previous population", generation);
                    generation -= 1;
                    break TerminationReason::UnexpectedError;
                }
            };
            Self::select(&mut pop, offspring);
            pop.update_best_and_average();
            pop.update_statistics(self.de.relative_difference_threshold);

            if let Some(v) = visited.as_mut() {
                for (history, e) in v.iter_mut().zip(pop.entities.iter()) {
                    history.push(e.params.to_vec());
                }
            }
            debug!(
                "DE gen {:4}: best={:.6e}, average={:.6e}, fevals={}, streak={}",
                generation,
                pop.best_entity.fitness,
                pop.average_fitness,
                pop.function_evaluations,
                pop.relative_difference_streak
            );
            if let Some(cb) = callback.as_mut() {
                let progress = Progress {
                    run: 0,
                    generation,
                    best_fitness: pop.best_entity.fitness,
                    average_fitness: pop.average_fitness,
                    step: None,
                    best_params: pop.best_entity.params.clone(),
                };
                if panic::catch_unwind(AssertUnwindSafe(|| cb(&progress))).is_err() {
                    warn!("DE progress callback failed at generation {}", generation);
                    break TerminationReason::UnexpectedError;
                }
            }
        };
        self.callback = callback;

        info!(
            "DE done after {} generations, {} evaluations: {} (best={:.6e})",
            generation, pop.function_evaluations, reason, pop.best_entity.fitness
        );

        let result = OptimizationResult {
            best_params: pop.best_entity.params.clone(),
            best_fitness: pop.best_entity.fitness,
            success: reason.is_success(),
            termination_reason: reason,
            function_evaluations: pop.function_evaluations,
            generations: generation,
            visited_points: visited,
            error: None,
        };
        self.population = Some(pop);
        Ok(result)
    }
}

/// Run Differential Evolution on `objective` with the given configuration.
pub fn differential_evolution<O: Objective>(
    objective: &O,
    config: OptimizerConfig,
    de: DEConfig,
) -> OptimizationResult {
    DifferentialEvolution::new(config, de).optimize(objective)
}
