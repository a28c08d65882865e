use crate::entity::{Entity, Offspring};

/// DE population state for one run.
///
/// Replaced wholesale at the start of every `optimize` call.
#[derive(Debug, Clone)]
pub struct Population {
    pub entities: Vec<Entity>,
    /// Trial vectors of the last generation, one slot per entity
    pub offspring: Vec<Offspring>,
    pub best_entity: Entity,
    pub average_fitness: f64,
    pub previous_best_fitness: f64,
    pub function_evaluations: usize,
    /// `best / average` of the last generation
    pub relative_difference: f64,
    /// `average - best` of the last generation
    pub absolute_difference: f64,
    /// Consecutive generations with `relative_difference` above its threshold
    pub relative_difference_streak: usize,
}

impl Population {
    /// Build from evaluated entities; `entities` must not be empty.
    pub(crate) fn from_evaluated(entities: Vec<Entity>) -> Self {
        let evaluations = entities.len();
        let mut population = Self {
            best_entity: entities[0].clone(),
            entities,
            offspring: Vec::new(),
            average_fitness: f64::INFINITY,
            previous_best_fitness: f64::INFINITY,
            function_evaluations: evaluations,
            relative_difference: 0.0,
            absolute_difference: f64::INFINITY,
            relative_difference_streak: 0,
        };
        population.update_best_and_average();
        population.previous_best_fitness = f64::INFINITY;
        population
    }

    pub fn size(&self) -> usize {
        self.entities.len()
    }

    /// Scan for the best entity and recompute the average fitness.
    ///
    /// The scan starts from the current best and replaces on `<=`, so on
    /// exact ties the later entity wins.
    pub(crate) fn update_best_and_average(&mut self) {
        self.previous_best_fitness = self.best_entity.fitness;
        let mut best = None;
        let mut best_fitness = self.best_entity.fitness;
        let mut sum = 0.0;
        for (i, e) in self.entities.iter().enumerate() {
            if e.fitness <= best_fitness {
                best_fitness = e.fitness;
                best = Some(i);
            }
            sum += e.fitness;
        }
        if let Some(i) = best {
            self.best_entity = self.entities[i].clone();
        }
        self.average_fitness = sum / self.entities.len() as f64;
    }

    /// Stagnation statistics for the termination rules.
    ///
    /// The relative difference is the magnitude ratio of best and average,
    /// in `[0, 1]`, and 0 when their signs differ.
    pub(crate) fn update_statistics(&mut self, relative_threshold: f64) {
        let best = self.best_entity.fitness;
        let average = self.average_fitness;
        self.absolute_difference = average - best;
        self.relative_difference = magnitude_ratio(best, average);
        if self.relative_difference > relative_threshold {
            self.relative_difference_streak += 1;
        } else {
            self.relative_difference_streak = 0;
        }
    }

    /// Parameter vectors of every entity, in index order
    pub fn params(&self) -> Vec<Vec<f64>> {
        self.entities.iter().map(|e| e.params.to_vec()).collect()
    }
}

fn magnitude_ratio(a: f64, b: f64) -> f64 {
    if a == b {
        1.0
    } else if a * b > 0.0 {
        a.abs().min(b.abs()) / a.abs().max(b.abs())
    } else {
        0.0
    }
}
