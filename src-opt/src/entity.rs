use ndarray::Array1;

/// A candidate solution: parameter vector plus its fitness.
///
/// `fitness` starts at `+inf`, meaning "not evaluated" and worse than any
/// real value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub params: Array1<f64>,
    pub fitness: f64,
}

impl Entity {
    /// An unevaluated entity at `params`
    pub fn new(params: Array1<f64>) -> Self {
        Self {
            params,
            fitness: f64::INFINITY,
        }
    }

    pub fn with_fitness(params: Array1<f64>, fitness: f64) -> Self {
        Self { params, fitness }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }
}

/// A DE trial vector for one generation, with the parents and crossover mask
/// it was built from.
#[derive(Debug, Clone)]
pub struct Offspring {
    pub entity: Entity,
    pub parent_indices: Vec<usize>,
    pub crossover_mask: Vec<bool>,
}
