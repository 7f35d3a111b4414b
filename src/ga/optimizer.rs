//! Generational loop: tournament selection, crossover, mutation, elitism.

use log::{debug, info};
use rand::Rng;

use crate::ga::{Chromosome, Mutation};
use crate::geometry::NoFlyZone;
use crate::models::{Delivery, Drone};

/// Tunable parameters of the genetic optimizer.
///
/// # Examples
///
/// ```
/// use skyfleet::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(30)
///     .with_generations(40);
/// assert_eq!(config.population_size, 30);
/// assert_eq!(config.generations, 40);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GaConfig {
    /// Individuals per generation.
    pub population_size: usize,
    /// Fixed generation budget; no early stopping.
    pub generations: usize,
    /// Probability a selected pair is crossed over.
    pub crossover_rate: f64,
    /// Probability an offspring is mutated.
    pub mutation_rate: f64,
    /// Top individuals carried unchanged into the next generation.
    pub elite_size: usize,
    /// Tournament size for parent selection.
    pub tournament_size: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            elite_size: 5,
            tournament_size: 3,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the generation budget.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Sets the elite count.
    pub fn with_elite_size(mut self, size: usize) -> Self {
        self.elite_size = size;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }
}

/// Population-based search over drone→delivery partitions.
///
/// Evolves [`Chromosome`]s toward higher fitness with tournament selection,
/// split-point crossover, the four [`Mutation`] operators (each followed by
/// capacity repair), and elitism. The best individual ever seen is tracked
/// across generations and only replaced on strict improvement.
///
/// All randomness flows through the caller-supplied `Rng`, so seeded runs
/// reproduce exactly.
pub struct GeneticOptimizer<'a> {
    drones: &'a [Drone],
    deliveries: &'a [Delivery],
    zones: &'a [NoFlyZone],
    config: GaConfig,
    population: Vec<Chromosome>,
    best: Option<Chromosome>,
    fitness_history: Vec<f64>,
}

impl<'a> GeneticOptimizer<'a> {
    /// Creates an optimizer for the given scenario.
    pub fn new(
        drones: &'a [Drone],
        deliveries: &'a [Delivery],
        zones: &'a [NoFlyZone],
        config: GaConfig,
    ) -> Self {
        Self {
            drones,
            deliveries,
            zones,
            config,
            population: Vec::new(),
            best: None,
            fitness_history: Vec::new(),
        }
    }

    /// Per-generation best fitness, one entry per generation run so far.
    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    /// The best individual seen so far, if any generation has run.
    pub fn best(&self) -> Option<&Chromosome> {
        self.best.as_ref()
    }

    /// Runs the full generation budget and returns the best individual.
    pub fn evolve<R: Rng>(&mut self, rng: &mut R) -> Chromosome {
        info!(
            "starting genetic search: {} drones, {} deliveries, pop {}, {} generations",
            self.drones.len(),
            self.deliveries.len(),
            self.config.population_size,
            self.config.generations
        );
        self.initialize_population(rng);

        for generation in 0..self.config.generations {
            for individual in &mut self.population {
                individual.evaluate(self.drones, self.deliveries, self.zones);
            }

            if let Some(current_best) = self
                .population
                .iter()
                .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            {
                if self
                    .best
                    .as_ref()
                    .is_none_or(|b| current_best.fitness() > b.fitness())
                {
                    self.best = Some(current_best.clone());
                }
                self.fitness_history.push(current_best.fitness());

                if generation % 10 == 0 {
                    let avg = self.population.iter().map(Chromosome::fitness).sum::<f64>()
                        / self.population.len() as f64;
                    debug!(
                        "generation {generation}: best {:.2}, avg {avg:.2}",
                        current_best.fitness()
                    );
                }
            }

            self.population = self.next_generation(rng);
        }

        let best = self.best.clone().unwrap_or_else(|| {
            let mut empty = Chromosome::new(self.drones);
            empty.evaluate(self.drones, self.deliveries, self.zones);
            empty
        });
        info!("genetic search done: best fitness {:.2}", best.fitness());
        best
    }

    fn initialize_population(&mut self, rng: &mut impl Rng) {
        self.population = (0..self.config.population_size)
            .map(|_| {
                let mut individual = Chromosome::new(self.drones);
                individual.randomize(rng, self.drones, self.deliveries);
                individual.repair(self.drones, self.deliveries);
                individual.evaluate(self.drones, self.deliveries, self.zones);
                individual
            })
            .collect();
    }

    fn next_generation<R: Rng>(&self, rng: &mut R) -> Vec<Chromosome> {
        let mut next = Vec::with_capacity(self.config.population_size);

        let mut ranked: Vec<&Chromosome> = self.population.iter().collect();
        ranked.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        next.extend(
            ranked
                .iter()
                .take(self.config.elite_size)
                .map(|c| (*c).clone()),
        );

        while next.len() < self.config.population_size {
            let parent1 = self.tournament(rng);
            let parent2 = self.tournament(rng);
            let (Some(parent1), Some(parent2)) = (parent1, parent2) else {
                break;
            };

            let (mut child1, mut child2) = self.crossover(&parent1, &parent2, rng);
            self.mutate(&mut child1, rng);
            self.mutate(&mut child2, rng);
            child1.evaluate(self.drones, self.deliveries, self.zones);
            child2.evaluate(self.drones, self.deliveries, self.zones);

            next.push(child1);
            next.push(child2);
        }

        next.truncate(self.config.population_size);
        next
    }

    /// Tournament selection: a distinct random sample, highest fitness wins.
    fn tournament<R: Rng>(&self, rng: &mut R) -> Option<Chromosome> {
        if self.population.is_empty() {
            return None;
        }
        let k = self.config.tournament_size.min(self.population.len()).max(1);
        rand::seq::index::sample(rng, self.population.len(), k)
            .iter()
            .map(|i| &self.population[i])
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            .cloned()
    }

    /// Rate-gated split-point crossover.
    ///
    /// Children swap the gene lists of every drone before a random split in
    /// drone-id order, then duplicates across drones are resolved by keeping
    /// the first occurrence in iteration order.
    fn crossover<R: Rng>(
        &self,
        parent1: &Chromosome,
        parent2: &Chromosome,
        rng: &mut R,
    ) -> (Chromosome, Chromosome) {
        let mut child1 = parent1.clone();
        let mut child2 = parent2.clone();

        if self.drones.len() >= 2 && rng.random_bool(self.config.crossover_rate) {
            let split = rng.random_range(1..self.drones.len());
            for drone in &self.drones[..split] {
                let id = drone.id();
                let a = child1.genes().get(&id).cloned().unwrap_or_default();
                let b = child2.genes().get(&id).cloned().unwrap_or_default();
                child1.genes_mut().insert(id, b);
                child2.genes_mut().insert(id, a);
            }
            resolve_duplicates(&mut child1);
            resolve_duplicates(&mut child2);
        }

        (child1, child2)
    }

    /// Rate-gated mutation; repair runs unconditionally afterwards.
    fn mutate<R: Rng>(&self, individual: &mut Chromosome, rng: &mut R) {
        if rng.random_bool(self.config.mutation_rate) {
            Mutation::random(rng).apply(individual, rng, self.drones, self.deliveries);
        }
        individual.repair(self.drones, self.deliveries);
    }
}

/// Keeps only the first occurrence of every delivery ID in drone-iteration
/// order; later duplicates are dropped.
fn resolve_duplicates(chromosome: &mut Chromosome) {
    let mut seen = std::collections::BTreeSet::new();
    for list in chromosome.genes_mut().values_mut() {
        list.retain(|&id| seen.insert(id));
    }
}
