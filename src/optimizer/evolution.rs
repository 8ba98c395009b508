use rand::Rng;
use tracing::debug;

use crate::config::OptimizerConfig;
use crate::error::Result;

use super::adapter::SimulatorAdapter;
use super::fitness::Diagnostics;
use super::genome::Codec;
use super::variation::{crossover_two_point, mutate, tournament_select};

/// One candidate plan plus its fitness and diagnostic tuple.
#[derive(Debug, Clone)]
pub struct Individual {
    pub genome: Vec<i32>,
    pub fitness: f64,
    pub diagnostics: Option<Diagnostics>,
}

/// Per-generation bookkeeping: just the minimum fitness, matching the only
/// statistic the termination and elitism invariants need.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub min_fitness_per_generation: Vec<f64>,
}

/// Runs the μ+λ generational loop against one [`SimulatorAdapter`].
pub struct EvolutionLoop<'a, R: Rng> {
    codec: Codec,
    adapter: &'a mut SimulatorAdapter,
    config: &'a OptimizerConfig,
    rng: &'a mut R,
}

impl<'a, R: Rng> EvolutionLoop<'a, R> {
    pub fn new(
        codec: Codec,
        adapter: &'a mut SimulatorAdapter,
        config: &'a OptimizerConfig,
        rng: &'a mut R,
    ) -> Self {
        Self {
            codec,
            adapter,
            config,
            rng,
        }
    }

    fn evaluate(&mut self, genome: Vec<i32>) -> Result<Individual> {
        let (_, fitness, diagnostics) = self.adapter.evaluate(&genome)?;
        Ok(Individual {
            genome,
            fitness,
            diagnostics,
        })
    }

    /// Seed the initial population: `initial_population` random individuals,
    /// with up to three copies of a caller-supplied start solution injected
    /// at the head before the first μ-selection trims it down.
    fn seed_population(&mut self, start_solution: Option<&[i32]>) -> Result<Vec<Individual>> {
        let mut genomes = Vec::with_capacity(self.config.initial_population);
        if let Some(start) = start_solution {
            for _ in 0..3 {
                genomes.push(start.to_vec());
            }
        }
        while genomes.len() < self.config.initial_population {
            genomes.push(self.codec.new_random_individual(self.rng));
        }

        let mut population = Vec::with_capacity(genomes.len());
        for genome in genomes {
            population.push(self.evaluate(genome)?);
        }
        Ok(population)
    }

    fn produce_offspring(&mut self, population: &[Individual]) -> Result<Vec<Individual>> {
        let fitnesses: Vec<f64> = population.iter().map(|ind| ind.fitness).collect();
        let mut offspring_genomes = Vec::with_capacity(self.config.lambda);

        while offspring_genomes.len() < self.config.lambda {
            let i = tournament_select(&fitnesses, self.config.tournament_size, self.rng);
            let j = tournament_select(&fitnesses, self.config.tournament_size, self.rng);

            let (mut child_a, child_b) = if self.rng.gen_bool(self.config.cxpb) {
                crossover_two_point(
                    &population[i].genome,
                    &population[j].genome,
                    &self.codec,
                    self.rng,
                )
            } else {
                (population[i].genome.clone(), population[j].genome.clone())
            };

            if self.rng.gen_bool(self.config.mutpb) {
                mutate(&mut child_a, &self.codec, self.config.gene_mutation_rate, self.rng);
            }
            offspring_genomes.push(child_a);

            if offspring_genomes.len() < self.config.lambda {
                let mut child_b = child_b;
                if self.rng.gen_bool(self.config.mutpb) {
                    mutate(
                        &mut child_b,
                        &self.codec,
                        self.config.gene_mutation_rate,
                        self.rng,
                    );
                }
                offspring_genomes.push(child_b);
            }
        }

        let mut offspring = Vec::with_capacity(offspring_genomes.len());
        for genome in offspring_genomes {
            offspring.push(self.evaluate(genome)?);
        }
        Ok(offspring)
    }

    /// Select the best `mu` individuals from `pool`, minimizing fitness,
    /// ties broken positionally (stable sort keeps first occurrence first).
    fn select_best(&self, mut pool: Vec<Individual>, mu: usize) -> Vec<Individual> {
        pool.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
        pool.truncate(mu);
        pool
    }

    /// Run the full generational loop and return the best-ever individual,
    /// per-generation statistics, and the final population (for the
    /// per-individual diagnostic collection, which — matching the reference
    /// design — reports only the last generation, not every individual ever
    /// evaluated).
    #[allow(clippy::type_complexity)]
    pub fn run(
        &mut self,
        start_solution: Option<&[i32]>,
    ) -> Result<(Individual, Statistics, Vec<Individual>)> {
        let mut population = self.seed_population(start_solution)?;
        population = self.select_best(population, self.config.mu);

        let mut hall_of_fame = population[0].clone();
        let mut stats = Statistics {
            min_fitness_per_generation: Vec::with_capacity(self.config.ngen),
        };

        for generation in 0..self.config.ngen {
            let offspring = self.produce_offspring(&population)?;
            let mut combined = population;
            combined.extend(offspring);
            population = self.select_best(combined, self.config.mu);

            if population[0].fitness < hall_of_fame.fitness {
                hall_of_fame = population[0].clone();
            }
            stats.min_fitness_per_generation.push(hall_of_fame.fitness);
            debug!(generation, min_fitness = hall_of_fame.fitness, "generation complete");
        }

        Ok((hall_of_fame, stats, population))
    }
}
