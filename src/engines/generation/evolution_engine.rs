use crate::config::traits::ConfigSection;
use crate::config::EvolutionConfig;
use crate::engines::evaluation::FitnessContext;
use crate::engines::generation::{
    genome::Genome,
    operators::{crossover, mutate, select_elites, MutationKind},
};
use crate::engines::simulation::SimulationResults;
use crate::error::BoolfitError;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// Stage of one evolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No elite has reached a non-zero fitness yet.
    Bootstrap,
    SteadyState,
    Done,
}

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, worst_elite_fitness: f64, phase: Phase);
    fn on_model_evaluated(&mut self, model_num: usize, total: usize);
}

impl<C: ProgressCallback + ?Sized> ProgressCallback for &mut C {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation)
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, worst_elite_fitness: f64, phase: Phase) {
        (**self).on_generation_complete(generation, best_fitness, worst_elite_fitness, phase)
    }

    fn on_model_evaluated(&mut self, model_num: usize, total: usize) {
        (**self).on_model_evaluated(model_num, total)
    }
}

/// Result of [`EvolutionEngine::run`].
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    /// Final elite pool, best first.
    pub elites: Vec<Genome>,
    pub generations_run: usize,
    /// Whether the worst elite exceeded the target fitness.
    pub converged: bool,
    /// Phase the run was in when it left the generation loop.
    pub final_phase: Phase,
}

/// Mutation counts applied to every child of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MutationPlan {
    balance: usize,
    random: usize,
    shuffle: usize,
    topology: usize,
}

pub struct EvolutionEngine {
    config: EvolutionConfig,
    context: Arc<FitnessContext>,
    rng: StdRng,
    phase: Phase,
    simulation: usize,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig, context: Arc<FitnessContext>, seed: u64) -> Self {
        Self {
            config,
            context,
            rng: StdRng::seed_from_u64(seed),
            phase: Phase::Bootstrap,
            simulation: 0,
        }
    }

    /// Index of the simulation this engine runs, used in child names and result rows.
    pub fn with_simulation(mut self, simulation: usize) -> Self {
        self.simulation = simulation;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Evolve `base` for at most `generations` generations.
    pub fn run<C: ProgressCallback>(
        &mut self,
        base: &Genome,
        results: &SimulationResults,
        mut callback: C,
    ) -> Result<EvolutionOutcome, BoolfitError> {
        self.config.validate()?;
        let mut elites: Vec<Genome> = (0..self.config.selection)
            .map(|i| base.derive(format!("{}_run{}_E{}", base.name(), self.simulation, i)))
            .collect();
        let mut generations_run = 0;
        let mut converged = false;

        for generation in 0..self.config.generations {
            callback.on_generation_start(generation);

            let mut population = self.breed(base.name(), generation, &elites)?;
            self.evaluate_population(&mut population, &mut callback)?;

            let fitness_row: Vec<f64> = population.iter().map(|g| g.fitness().unwrap_or(0.0)).collect();
            let best_fitness = fitness_row.iter().copied().fold(0.0, f64::max);
            results.add_generation_fitness(self.simulation, generation, fitness_row);

            elites = select_elites(population, self.config.selection);
            let worst_elite = min_fitness(&elites);
            generations_run = generation + 1;

            if self.phase == Phase::Bootstrap && worst_elite > 0.0 {
                log::info!(
                    "Simulation {}: leaving bootstrap phase at generation {}",
                    self.simulation,
                    generation + 1
                );
                self.phase = Phase::SteadyState;
            }

            callback.on_generation_complete(generation, best_fitness, worst_elite, self.phase);

            if worst_elite > self.config.target_fitness {
                converged = true;
                break;
            }
        }

        let final_phase = self.phase;
        self.phase = Phase::Done;

        Ok(EvolutionOutcome {
            elites,
            generations_run,
            converged,
            final_phase,
        })
    }

    /// Crossover and mutation of one generation. Consumes the engine's RNG
    /// sequentially so a fixed seed reproduces the same children.
    fn breed(&mut self, base_name: &str, generation: usize, elites: &[Genome]) -> Result<Vec<Genome>, BoolfitError> {
        let plan = self.mutation_plan();
        let mut population = Vec::with_capacity(self.config.population);

        for i in 0..self.config.population {
            let parent_a = &elites[self.rng.gen_range(0..elites.len())];
            let parent_b = &elites[self.rng.gen_range(0..elites.len())];
            let name = format!("{}_run{}_G{}_M{}", base_name, self.simulation, generation, i);
            let mut child = crossover(parent_a, parent_b, self.config.crossovers, name, &mut self.rng)?;

            for (kind, count) in [
                (MutationKind::Balance, plan.balance),
                (MutationKind::Random, plan.random),
                (MutationKind::Shuffle, plan.shuffle),
                (MutationKind::Topology, plan.topology),
            ] {
                if count > 0 {
                    mutate(&mut child, kind, count, &mut self.rng);
                }
            }
            population.push(child);
        }

        Ok(population)
    }

    fn mutation_plan(&self) -> MutationPlan {
        let c = &self.config;
        let (mutations, shuffle, topology) = match self.phase {
            Phase::Bootstrap => (
                c.bootstrap_mutations_factor,
                c.bootstrap_shuffle_factor,
                c.bootstrap_topology_mutations_factor,
            ),
            Phase::SteadyState | Phase::Done => (c.mutations_factor, c.shuffle_factor, c.topology_mutations_factor),
        };
        MutationPlan {
            balance: c.balance_mutations * mutations,
            random: c.random_mutations * mutations,
            shuffle: c.shuffle_mutations * shuffle,
            topology: c.topology_mutations * topology,
        }
    }

    /// Fitness of every child in parallel. Recoverable failures leave that
    /// child at fitness 0; anything else aborts the run.
    fn evaluate_population<C: ProgressCallback>(
        &self,
        population: &mut [Genome],
        callback: &mut C,
    ) -> Result<(), BoolfitError> {
        let context = &self.context;
        let outcomes: Vec<Result<(), BoolfitError>> =
            population.par_iter_mut().map(|genome| context.evaluate(genome)).collect();

        let total = population.len();
        for (i, (genome, outcome)) in population.iter_mut().zip(outcomes).enumerate() {
            match outcome {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    log::warn!("Fitness of {} failed: {}", genome.name(), e);
                    genome.set_fitness(0.0);
                }
                Err(e) => return Err(e),
            }
            callback.on_model_evaluated(i + 1, total);
        }
        Ok(())
    }
}

fn min_fitness(genomes: &[Genome]) -> f64 {
    genomes
        .iter()
        .map(|g| g.fitness().unwrap_or(0.0))
        .fold(f64::INFINITY, f64::min)
}
