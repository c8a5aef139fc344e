use super::results::{RunSummary, SimulationResults};
use crate::config::AppConfig;
use crate::engines::evaluation::FitnessContext;
use crate::engines::generation::{EvolutionEngine, Genome, LogProgressCallback};
use crate::error::{BoolfitError, Result};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;

/// Runs independent evolution simulations in parallel against one fitness context.
pub struct SimulationRunner {
    config: AppConfig,
    context: Arc<FitnessContext>,
}

impl SimulationRunner {
    pub fn new(config: AppConfig, context: Arc<FitnessContext>) -> Self {
        Self { config, context }
    }

    /// Evolve `base` once per configured simulation. Run `i` is seeded with
    /// `seed + i` so the outcome only depends on the seed.
    pub fn run(&self, base: &Genome) -> Result<SimulationResults> {
        self.config.validate()?;
        self.context.training_data.validate_against(base)?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.config.general.threads)
            .build()
            .map_err(|e| BoolfitError::Configuration(format!("Failed to build thread pool: {}", e)))?;

        let results = SimulationResults::new();
        log::info!(
            "Starting {} simulations of {} ({} equations, {} observations)",
            self.config.general.simulations,
            base.name(),
            base.len(),
            self.context.training_data.len()
        );

        pool.install(|| {
            (0..self.config.general.simulations)
                .into_par_iter()
                .try_for_each(|simulation| self.run_simulation(simulation, base, &results))
        })?;

        Ok(results)
    }

    fn run_simulation(&self, simulation: usize, base: &Genome, results: &SimulationResults) -> Result<()> {
        let general = &self.config.general;
        let seed = general.seed.wrapping_add(simulation as u64);

        let mut engine = EvolutionEngine::new(self.config.evolution.clone(), Arc::clone(&self.context), seed)
            .with_simulation(simulation);
        let outcome = engine.run(base, results, LogProgressCallback::new(simulation))?;

        let best_fitness = outcome.elites.first().and_then(|g| g.fitness()).unwrap_or(0.0);
        results.add_run(RunSummary {
            simulation,
            seed,
            generations_run: outcome.generations_run,
            converged: outcome.converged,
            final_phase: outcome.final_phase,
            best_fitness,
        });

        let saved = outcome
            .elites
            .into_iter()
            .filter(|g| g.fitness().unwrap_or(0.0) > general.fitness_threshold)
            .take(general.models_saved);
        let mut count = 0;
        for (rank, mut genome) in saved.enumerate() {
            genome.set_name(format!("{}_run{}_{}", general.model_name, simulation, rank));
            genome.compute_attractors(self.context.oracle.as_ref());
            results.add_model(simulation, genome);
            count += 1;
        }

        log::info!(
            "Simulation {} finished after {} generations (best fitness {:.4}, {} models saved)",
            simulation,
            outcome.generations_run,
            best_fitness,
            count
        );
        Ok(())
    }
}
