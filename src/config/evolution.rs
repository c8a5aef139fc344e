use super::traits::{check_unit_interval, ConfigSection};
use crate::error::BoolfitError;
use serde::{Deserialize, Serialize};

/// Parameters of one genetic-algorithm run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Children bred per generation.
    pub population: usize,
    pub generations: usize,
    /// Size of the elite pool kept between generations.
    pub selection: usize,
    pub crossovers: usize,

    pub balance_mutations: usize,
    pub random_mutations: usize,
    pub shuffle_mutations: usize,
    pub topology_mutations: usize,

    // Multipliers applied before any elite reached a non-zero fitness...
    pub bootstrap_mutations_factor: usize,
    pub bootstrap_shuffle_factor: usize,
    pub bootstrap_topology_mutations_factor: usize,
    // ...and afterwards.
    pub mutations_factor: usize,
    pub shuffle_factor: usize,
    pub topology_mutations_factor: usize,

    /// Stop once the worst elite exceeds this fitness.
    pub target_fitness: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 20,
            generations: 20,
            selection: 3,
            crossovers: 1,
            balance_mutations: 3,
            random_mutations: 10,
            shuffle_mutations: 0,
            topology_mutations: 10,
            bootstrap_mutations_factor: 1000,
            bootstrap_shuffle_factor: 0,
            bootstrap_topology_mutations_factor: 5,
            mutations_factor: 1,
            shuffle_factor: 0,
            topology_mutations_factor: 1,
            target_fitness: 1.0,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), BoolfitError> {
        if self.population == 0 {
            return Err(BoolfitError::Configuration(
                "Population must be at least 1".to_string(),
            ));
        }
        if self.selection == 0 {
            return Err(BoolfitError::Configuration(
                "Selection must keep at least 1 model".to_string(),
            ));
        }
        if self.selection > self.population {
            return Err(BoolfitError::Configuration(format!(
                "Selection ({}) cannot exceed population ({})",
                self.selection, self.population
            )));
        }
        check_unit_interval(Self::section_name(), "target_fitness", self.target_fitness)?;
        Ok(())
    }
}
