use super::traits::{check_unit_interval, ConfigSection};
use crate::error::BoolfitError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings shared by all simulations of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Independent evolution runs.
    pub simulations: usize,
    /// Run `i` is seeded with `seed + i`.
    pub seed: u64,
    /// Worker threads, 0 for one per core.
    pub threads: usize,
    /// Only final elites above this fitness are saved.
    pub fitness_threshold: f64,
    /// Maximum saved models per simulation.
    pub models_saved: usize,
    pub output_directory: PathBuf,
    pub model_name: String,
    /// Cap on stable states enumerated per oracle call.
    pub max_attractors: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            simulations: 10,
            seed: 1,
            threads: 0,
            fitness_threshold: 0.0,
            models_saved: 3,
            output_directory: PathBuf::from("results"),
            model_name: "model".to_string(),
            max_attractors: 1000,
        }
    }
}

impl ConfigSection for GeneralConfig {
    fn section_name() -> &'static str {
        "general"
    }

    fn validate(&self) -> Result<(), BoolfitError> {
        if self.simulations == 0 {
            return Err(BoolfitError::Configuration(
                "At least one simulation is required".to_string(),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(BoolfitError::Configuration(
                "Model name must not be empty".to_string(),
            ));
        }
        check_unit_interval(Self::section_name(), "fitness_threshold", self.fitness_threshold)?;
        Ok(())
    }
}
