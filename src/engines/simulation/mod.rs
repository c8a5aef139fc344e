pub mod results;
pub mod runner;

pub use results::{GenerationFitness, RunSummary, SavedModel, SimulationResults};
pub use runner::SimulationRunner;
