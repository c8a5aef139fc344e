pub mod fitness;
pub mod oracle;

pub use fitness::{compute_fitness, global_output, FitnessContext};
pub use oracle::{AttractorOracle, BddStableStateOracle};
