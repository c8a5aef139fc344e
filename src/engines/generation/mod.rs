pub mod equation;
pub mod genome;
pub mod operators;
pub mod evolution_engine;
pub mod progress;

pub use equation::{Equation, Regulator, RegulatorClause};
pub use genome::{Genome, NodeMap};
pub use operators::{crossover, mutate, select_elites, MutationKind};
pub use evolution_engine::{EvolutionEngine, EvolutionOutcome, Phase, ProgressCallback};
pub use progress::{LogProgressCallback, SilentProgressCallback};
