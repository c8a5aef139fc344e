use crate::engines::generation::genome::Genome;
use crate::error::{BoolfitError, Result};
use biodivine_lib_param_bn::biodivine_std::bitvector::BitVector;
use biodivine_lib_param_bn::biodivine_std::traits::Set;
use biodivine_lib_param_bn::symbolic_async_graph::SymbolicAsyncGraph;
use biodivine_lib_param_bn::BooleanNetwork;

/// Computes the attractors of a Boolean model.
///
/// Each attractor is a string with one character per node, in the order of the
/// genome's node map: `0`, `1`, or `-` for a coordinate left free by a trap space.
/// An empty list means no attractor was found. Implementations that may run for
/// long must enforce their own time limit and report it as an error.
pub trait AttractorOracle: Send + Sync {
    fn compute_attractors(&self, genome: &Genome) -> Result<Vec<String>>;
}

impl<F> AttractorOracle for F
where
    F: Fn(&Genome) -> Result<Vec<String>> + Send + Sync,
{
    fn compute_attractors(&self, genome: &Genome) -> Result<Vec<String>> {
        self(genome)
    }
}

/// Stable states (fixed points of the asynchronous dynamics) computed
/// symbolically with BDDs.
#[derive(Debug, Clone)]
pub struct BddStableStateOracle {
    max_attractors: usize,
}

impl Default for BddStableStateOracle {
    fn default() -> Self {
        Self {
            max_attractors: 1000,
        }
    }
}

impl BddStableStateOracle {
    pub fn new(max_attractors: usize) -> Self {
        Self { max_attractors }
    }
}

impl AttractorOracle for BddStableStateOracle {
    fn compute_attractors(&self, genome: &Genome) -> Result<Vec<String>> {
        let aeon = genome.to_aeon()?;
        let network = BooleanNetwork::try_from(aeon.as_str()).map_err(BoolfitError::Oracle)?;
        let graph = SymbolicAsyncGraph::new(&network).map_err(BoolfitError::Oracle)?;

        let unit = graph.mk_unit_colored_vertices();
        let stable = unit.minus(&graph.can_post(&unit));
        if stable.is_empty() {
            return Ok(Vec::new());
        }

        // Bit positions follow the network's variable ids, which the parser
        // assigns in its own order, so look every node up by variable name.
        let positions = genome
            .node_map()
            .entries()
            .iter()
            .map(|(node, variable)| {
                network
                    .as_graph()
                    .find_variable(variable)
                    .map(|id| id.to_index())
                    .ok_or_else(|| BoolfitError::Oracle(format!("Variable {} for {} missing", variable, node)))
            })
            .collect::<Result<Vec<usize>>>()?;

        let vertices = stable.vertices();
        let mut attractors = Vec::new();
        for state in vertices.materialize().iter() {
            if attractors.len() == self.max_attractors {
                log::warn!(
                    "{} has more than {} stable states, keeping the first {}",
                    genome.name(),
                    self.max_attractors,
                    self.max_attractors
                );
                break;
            }
            attractors.push(
                positions
                    .iter()
                    .map(|&p| if state.get(p) { '1' } else { '0' })
                    .collect::<String>(),
            );
        }
        log::debug!("{} has {} stable states", genome.name(), attractors.len());
        Ok(attractors)
    }
}
