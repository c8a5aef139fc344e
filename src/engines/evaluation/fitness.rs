use crate::data::model_outputs::ModelOutputs;
use crate::data::training_data::{Condition, NodeResponse, Observation, Response, TrainingData};
use crate::engines::evaluation::oracle::AttractorOracle;
use crate::engines::generation::genome::{Genome, NodeMap};
use crate::error::Result;
use std::sync::Arc;

/// Inputs shared by every fitness evaluation of a simulation.
pub struct FitnessContext {
    pub training_data: TrainingData,
    pub model_outputs: ModelOutputs,
    pub oracle: Arc<dyn AttractorOracle>,
}

impl FitnessContext {
    pub fn new(training_data: TrainingData, model_outputs: ModelOutputs, oracle: Arc<dyn AttractorOracle>) -> Self {
        Self {
            training_data,
            model_outputs,
            oracle,
        }
    }

    pub fn evaluate(&self, genome: &mut Genome) -> Result<()> {
        compute_fitness(genome, &self.training_data, &self.model_outputs, self.oracle.as_ref())
    }
}

/// Activity of one attractor coordinate; a free (`-`) coordinate counts as half active.
pub fn activity(state: char) -> f64 {
    match state {
        '1' => 1.0,
        '0' => 0.0,
        _ => 0.5,
    }
}

/// Score `genome` against every observation and store the weighted average as
/// its fitness.
///
/// A missing perturbed node is fatal. Oracle failures only zero the affected
/// observation.
pub fn compute_fitness(
    genome: &mut Genome,
    data: &TrainingData,
    outputs: &ModelOutputs,
    oracle: &dyn AttractorOracle,
) -> Result<()> {
    let weight_sum = data.weight_sum();
    let mut fitness = 0.0;

    for (index, observation) in data.observations().iter().enumerate() {
        let mut scratch = genome.derive(format!("{}_condition_{}", genome.name(), index));
        for condition in &observation.conditions {
            if let Condition::Fixed { node, value } = condition {
                scratch.fix_node(node, *value)?;
            }
        }
        scratch.compute_attractors(oracle);

        let observation_fitness = observation_fitness(&scratch, observation, outputs);
        log::trace!(
            "{} observation {}: {} attractors, fitness {:.4}",
            genome.name(),
            index,
            scratch.attractors().len(),
            observation_fitness
        );
        if weight_sum > 0.0 {
            fitness += observation_fitness * observation.weight / weight_sum;
        }
    }

    genome.set_fitness(fitness);
    Ok(())
}

/// Fitness of one observation for a model whose attractors were computed under
/// that observation's conditions.
pub fn observation_fitness(model: &Genome, observation: &Observation, outputs: &ModelOutputs) -> f64 {
    let attractors = model.attractors();
    if attractors.is_empty() {
        return 0.0;
    }
    match &observation.response {
        Response::GlobalOutput(expected) => {
            let predicted = global_output(attractors, model.node_map(), outputs);
            1.0 - (predicted - expected).abs()
        }
        Response::Nodes(responses) => node_response_fitness(attractors, model.node_map(), responses),
    }
}

/// Weighted output activity averaged over attractors, rescaled to `[0, 1]` between
/// the sum of negative and the sum of positive weights.
pub fn global_output(attractors: &[String], node_map: &NodeMap, outputs: &ModelOutputs) -> f64 {
    if attractors.is_empty() {
        return 0.0;
    }
    let mut raw = 0.0;
    for attractor in attractors {
        let states: Vec<char> = attractor.chars().collect();
        for output in outputs.outputs() {
            if let Some(state) = node_map.index_of(&output.node).and_then(|i| states.get(i)) {
                raw += activity(*state) * output.weight as f64;
            }
        }
    }
    raw /= attractors.len() as f64;

    let range = outputs.max_output() - outputs.min_output();
    if range == 0.0 {
        return 0.0;
    }
    (raw - outputs.min_output()) / range
}

/// One point for having an attractor, plus the per-node match summed over the
/// response and averaged over attractors, normalised by the number of scored
/// nodes plus one and then divided by the number of attractors.
fn node_response_fitness(attractors: &[String], node_map: &NodeMap, responses: &[NodeResponse]) -> f64 {
    let scored: Vec<(usize, f64)> = responses
        .iter()
        .filter_map(|r| node_map.index_of(&r.node).map(|i| (i, r.value)))
        .collect();

    let matches: Vec<f64> = attractors
        .iter()
        .map(|attractor| {
            let states: Vec<char> = attractor.chars().collect();
            scored
                .iter()
                .map(|&(index, expected)| {
                    let observed = states.get(index).copied().map_or(0.0, activity);
                    1.0 - (observed - expected).abs()
                })
                .sum::<f64>()
        })
        .collect();
    let average_match = matches.iter().sum::<f64>() / matches.len() as f64;

    let mut fitness = 1.0 + average_match;
    fitness /= (scored.len() + 1) as f64;
    fitness / matches.len() as f64
}
