use crate::engines::generation::genome::Genome;
use crate::error::{BoolfitError, Result};
use rand::seq::index::sample;
use rand::Rng;
use std::sync::Arc;

/// Kinds of structural mutation applied to a whole model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Flip the link between activators and inhibitors.
    Balance,
    /// Flip an operator inside a regulator clause.
    Random,
    /// Swap two adjacent regulators.
    Shuffle,
    /// Blacklist or restore a regulator.
    Topology,
}

/// Multi-point crossover producing one child.
///
/// With `crossovers >= N - 1` equations alternate strictly between the parents;
/// otherwise `crossovers` distinct points in `[0, N]` split the equations into
/// segments taken alternately from `parent_a` and `parent_b`.
pub fn crossover<R: Rng + ?Sized>(
    parent_a: &Genome,
    parent_b: &Genome,
    crossovers: usize,
    name: impl Into<String>,
    rng: &mut R,
) -> Result<Genome> {
    let n = parent_a.len();
    if parent_b.len() != n {
        return Err(BoolfitError::Configuration(format!(
            "Cannot cross {} ({} equations) with {} ({} equations)",
            parent_a.name(),
            n,
            parent_b.name(),
            parent_b.len()
        )));
    }

    let from_a: Vec<bool> = if crossovers + 1 >= n {
        (0..n).map(|i| i % 2 == 0).collect()
    } else {
        let mut points = sample(rng, n + 1, crossovers).into_vec();
        points.sort_unstable();
        let mut segment = 0;
        (0..n)
            .map(|i| {
                while segment < points.len() && points[segment] <= i {
                    segment += 1;
                }
                segment % 2 == 0
            })
            .collect()
    };

    let equations = from_a
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            if a {
                parent_a.equations()[i].clone()
            } else {
                parent_b.equations()[i].clone()
            }
        })
        .collect();

    Ok(Genome::from_equations(name, equations, Arc::clone(parent_a.node_map())))
}

/// Apply `count` mutations of one kind, each to a uniformly chosen equation.
pub fn mutate<R: Rng + ?Sized>(genome: &mut Genome, kind: MutationKind, count: usize, rng: &mut R) {
    if genome.is_empty() {
        return;
    }
    for _ in 0..count {
        let index = rng.gen_range(0..genome.len());
        let equation = &mut genome.equations_mut()[index];
        match kind {
            MutationKind::Balance => equation.toggle_link(),
            MutationKind::Random => equation.toggle_operator(rng),
            MutationKind::Shuffle => equation.shuffle_priority(rng),
            MutationKind::Topology => {
                let before = equation.clone();
                equation.toggle_regulator(rng);
                if equation.whitelisted_count() == 0 {
                    // Every equation keeps at least one active regulator.
                    *equation = before;
                    log::trace!("Reverted topology mutation emptying {}", equation.target());
                } else if *equation == before {
                    log::trace!("Topology mutation left {} unchanged", equation.target());
                } else {
                    log::trace!("Topology mutation: {} -> {}", before, equation);
                }
            }
        }
    }
}

/// Elitist top-`k` selection without replacement; ties go to the lower index.
pub fn select_elites(population: Vec<Genome>, k: usize) -> Vec<Genome> {
    let mut remaining: Vec<Option<Genome>> = population.into_iter().map(Some).collect();
    let mut elites = Vec::with_capacity(k);

    for _ in 0..k {
        let mut best: Option<(usize, f64)> = None;
        for (i, genome) in remaining.iter().enumerate() {
            if let Some(genome) = genome {
                let fitness = genome.fitness().unwrap_or(0.0);
                if best.map_or(true, |(_, f)| fitness > f) {
                    best = Some((i, fitness));
                }
            }
        }
        match best.and_then(|(i, _)| remaining[i].take()) {
            Some(genome) => elites.push(genome),
            None => break,
        }
    }

    elites
}
