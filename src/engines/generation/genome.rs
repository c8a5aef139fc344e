use crate::data::topology::Topology;
use crate::engines::evaluation::oracle::AttractorOracle;
use crate::engines::generation::equation::Equation;
use crate::error::{BoolfitError, Result};
use crate::types::Sign;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

/// Ordered node name to oracle variable name mapping.
///
/// Shared between every genome derived from a common ancestor; its order is the
/// order of the equations and of the characters of every attractor string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl NodeMap {
    pub fn new(entries: Vec<(String, String)>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, (node, _)) in entries.iter().enumerate() {
            if index.insert(node.clone(), i).is_some() {
                return Err(BoolfitError::DataLoading(format!(
                    "Node {} mapped more than once",
                    node
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Map nodes to `x1..xN` in the given order.
    pub fn sequential<'a>(nodes: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        Self::new(
            nodes
                .into_iter()
                .enumerate()
                .map(|(i, node)| (node.to_string(), format!("x{}", i + 1)))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn variable_of(&self, node: &str) -> Option<&str> {
        self.index_of(node).map(|i| self.entries[i].1.as_str())
    }
}

/// A complete Boolean model: one equation per network node.
///
/// Genomes descending from the same ancestor keep their equations in the same
/// order, which is what lets crossover recombine them positionally.
#[derive(Debug, Clone)]
pub struct Genome {
    name: String,
    equations: Vec<Equation>,
    node_map: Arc<NodeMap>,
    attractors: Vec<String>,
    fitness: Option<f64>,
}

impl Genome {
    pub fn new(name: impl Into<String>, equations: Vec<Equation>, node_map: Arc<NodeMap>) -> Result<Self> {
        if equations.len() != node_map.len() {
            return Err(BoolfitError::DataLoading(format!(
                "{} equations but {} mapped nodes",
                equations.len(),
                node_map.len()
            )));
        }
        for (equation, (node, _)) in equations.iter().zip(node_map.entries()) {
            if equation.target() != node {
                return Err(BoolfitError::DataLoading(format!(
                    "Equation for {} does not match mapped node {}",
                    equation.target(),
                    node
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            equations,
            node_map,
            attractors: Vec::new(),
            fitness: None,
        })
    }

    /// Translate a topology into the default model: for every node,
    /// `(activators joined by or) and not (inhibitors joined by or)`.
    pub fn from_topology(name: impl Into<String>, topology: &Topology) -> Result<Self> {
        let node_map = NodeMap::sequential(topology.nodes().iter().map(String::as_str))?;
        let equations = topology
            .nodes()
            .iter()
            .map(|node| {
                let activators = topology.regulators_of(node, Sign::Activation);
                let inhibitors = topology.regulators_of(node, Sign::Inhibition);
                if activators.is_empty() && inhibitors.is_empty() {
                    Equation::self_loop(node.clone())
                } else {
                    Equation::new(node.clone(), &activators, &inhibitors)
                }
            })
            .collect();
        Self::new(name, equations, Arc::new(node_map))
    }

    /// Structurally identical copy under a new name, without attractors or fitness.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self::from_equations(name, self.equations.clone(), Arc::clone(&self.node_map))
    }

    /// Used by crossover, which already guarantees alignment with `node_map`.
    pub(crate) fn from_equations(name: impl Into<String>, equations: Vec<Equation>, node_map: Arc<NodeMap>) -> Self {
        Self {
            name: name.into(),
            equations,
            node_map,
            attractors: Vec::new(),
            fitness: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub(crate) fn equations_mut(&mut self) -> &mut [Equation] {
        &mut self.equations
    }

    pub fn node_map(&self) -> &Arc<NodeMap> {
        &self.node_map
    }

    pub fn len(&self) -> usize {
        self.equations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equations.is_empty()
    }

    pub fn attractors(&self) -> &[String] {
        &self.attractors
    }

    pub fn set_attractors(&mut self, attractors: Vec<String>) {
        self.attractors = attractors;
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn has_node(&self, node: &str) -> bool {
        self.node_map.index_of(node).is_some()
    }

    /// Fix a node to a constant value, replacing its equation.
    pub fn fix_node(&mut self, node: &str, value: bool) -> Result<()> {
        let index = self
            .node_map
            .index_of(node)
            .ok_or_else(|| BoolfitError::MissingTarget(node.to_string()))?;
        self.equations[index] = Equation::constant(node, value);
        Ok(())
    }

    /// Run the oracle and store the attractors. A failing oracle leaves the
    /// genome without attractors.
    pub fn compute_attractors(&mut self, oracle: &dyn AttractorOracle) {
        self.attractors = match oracle.compute_attractors(self) {
            Ok(attractors) => attractors,
            Err(e) => {
                log::warn!("Attractor computation failed for {}: {}", self.name, e);
                Vec::new()
            }
        };
    }

    /// The model in AEON format over its internal variable names.
    pub fn to_aeon(&self) -> Result<String> {
        let resolve = |node: &str| self.node_map.variable_of(node).map(str::to_string);
        let mut out = String::new();
        let _ = writeln!(out, "#name:{}", self.name);

        for (equation, (_, variable)) in self.equations.iter().zip(self.node_map.entries()) {
            let mut declared: Vec<&str> = Vec::new();
            for regulator in equation.active_regulators() {
                if declared.contains(&regulator) {
                    continue;
                }
                declared.push(regulator);
                let source = resolve(regulator)
                    .ok_or_else(|| BoolfitError::MissingTarget(regulator.to_string()))?;
                // Unsigned and non-essential so masked or duplicated regulators never
                // trip the monotonicity and observability checks.
                let _ = writeln!(out, "{} -?? {}", source, variable);
            }
        }
        for (equation, (_, variable)) in self.equations.iter().zip(self.node_map.entries()) {
            let _ = writeln!(out, "${}: {}", variable, equation.to_aeon_body(resolve)?);
        }
        Ok(out)
    }
}
