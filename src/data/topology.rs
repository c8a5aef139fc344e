use crate::engines::generation::equation::is_node_name;
use crate::error::{BoolfitError, Result};
use crate::types::Sign;
use std::path::Path;

/// A signed regulator -> target edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interaction {
    pub source: String,
    pub target: String,
    pub sign: Sign,
}

/// Network topology read from a SIF-style interaction list.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    interactions: Vec<Interaction>,
    nodes: Vec<String>,
}

impl Topology {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BoolfitError::DataLoading(format!(
                "Failed to read network {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::parse(&contents)
    }

    /// Accepts `A -> B`, `A -| B`, `A activates B` and `A inhibits B`, separated by
    /// tabs or spaces.
    pub fn parse(text: &str) -> Result<Self> {
        let mut topology = Topology::default();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let interaction = match fields.as_slice() {
                [source, arrow, target] => {
                    let sign = match *arrow {
                        "->" | "activates" => Sign::Activation,
                        "-|" | "inhibits" => Sign::Inhibition,
                        other => {
                            return Err(BoolfitError::DataLoading(format!(
                                "Line {}: unknown interaction `{}`",
                                line_no + 1,
                                other
                            )))
                        }
                    };
                    for name in [source, target] {
                        if !is_node_name(name) {
                            return Err(BoolfitError::DataLoading(format!(
                                "Line {}: `{}` is not a valid node name",
                                line_no + 1,
                                name
                            )));
                        }
                    }
                    Interaction {
                        source: source.to_string(),
                        target: target.to_string(),
                        sign,
                    }
                }
                _ => {
                    return Err(BoolfitError::DataLoading(format!(
                        "Line {}: expected `source <interaction> target`, found `{}`",
                        line_no + 1,
                        line
                    )))
                }
            };
            topology.add(interaction);
        }

        Ok(topology)
    }

    pub fn add(&mut self, interaction: Interaction) {
        if self.interactions.contains(&interaction) {
            log::warn!(
                "Ignoring duplicate interaction {} -> {}",
                interaction.source,
                interaction.target
            );
            return;
        }
        for node in [&interaction.source, &interaction.target] {
            if !self.nodes.contains(node) {
                self.nodes.push(node.clone());
            }
        }
        self.interactions.push(interaction);
    }

    /// Nodes in order of first appearance.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn regulators_of(&self, target: &str, sign: Sign) -> Vec<String> {
        self.interactions
            .iter()
            .filter(|i| i.target == target && i.sign == sign)
            .map(|i| i.source.clone())
            .collect()
    }
}
