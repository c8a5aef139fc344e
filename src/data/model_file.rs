use crate::engines::generation::equation::Equation;
use crate::engines::generation::genome::{Genome, NodeMap};
use crate::error::{BoolfitError, Result};
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

/// Serialize a genome: name, optional fitness, attractors, equations and the
/// node to variable mapping. Each `equation:` line is followed by a `structure:`
/// line that also keeps blacklisted regulators and the link.
pub fn to_model_file(genome: &Genome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "modelname: {}", genome.name());
    if let Some(fitness) = genome.fitness() {
        let _ = writeln!(out, "fitness: {}", fitness);
    }
    for attractor in genome.attractors() {
        let _ = writeln!(out, "attractor: {}", attractor);
    }
    for equation in genome.equations() {
        let _ = writeln!(out, "equation: {}", equation);
        let _ = writeln!(out, "structure: {}", equation.to_structure());
    }
    for (node, variable) in genome.node_map().entries() {
        let _ = writeln!(out, "mapping: {} = {}", node, variable);
    }
    out
}

pub fn write_model_file<P: AsRef<Path>>(genome: &Genome, path: P) -> Result<()> {
    std::fs::write(path, to_model_file(genome))?;
    Ok(())
}

pub fn read_model_file<P: AsRef<Path>>(path: P) -> Result<Genome> {
    let contents = std::fs::read_to_string(&path).map_err(|e| {
        BoolfitError::DataLoading(format!(
            "Failed to read model {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    parse_model_file(&contents)
}

pub fn parse_model_file(text: &str) -> Result<Genome> {
    let mut name = None;
    let mut fitness = None;
    let mut attractors = Vec::new();
    let mut equations = Vec::new();
    let mut structures = Vec::new();
    let mut mapping = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            BoolfitError::DataLoading(format!("Line {}: expected `key: value`", line_no + 1))
        })?;
        let value = value.trim();
        match key.trim() {
            "modelname" => name = Some(value.to_string()),
            "fitness" => {
                fitness = Some(value.parse::<f64>().map_err(|_| {
                    BoolfitError::DataLoading(format!("Line {}: invalid fitness `{}`", line_no + 1, value))
                })?)
            }
            "attractor" | "stablestate" => attractors.push(value.to_string()),
            "equation" => equations.push(Equation::parse(value)?),
            "structure" => structures.push(Equation::parse_structure(value)?),
            "mapping" => {
                let (node, variable) = value.split_once('=').ok_or_else(|| {
                    BoolfitError::DataLoading(format!(
                        "Line {}: expected `mapping: node = variable`",
                        line_no + 1
                    ))
                })?;
                mapping.push((node.trim().to_string(), variable.trim().to_string()));
            }
            other => {
                return Err(BoolfitError::DataLoading(format!(
                    "Line {}: unknown key `{}`",
                    line_no + 1,
                    other
                )))
            }
        }
    }

    let name = name.ok_or_else(|| BoolfitError::DataLoading("Model file has no modelname".to_string()))?;
    let equations = if structures.is_empty() {
        equations
    } else {
        merge_structures(equations, structures)?
    };
    let mut genome = Genome::new(name, equations, Arc::new(NodeMap::new(mapping)?))?;
    genome.set_attractors(attractors);
    if let Some(fitness) = fitness {
        genome.set_fitness(fitness);
    }
    Ok(genome)
}

/// Prefer the lossless `structure:` lines, checking each renders to its `equation:` line.
fn merge_structures(equations: Vec<Equation>, structures: Vec<Equation>) -> Result<Vec<Equation>> {
    if equations.len() != structures.len() {
        return Err(BoolfitError::DataLoading(format!(
            "{} equations but {} structure lines",
            equations.len(),
            structures.len()
        )));
    }
    for (equation, structure) in equations.iter().zip(&structures) {
        if equation.to_string() != structure.to_string() {
            return Err(BoolfitError::DataLoading(format!(
                "Structure `{}` does not match equation `{}`",
                structure.to_structure(),
                equation
            )));
        }
    }
    Ok(structures)
}
