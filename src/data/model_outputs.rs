use crate::error::{BoolfitError, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct OutputWeight {
    pub node: String,
    pub weight: i32,
}

/// Weighted output nodes used to compute a model's global output.
#[derive(Debug, Clone, Default)]
pub struct ModelOutputs {
    outputs: Vec<OutputWeight>,
    min_output: f64,
    max_output: f64,
}

impl ModelOutputs {
    pub fn new(outputs: Vec<OutputWeight>) -> Self {
        let min_output = outputs.iter().map(|o| o.weight.min(0) as f64).sum();
        let max_output = outputs.iter().map(|o| o.weight.max(0) as f64).sum();
        Self {
            outputs,
            min_output,
            max_output,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BoolfitError::DataLoading(format!(
                "Failed to read model outputs {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::parse(&contents)
    }

    /// One `node<whitespace>weight` pair per line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut outputs = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let output = match fields.as_slice() {
                [node, weight] => OutputWeight {
                    node: node.to_string(),
                    weight: weight.parse().map_err(|_| {
                        BoolfitError::DataLoading(format!(
                            "Line {}: weight `{}` is not an integer",
                            line_no + 1,
                            weight
                        ))
                    })?,
                },
                _ => {
                    return Err(BoolfitError::DataLoading(format!(
                        "Line {}: expected `node weight`, found `{}`",
                        line_no + 1,
                        line
                    )))
                }
            };
            outputs.push(output);
        }
        Ok(Self::new(outputs))
    }

    pub fn outputs(&self) -> &[OutputWeight] {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Sum of the negative weights.
    pub fn min_output(&self) -> f64 {
        self.min_output
    }

    /// Sum of the positive weights.
    pub fn max_output(&self) -> f64 {
        self.max_output
    }
}
