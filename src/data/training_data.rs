use crate::engines::generation::genome::Genome;
use crate::error::{BoolfitError, Result};
use std::path::Path;

/// Response key carrying a single weighted global output instead of node values.
pub const GLOBAL_OUTPUT: &str = "globaloutput";

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `-`: the model is simulated as is.
    Unperturbed,
    /// `node:0|1`: the node's equation is replaced by a constant.
    Fixed { node: String, value: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeResponse {
    pub node: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Nodes(Vec<NodeResponse>),
    GlobalOutput(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub conditions: Vec<Condition>,
    pub response: Response,
    pub weight: f64,
}

/// Weighted condition/response observations a model is fitted against.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    observations: Vec<Observation>,
}

impl TrainingData {
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        for observation in &observations {
            if !(observation.weight >= 0.0) {
                return Err(BoolfitError::DataLoading(format!(
                    "Observation weight must be non-negative, found {}",
                    observation.weight
                )));
            }
        }
        Ok(Self { observations })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            BoolfitError::DataLoading(format!(
                "Failed to read training data {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::parse(&contents)
    }

    /// Parse blocks of
    ///
    /// ```text
    /// Condition
    /// -
    /// Response
    /// A:1	B:0
    /// Weight:1
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

        let mut observations = Vec::new();
        while let Some((line_no, header)) = lines.next() {
            expect_header(line_no, header, "condition")?;
            let (line_no, conditions) = next_line(&mut lines, line_no, "conditions")?;
            let conditions = parse_conditions(line_no, conditions)?;

            let (line_no, header) = next_line(&mut lines, line_no, "Response")?;
            expect_header(line_no, header, "response")?;
            let (line_no, responses) = next_line(&mut lines, line_no, "responses")?;
            let response = parse_response(line_no, responses)?;

            let (line_no, weight) = next_line(&mut lines, line_no, "Weight")?;
            let weight = parse_weight(line_no, weight)?;

            observations.push(Observation {
                conditions,
                response,
                weight,
            });
        }

        Self::new(observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn weight_sum(&self) -> f64 {
        self.observations.iter().map(|o| o.weight).sum()
    }

    pub fn has_global_output(&self) -> bool {
        self.observations
            .iter()
            .any(|o| matches!(o.response, Response::GlobalOutput(_)))
    }

    /// Check that every condition can be applied to `genome`.
    ///
    /// A perturbed node missing from the model means data and topology disagree,
    /// which is fatal. Response nodes missing from the model are only reported,
    /// since fitness scoring skips them.
    pub fn validate_against(&self, genome: &Genome) -> Result<()> {
        if self.weight_sum() <= 0.0 {
            return Err(BoolfitError::DataLoading(
                "Training data weights sum to zero".to_string(),
            ));
        }
        for observation in &self.observations {
            for condition in &observation.conditions {
                if let Condition::Fixed { node, .. } = condition {
                    if !genome.has_node(node) {
                        return Err(BoolfitError::MissingTarget(node.clone()));
                    }
                }
            }
            if let Response::Nodes(responses) = &observation.response {
                for response in responses.iter().filter(|r| !genome.has_node(&r.node)) {
                    log::warn!("Response node {} is not part of the model and will be ignored", response.node);
                }
            }
        }
        Ok(())
    }
}

fn next_line<'a, I>(lines: &mut I, previous: usize, what: &str) -> Result<(usize, &'a str)>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    lines.next().ok_or_else(|| {
        BoolfitError::DataLoading(format!(
            "Unexpected end of training data after line {}: expected {}",
            previous, what
        ))
    })
}

fn expect_header(line_no: usize, line: &str, header: &str) -> Result<()> {
    if line.eq_ignore_ascii_case(header) {
        Ok(())
    } else {
        Err(BoolfitError::DataLoading(format!(
            "Line {}: expected `{}`, found `{}`",
            line_no, header, line
        )))
    }
}

fn split_entry(line_no: usize, entry: &str) -> Result<(String, f64)> {
    let (name, value) = entry.split_once(':').ok_or_else(|| {
        BoolfitError::DataLoading(format!(
            "Line {}: expected `node:value`, found `{}`",
            line_no, entry
        ))
    })?;
    let value: f64 = value.trim().parse().map_err(|_| {
        BoolfitError::DataLoading(format!(
            "Line {}: invalid value in `{}`",
            line_no, entry
        ))
    })?;
    Ok((name.trim().to_string(), value))
}

fn parse_conditions(line_no: usize, line: &str) -> Result<Vec<Condition>> {
    line.split_whitespace()
        .map(|entry| {
            if entry == "-" {
                return Ok(Condition::Unperturbed);
            }
            let (node, value) = split_entry(line_no, entry)?;
            let value = if value == 0.0 {
                false
            } else if value == 1.0 {
                true
            } else {
                return Err(BoolfitError::DataLoading(format!(
                    "Line {}: condition `{}` must fix the node to 0 or 1",
                    line_no, entry
                )));
            };
            Ok(Condition::Fixed { node, value })
        })
        .collect()
}

fn parse_response(line_no: usize, line: &str) -> Result<Response> {
    let entries = line
        .split_whitespace()
        .map(|entry| split_entry(line_no, entry))
        .collect::<Result<Vec<_>>>()?;

    if let Some((_, value)) = entries
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(GLOBAL_OUTPUT))
    {
        if entries.len() != 1 {
            return Err(BoolfitError::DataLoading(format!(
                "Line {}: `{}` must be the only response entry",
                line_no, GLOBAL_OUTPUT
            )));
        }
        if !(-1.0..=1.0).contains(value) {
            return Err(BoolfitError::DataLoading(format!(
                "Line {}: global output {} outside [-1, 1]",
                line_no, value
            )));
        }
        return Ok(Response::GlobalOutput(*value));
    }

    let responses = entries
        .into_iter()
        .map(|(node, value)| {
            if (0.0..=1.0).contains(&value) {
                Ok(NodeResponse { node, value })
            } else {
                Err(BoolfitError::DataLoading(format!(
                    "Line {}: response value {} for {} outside [0, 1]",
                    line_no, value, node
                )))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Response::Nodes(responses))
}

fn parse_weight(line_no: usize, line: &str) -> Result<f64> {
    let (key, value) = split_entry(line_no, line)?;
    if !key.eq_ignore_ascii_case("weight") {
        return Err(BoolfitError::DataLoading(format!(
            "Line {}: expected `Weight:<value>`, found `{}`",
            line_no, line
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# two observations\n\
        Condition\n\
        -\n\
        Response\n\
        A:1\tB:0.5\n\
        Weight:1\n\
        \n\
        Condition\n\
        A:0\tC:1\n\
        Response\n\
        globaloutput:-0.5\n\
        Weight:0.5\n";

    #[test]
    fn test_parse_sample() {
        let data = TrainingData::parse(SAMPLE).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.weight_sum(), 1.5);
        assert!(data.has_global_output());

        let first = &data.observations()[0];
        assert_eq!(first.conditions, vec![Condition::Unperturbed]);
        assert_eq!(
            first.response,
            Response::Nodes(vec![
                NodeResponse { node: "A".into(), value: 1.0 },
                NodeResponse { node: "B".into(), value: 0.5 },
            ])
        );

        let second = &data.observations()[1];
        assert_eq!(
            second.conditions,
            vec![
                Condition::Fixed { node: "A".into(), value: false },
                Condition::Fixed { node: "C".into(), value: true },
            ]
        );
        assert_eq!(second.response, Response::GlobalOutput(-0.5));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(TrainingData::parse("Condition\nA:2\nResponse\nB:1\nWeight:1\n").is_err());
        assert!(TrainingData::parse("Condition\n-\nResponse\nB:1.5\nWeight:1\n").is_err());
        assert!(TrainingData::parse("Condition\n-\nResponse\nglobaloutput:1\tB:1\nWeight:1\n").is_err());
        assert!(TrainingData::parse("Condition\n-\nResponse\nB:1\nWeight:-1\n").is_err());
        assert!(TrainingData::parse("Condition\nDrug(A+B)\nResponse\nB:1\nWeight:1\n").is_err());
        assert!(TrainingData::parse("Condition\n-\nResponse\nB:1\n").is_err());
    }
}
