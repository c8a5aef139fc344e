use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean connective used inside a regulator clause and as the link between clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicOperator {
    And,
    Or,
}

impl LogicOperator {
    pub fn flipped(self) -> Self {
        match self {
            LogicOperator::And => LogicOperator::Or,
            LogicOperator::Or => LogicOperator::And,
        }
    }

    pub fn flip(&mut self) {
        *self = self.flipped();
    }

    /// Keyword form used by the equation grammar.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "and",
            LogicOperator::Or => "or",
        }
    }

    /// Symbol form used by the AEON update-function grammar.
    pub fn as_symbol(&self) -> &'static str {
        match self {
            LogicOperator::And => "&",
            LogicOperator::Or => "|",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "and" => Some(LogicOperator::And),
            "or" => Some(LogicOperator::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an equation a regulator sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Activating,
    Inhibiting,
}

/// Sign of a regulatory interaction in the network topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Activation,
    Inhibition,
}
