use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoolfitError {
    #[error("Invalid equation `{equation}`: {reason}")]
    EquationSyntax { equation: String, reason: String },

    #[error("Node {0} not found in model")]
    MissingTarget(String),

    #[error("Attractor oracle error: {0}")]
    Oracle(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl BoolfitError {
    pub fn equation_syntax(equation: &str, reason: impl Into<String>) -> Self {
        BoolfitError::EquationSyntax {
            equation: equation.trim().to_string(),
            reason: reason.into(),
        }
    }

    /// Oracle and IO failures only cost fitness; everything else ends the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BoolfitError::Oracle(_) | BoolfitError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, BoolfitError>;
