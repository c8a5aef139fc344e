use crate::error::BoolfitError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), BoolfitError>;
}

/// Shared check for values that must lie in `[0, 1]`.
pub(crate) fn check_unit_interval(section: &str, name: &str, value: f64) -> Result<(), BoolfitError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BoolfitError::Configuration(format!(
            "{}.{} must be between 0 and 1, found {}",
            section, name, value
        )))
    }
}
