use crate::error::LcsError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), LcsError>;
}

/// Shared check for probability-like knobs.
pub(crate) fn check_unit_interval(section: &str, name: &str, value: f64) -> Result<(), LcsError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(LcsError::Configuration(format!(
            "{}.{} must be between 0 and 1, got {}",
            section, name, value
        )));
    }
    Ok(())
}

pub(crate) fn check_positive(section: &str, name: &str, value: f64) -> Result<(), LcsError> {
    if !(value > 0.0) || !value.is_finite() {
        return Err(LcsError::Configuration(format!(
            "{}.{} must be a positive number, got {}",
            section, name, value
        )));
    }
    Ok(())
}
