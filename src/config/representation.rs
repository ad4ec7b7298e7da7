use super::traits::{check_unit_interval, ConfigSection};
use crate::error::LcsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepresentationConfig {
    /// Probability that covering leaves an attribute as a wildcard.
    pub attribute_generalization_rate: f64,
    /// Probability that covering leaves a label as a wildcard.
    pub label_generalization_rate: f64,
    /// Bits per interval bound.
    pub precision_bits: u32,
}

impl Default for RepresentationConfig {
    fn default() -> Self {
        Self {
            attribute_generalization_rate: 0.33,
            label_generalization_rate: 0.0,
            precision_bits: 8,
        }
    }
}

impl ConfigSection for RepresentationConfig {
    fn section_name() -> &'static str {
        "representation"
    }

    fn validate(&self) -> Result<(), LcsError> {
        check_unit_interval(
            Self::section_name(),
            "attribute_generalization_rate",
            self.attribute_generalization_rate,
        )?;
        check_unit_interval(
            Self::section_name(),
            "label_generalization_rate",
            self.label_generalization_rate,
        )?;
        if self.precision_bits == 0 || self.precision_bits > 31 {
            return Err(LcsError::Configuration(format!(
                "representation.precision_bits must be in 1..=31, got {}",
                self.precision_bits
            )));
        }
        Ok(())
    }
}
