use super::evolution::SelectorKind;
use super::traits::ConfigSection;
use crate::error::LcsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub number_of_labels: usize,
    pub population_size: usize,
    pub train_iterations: usize,
    /// Extra update-only repetitions, as a fraction of `train_iterations`.
    pub update_only_percentage: f64,
    pub update_mode: UpdateMode,
    pub population_control: PopulationControlKind,
    pub deletion_selector: SelectorKind,
    /// Repetitions between progress callbacks.
    pub callback_rate: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Evolve and delete per label correct set as soon as it is formed.
    Immediate,
    /// Gather offspring for every label, then merge and delete once.
    Batched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationControlKind {
    FixedSize,
    LowestFitness,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            number_of_labels: 1,
            population_size: 1500,
            train_iterations: 1000,
            update_only_percentage: 0.1,
            update_mode: UpdateMode::Immediate,
            population_control: PopulationControlKind::FixedSize,
            deletion_selector: SelectorKind::Roulette,
            callback_rate: 100,
            seed: None,
        }
    }
}

impl LearnerConfig {
    /// Number of update-only repetitions that follow training.
    pub fn update_only_iterations(&self) -> usize {
        (self.train_iterations as f64 * self.update_only_percentage) as usize
    }
}

impl ConfigSection for LearnerConfig {
    fn section_name() -> &'static str {
        "learner"
    }

    fn validate(&self) -> Result<(), LcsError> {
        if self.number_of_labels == 0 {
            return Err(LcsError::Configuration(
                "Number of labels must be at least 1".to_string(),
            ));
        }
        if self.population_size == 0 {
            return Err(LcsError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }
        if self.callback_rate == 0 {
            return Err(LcsError::Configuration(
                "Callback rate must be at least 1".to_string(),
            ));
        }
        if !(self.update_only_percentage >= 0.0) {
            return Err(LcsError::Configuration(format!(
                "Update-only percentage must be non-negative, got {}",
                self.update_only_percentage
            )));
        }
        self.deletion_selector.validate(Self::section_name())
    }
}
