use super::traits::{check_positive, check_unit_interval, ConfigSection};
use crate::error::LcsError;
use serde::{Deserialize, Serialize};

/// Knobs of the statistics update, deletion vote and subsumption eligibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub algorithm: UpdateAlgorithm,
    pub fitness_mode: FitnessMode,
    pub deletion_mode: DeletionMode,
    /// Learning rate of the moving averages.
    pub beta: f64,
    pub theta_del: u32,
    pub delta: f64,
    pub acc0: f64,
    pub alpha: f64,
    /// Accuracy exponent.
    pub n: f64,
    /// Accuracy credit for abstaining on a label.
    pub omega: f64,
    /// Match-set-appearance credit for abstaining on a label.
    pub phi: f64,
    pub subsumption_fitness_threshold: f64,
    pub subsumption_experience_threshold: u32,
    pub wildcards_participate_in_correct_sets: bool,
    pub balance_correct_sets: bool,
    pub wildcard_participation_ratio: f64,
    pub match_set_population_control: bool,
    /// Single-label update only: chance of evolving the match set instead of the correct set.
    pub match_set_run_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAlgorithm {
    Mlslcs,
    Slcs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMode {
    /// fitness = accuracy^n
    Simple,
    /// fitness moves toward accuracy^n at rate beta
    Complex,
    /// per-label fitness sharing inside each correct set
    Sharing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionMode {
    Default,
    Power,
    Icannga,
    Journal,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            algorithm: UpdateAlgorithm::Mlslcs,
            fitness_mode: FitnessMode::Simple,
            deletion_mode: DeletionMode::Default,
            beta: 0.2,
            theta_del: 20,
            delta: 0.1,
            acc0: 0.99,
            alpha: 0.1,
            n: 10.0,
            omega: 0.9,
            phi: 1.0,
            subsumption_fitness_threshold: 0.99,
            subsumption_experience_threshold: 10,
            wildcards_participate_in_correct_sets: false,
            balance_correct_sets: false,
            wildcard_participation_ratio: 1.0,
            match_set_population_control: false,
            match_set_run_probability: 0.0,
        }
    }
}

impl ConfigSection for UpdateConfig {
    fn section_name() -> &'static str {
        "update"
    }

    fn validate(&self) -> Result<(), LcsError> {
        let section = Self::section_name();
        check_unit_interval(section, "beta", self.beta)?;
        check_unit_interval(section, "delta", self.delta)?;
        check_unit_interval(section, "acc0", self.acc0)?;
        check_unit_interval(section, "match_set_run_probability", self.match_set_run_probability)?;
        check_positive(section, "acc0", self.acc0)?;
        check_positive(section, "n", self.n)?;
        if !(self.alpha >= 0.0) {
            return Err(LcsError::Configuration(format!(
                "update.alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        if !(self.omega >= 0.0) || !(self.phi >= 0.0) {
            return Err(LcsError::Configuration(
                "update.omega and update.phi must be non-negative".to_string(),
            ));
        }
        if !(self.wildcard_participation_ratio >= 0.0) {
            return Err(LcsError::Configuration(format!(
                "update.wildcard_participation_ratio must be non-negative, got {}",
                self.wildcard_participation_ratio
            )));
        }
        Ok(())
    }
}
