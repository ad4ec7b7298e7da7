use super::traits::{check_unit_interval, ConfigSection};
use crate::error::LcsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub crossover_rate: f64,
    /// Per-bit flip probability.
    pub mutation_rate: f64,
    /// GA activation age (theta GA).
    pub activation_age: u64,
    pub crossover_operator: CrossoverKind,
    /// Draw the crossover decision once for both children instead of per child.
    pub decide_crossover_at_once: bool,
    /// Check offspring against the whole population for subsumption.
    pub thoroughly_check_with_population: bool,
    pub selector: SelectorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    SinglePoint,
    /// Condition crossover plus the evolved label's gene.
    MultiPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectorKind {
    Roulette,
    Tournament { size: usize },
    /// Tournament sized as a fraction of total numerosity.
    TournamentFraction { fraction: f64 },
    CumulativeTournament { size: usize },
    Best,
}

impl SelectorKind {
    pub(crate) fn validate(&self, section: &str) -> Result<(), LcsError> {
        match *self {
            SelectorKind::Tournament { size } | SelectorKind::CumulativeTournament { size } => {
                if size == 0 {
                    return Err(LcsError::Configuration(format!(
                        "{}: tournament size must be at least 1",
                        section
                    )));
                }
            }
            SelectorKind::TournamentFraction { fraction } => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(LcsError::Configuration(format!(
                        "{}: tournament fraction must be in (0, 1], got {}",
                        section, fraction
                    )));
                }
            }
            SelectorKind::Roulette | SelectorKind::Best => {}
        }
        Ok(())
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            crossover_rate: 0.8,
            mutation_rate: 0.04,
            activation_age: 100,
            crossover_operator: CrossoverKind::SinglePoint,
            decide_crossover_at_once: false,
            thoroughly_check_with_population: true,
            selector: SelectorKind::Roulette,
        }
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), LcsError> {
        check_unit_interval(Self::section_name(), "crossover_rate", self.crossover_rate)?;
        check_unit_interval(Self::section_name(), "mutation_rate", self.mutation_rate)?;
        self.selector.validate(Self::section_name())
    }
}
