use super::classifier::SerialSequence;
use super::classifier_set::ClassifierSet;
use crate::data::representation::Representation;
use crate::engines::update::UpdateStrategy;
use crate::error::Result;
use crate::types::{ClassifierOrigin, ComparisonMode};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// A saved population together with the serial sequence that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot<D> {
    pub saved_at: DateTime<Utc>,
    pub serials: SerialSequence,
    pub population: ClassifierSet<D>,
}

impl<D> PopulationSnapshot<D>
where
    D: Serialize + DeserializeOwned,
{
    pub fn new(population: ClassifierSet<D>, serials: SerialSequence) -> Self {
        Self {
            saved_at: Utc::now(),
            serials,
            population,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// One line per rule, `|`-separated, followed by population counters.
pub fn dump_population<U: UpdateStrategy>(
    population: &ClassifierSet<U::Data>,
    strategy: &U,
    representation: &dyn Representation,
    number_of_instances: usize,
) -> String {
    let mut out = String::new();
    let mut subsumptions = 0;
    let mut by_origin = [0usize; 3];

    for macroclassifier in population.iter() {
        let classifier = macroclassifier.borrow();
        let covered_instances = if classifier.objective_coverage() < 0.0 {
            -1
        } else {
            (classifier.objective_coverage() * number_of_instances as f64).round() as i64
        };
        let _ = writeln!(
            out,
            "{}|fit:|{:.4}|acc:|{:.4}|num:|{}|exp:|{}|cov:|{}|{}|origin:|{}|created:|{}|last in correct set:|{}|subsumptions:|{}|serial:|{}|",
            classifier.describe(representation),
            strategy.comparison_value(&classifier, ComparisonMode::Exploration),
            strategy.comparison_value(&classifier, ComparisonMode::PureAccuracy),
            macroclassifier.numerosity,
            classifier.experience,
            covered_instances,
            strategy.data_summary(&classifier),
            classifier.origin().as_str(),
            classifier.cumulative_instance_created,
            classifier.timestamp,
            macroclassifier.subsumptions,
            classifier.serial(),
        );
        subsumptions += macroclassifier.subsumptions;
        let slot = match classifier.origin() {
            ClassifierOrigin::Init => 0,
            ClassifierOrigin::Cover => 1,
            ClassifierOrigin::Ga => 2,
        };
        by_origin[slot] += 1;
    }

    let stats = &population.stats;
    let _ = writeln!(
        out,
        "macroclassifiers: {} | numerosity: {} | init: {} | cover: {} | ga: {} | subsumptions: {}",
        population.len(),
        population.total_numerosity(),
        by_origin[0],
        by_origin[1],
        by_origin[2],
        subsumptions
    );
    let _ = writeln!(
        out,
        "deleted (cover/init): {} | deleted (ga): {} | zero-coverage deletions: {} | ga invocations: {}",
        stats.covered_deleted, stats.gaed_deleted, stats.zero_coverage_deletions, stats.total_ga_invocations
    );
    out
}
