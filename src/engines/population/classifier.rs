use crate::data::bitset::Chromosome;
use crate::data::instances::InstanceMatrix;
use crate::data::representation::Representation;
use crate::types::{ClassifierOrigin, LabelAbility, MatchState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hands out classifier serials. Owned by the learner context, one per population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSequence {
    next: u64,
}

impl SerialSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence continuing after `last`, used when a saved population is reloaded.
    pub fn after(last: u64) -> Self {
        Self { next: last + 1 }
    }

    pub fn next_serial(&mut self) -> u64 {
        let serial = self.next;
        self.next += 1;
        serial
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// A single rule: a chromosome plus the learning state attached to it.
///
/// The match cache is rebuilt lazily after deserialization, `objective_coverage`
/// survives so a reloaded rule keeps the coverage it froze during training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classifier<D> {
    serial: u64,
    chromosome: Chromosome,
    pub data: D,
    pub experience: u32,
    /// GA timestamp of the last correct set this rule took part in.
    pub timestamp: u64,
    /// Training repetition at creation.
    pub created: u64,
    pub cumulative_instance_created: u64,
    origin: ClassifierOrigin,
    can_subsume: bool,
    objective_coverage: f64,
    #[serde(skip)]
    match_cache: Vec<MatchState>,
    #[serde(skip)]
    checked: usize,
    #[serde(skip)]
    covered: usize,
}

impl<D> Classifier<D> {
    pub fn new(serial: u64, chromosome: Chromosome, data: D, origin: ClassifierOrigin) -> Self {
        Self {
            serial,
            chromosome,
            data,
            experience: 0,
            timestamp: 0,
            created: 0,
            cumulative_instance_created: 0,
            origin,
            can_subsume: false,
            objective_coverage: -1.0,
            match_cache: Vec::new(),
            checked: 0,
            covered: 0,
        }
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    pub fn origin(&self) -> ClassifierOrigin {
        self.origin
    }

    pub fn set_origin(&mut self, origin: ClassifierOrigin) {
        self.origin = origin;
    }

    pub fn can_subsume(&self) -> bool {
        self.can_subsume
    }

    pub fn set_subsumption_ability(&mut self, ability: bool) {
        self.can_subsume = ability;
    }

    pub fn checked(&self) -> usize {
        self.checked
    }

    pub fn covered(&self) -> usize {
        self.covered
    }

    /// Fraction of checked instances matched, 0.5 before any check.
    pub fn coverage(&self) -> f64 {
        if self.checked == 0 {
            0.5
        } else {
            self.covered as f64 / self.checked as f64
        }
    }

    /// -1 until every training instance has been checked.
    pub fn objective_coverage(&self) -> f64 {
        self.objective_coverage
    }

    pub fn match_state(&self, instance_index: usize) -> MatchState {
        self.match_cache
            .get(instance_index)
            .copied()
            .unwrap_or_default()
    }

    /// Matches against a training instance, memoizing the outcome.
    pub fn is_match_at(
        &mut self,
        instance_index: usize,
        representation: &dyn Representation,
        instances: &InstanceMatrix,
    ) -> bool {
        self.ensure_cache(instances.len());
        match self.match_cache[instance_index] {
            MatchState::Match => true,
            MatchState::NoMatch => false,
            MatchState::Unknown => {
                let matched = representation.is_match(instances.row(instance_index), &self.chromosome);
                self.match_cache[instance_index] = if matched {
                    MatchState::Match
                } else {
                    MatchState::NoMatch
                };
                self.checked += 1;
                if matched {
                    self.covered += 1;
                }
                self.freeze_coverage(instances.len());
                matched
            }
        }
    }

    /// Fills the whole match cache at once.
    pub fn precompute_matches(
        &mut self,
        representation: &dyn Representation,
        instances: &InstanceMatrix,
    ) {
        self.ensure_cache(instances.len());
        let chromosome = &self.chromosome;
        let computed: Vec<bool> = instances
            .rows()
            .par_iter()
            .map(|row| representation.is_match(row, chromosome))
            .collect();
        for (state, matched) in self.match_cache.iter_mut().zip(computed) {
            if *state == MatchState::Unknown {
                *state = if matched {
                    MatchState::Match
                } else {
                    MatchState::NoMatch
                };
                self.checked += 1;
                if matched {
                    self.covered += 1;
                }
            }
        }
        self.freeze_coverage(instances.len());
    }

    /// Uncached match against an arbitrary instance.
    pub fn is_match(&self, instance: &[f64], representation: &dyn Representation) -> bool {
        representation.is_match(instance, &self.chromosome)
    }

    pub fn classify_label(
        &self,
        instance: &[f64],
        label: usize,
        representation: &dyn Representation,
    ) -> LabelAbility {
        representation.classify_ability_label(&self.chromosome, instance, label)
    }

    pub fn is_more_general(&self, other: &Classifier<D>, representation: &dyn Representation) -> bool {
        representation.is_more_general(&self.chromosome, &other.chromosome)
    }

    pub fn equals(&self, other: &Classifier<D>, representation: &dyn Representation) -> bool {
        representation.are_equal(&self.chromosome, &other.chromosome)
    }

    pub fn describe(&self, representation: &dyn Representation) -> String {
        representation.describe(&self.chromosome)
    }

    fn ensure_cache(&mut self, instances: usize) {
        if self.match_cache.len() != instances {
            self.match_cache = vec![MatchState::Unknown; instances];
            self.checked = 0;
            self.covered = 0;
        }
    }

    fn freeze_coverage(&mut self, instances: usize) {
        if self.checked == instances && self.objective_coverage < 0.0 {
            self.objective_coverage = self.coverage();
        }
    }
}
