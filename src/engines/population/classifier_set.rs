use super::classifier::Classifier;
use super::macroclassifier::Macroclassifier;
use crate::data::instances::InstanceMatrix;
use crate::data::representation::Representation;
use crate::engines::update::UpdateStrategy;
use crate::types::{safe_ratio, ComparisonMode};
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::Ref;

/// Bookkeeping kept alongside the rules of a population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Deleted micro-classifiers created by covering or seeding.
    pub covered_deleted: usize,
    /// Deleted micro-classifiers created by the GA.
    pub gaed_deleted: usize,
    pub zero_coverage_deletions: usize,
    pub total_ga_invocations: u64,
}

/// A rule that may absorb an incoming one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SubsumptionCandidate {
    pub index: usize,
    pub value: f64,
    pub experience: u32,
}

/// Highest value wins; on a tie the later candidate replaces the current
/// survivor unless it has strictly less experience.
pub(crate) fn pick_survivor(candidates: &[SubsumptionCandidate]) -> Option<usize> {
    let mut iter = candidates.iter();
    let mut survivor = iter.next()?;
    for candidate in iter {
        if candidate.value > survivor.value
            || (candidate.value == survivor.value && candidate.experience >= survivor.experience)
        {
            survivor = candidate;
        }
    }
    Some(survivor.index)
}

/// Ordered macroclassifiers. Used both for the population and for the
/// transient match and correct sets, which share rules with it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifierSet<D> {
    macroclassifiers: Vec<Macroclassifier<D>>,
    total_numerosity: usize,
    pub stats: PopulationStats,
}

impl<D> Clone for ClassifierSet<D> {
    fn clone(&self) -> Self {
        Self {
            macroclassifiers: self.macroclassifiers.clone(),
            total_numerosity: self.total_numerosity,
            stats: self.stats.clone(),
        }
    }
}

impl<D> Default for ClassifierSet<D> {
    fn default() -> Self {
        Self {
            macroclassifiers: Vec::new(),
            total_numerosity: 0,
            stats: PopulationStats::default(),
        }
    }
}

impl<D> ClassifierSet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_macroclassifiers(macroclassifiers: Vec<Macroclassifier<D>>) -> Self {
        let total_numerosity = macroclassifiers.iter().map(|m| m.numerosity).sum();
        Self {
            macroclassifiers,
            total_numerosity,
            stats: PopulationStats::default(),
        }
    }

    /// Number of macroclassifiers.
    pub fn len(&self) -> usize {
        self.macroclassifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macroclassifiers.is_empty()
    }

    pub fn total_numerosity(&self) -> usize {
        self.total_numerosity
    }

    /// Sum of numerosities, recomputed from scratch.
    pub fn recount_numerosity(&self) -> usize {
        self.macroclassifiers.iter().map(|m| m.numerosity).sum()
    }

    pub fn macroclassifier(&self, index: usize) -> &Macroclassifier<D> {
        &self.macroclassifiers[index]
    }

    pub fn macroclassifiers(&self) -> &[Macroclassifier<D>] {
        &self.macroclassifiers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Macroclassifier<D>> {
        self.macroclassifiers.iter()
    }

    pub fn classifier(&self, index: usize) -> Ref<'_, Classifier<D>> {
        self.macroclassifiers[index].borrow()
    }

    pub fn numerosity(&self, index: usize) -> usize {
        self.macroclassifiers[index].numerosity
    }

    pub fn index_of_serial(&self, serial: u64) -> Option<usize> {
        self.macroclassifiers.iter().position(|m| m.serial() == serial)
    }

    /// Appends without any subsumption check.
    pub fn push(&mut self, macroclassifier: Macroclassifier<D>) {
        self.total_numerosity += macroclassifier.numerosity;
        self.macroclassifiers.push(macroclassifier);
    }

    /// Inserts a rule. With `thorough`, an existing rule that is either
    /// subsumption-capable and more general, or equal, absorbs it instead.
    /// Returns whether the rule was absorbed.
    pub fn add_classifier<U>(
        &mut self,
        macroclassifier: Macroclassifier<D>,
        thorough: bool,
        strategy: &U,
        representation: &dyn Representation,
    ) -> bool
    where
        U: UpdateStrategy<Data = D>,
    {
        if thorough {
            if let Some(index) = self.let_population_subsume(&macroclassifier, true, strategy, representation) {
                let survivor = &mut self.macroclassifiers[index];
                survivor.numerosity += macroclassifier.numerosity;
                survivor.subsumptions += 1;
                self.total_numerosity += macroclassifier.numerosity;
                return true;
            }
        }
        self.push(macroclassifier);
        false
    }

    /// Index of the rule that would absorb `macroclassifier`, without touching the set.
    pub fn let_population_subsume<U>(
        &self,
        macroclassifier: &Macroclassifier<D>,
        thorough: bool,
        strategy: &U,
        representation: &dyn Representation,
    ) -> Option<usize>
    where
        U: UpdateStrategy<Data = D>,
    {
        if !thorough {
            return None;
        }
        let incoming = macroclassifier.borrow();
        self.find_subsumer(&incoming, 0..self.len(), strategy, representation)
    }

    fn find_subsumer<U>(
        &self,
        incoming: &Classifier<D>,
        range: std::ops::Range<usize>,
        strategy: &U,
        representation: &dyn Representation,
    ) -> Option<usize>
    where
        U: UpdateStrategy<Data = D>,
    {
        let mut generals = Vec::new();
        let mut equals = Vec::new();

        for index in range {
            let macroclassifier = &self.macroclassifiers[index];
            let existing = macroclassifier.borrow();
            let candidate = || SubsumptionCandidate {
                index,
                value: macroclassifier.numerosity as f64
                    * strategy.comparison_value(&existing, ComparisonMode::Exploration),
                experience: existing.experience,
            };
            if existing.can_subsume() {
                if existing.is_more_general(incoming, representation) {
                    generals.push(candidate());
                }
            } else if existing.equals(incoming, representation) {
                equals.push(candidate());
            }
        }

        if generals.is_empty() {
            pick_survivor(&equals)
        } else {
            pick_survivor(&generals)
        }
    }

    /// Builds the match set for a training instance.
    ///
    /// Rules that have now been checked against every instance without ever
    /// matching are removed once the sweep is over.
    pub fn generate_match_set(
        &mut self,
        instance_index: usize,
        representation: &dyn Representation,
        instances: &InstanceMatrix,
    ) -> ClassifierSet<D> {
        let mut match_set = ClassifierSet::new();
        let mut zero_coverage = Vec::new();

        for (index, macroclassifier) in self.macroclassifiers.iter().enumerate() {
            let mut classifier = macroclassifier.borrow_mut();
            if classifier.is_match_at(instance_index, representation, instances) {
                match_set.push(macroclassifier.clone());
            }
            if classifier.checked() >= instances.len() && classifier.covered() == 0 {
                zero_coverage.push(index);
            }
        }

        for index in zero_coverage.into_iter().rev() {
            let removed = self.delete_macroclassifier(index);
            self.stats.zero_coverage_deletions += 1;
            debug!(
                "Removed never-matching classifier {} ({} micro-classifiers)",
                removed.serial(),
                removed.numerosity
            );
        }

        match_set
    }

    /// Match set for an arbitrary instance, no cache involved.
    pub fn match_set_for(
        &self,
        instance: &[f64],
        representation: &dyn Representation,
    ) -> ClassifierSet<D> {
        let mut match_set = ClassifierSet::new();
        for macroclassifier in &self.macroclassifiers {
            if macroclassifier.borrow().is_match(instance, representation) {
                match_set.push(macroclassifier.clone());
            }
        }
        match_set
    }

    /// Fills every rule's match cache in one pass.
    pub fn precompute_matches(&self, representation: &dyn Representation, instances: &InstanceMatrix) {
        for macroclassifier in &self.macroclassifiers {
            macroclassifier
                .borrow_mut()
                .precompute_matches(representation, instances);
        }
    }

    /// Removes one micro-classifier; returns the macroclassifier if it died.
    pub fn delete_classifier(&mut self, index: usize) -> Option<Macroclassifier<D>> {
        self.total_numerosity -= 1;
        let macroclassifier = &mut self.macroclassifiers[index];
        if macroclassifier.numerosity > 1 {
            macroclassifier.numerosity -= 1;
            None
        } else {
            Some(self.macroclassifiers.remove(index))
        }
    }

    /// Removes one micro-classifier of the rule with `serial`, if present.
    pub fn delete_classifier_by_serial(&mut self, serial: u64) -> bool {
        match self.index_of_serial(serial) {
            Some(index) => {
                self.delete_classifier(index);
                true
            }
            None => false,
        }
    }

    pub fn delete_macroclassifier(&mut self, index: usize) -> Macroclassifier<D> {
        let removed = self.macroclassifiers.remove(index);
        self.total_numerosity -= removed.numerosity;
        removed
    }

    /// Adds one micro-classifier to an existing rule that absorbed an offspring.
    pub fn absorb_offspring(&mut self, index: usize) {
        let macroclassifier = &mut self.macroclassifiers[index];
        macroclassifier.numerosity += 1;
        macroclassifier.subsumptions += 1;
        self.total_numerosity += 1;
    }

    /// Appends every rule of `other` as is.
    pub fn merge_without_control(&mut self, other: ClassifierSet<D>) {
        for macroclassifier in other.macroclassifiers {
            self.push(macroclassifier);
        }
    }

    /// Lets every rule be absorbed by a later one that can subsume it or equals it.
    pub fn check_whole_population_for_possible_subsumptions<U>(
        &mut self,
        strategy: &U,
        representation: &dyn Representation,
    ) where
        U: UpdateStrategy<Data = D>,
    {
        let mut index = 0;
        while index < self.len() {
            let survivor = {
                let incoming = self.macroclassifiers[index].borrow();
                self.find_subsumer(&incoming, index + 1..self.len(), strategy, representation)
            };
            match survivor {
                Some(survivor) => {
                    let absorbed = self.macroclassifiers.remove(index);
                    // the survivor sits after `index`, so it shifted down by one
                    let target = &mut self.macroclassifiers[survivor - 1];
                    target.numerosity += absorbed.numerosity;
                    target.subsumptions += 1;
                }
                None => index += 1,
            }
        }
        debug_assert_eq!(self.total_numerosity, self.recount_numerosity());
    }

    /// Folds chromosome-equal rules into their first occurrence.
    pub fn assimilate_duplicate_classifiers(&mut self, representation: &dyn Representation) {
        let mut i = 0;
        while i < self.len() {
            let mut j = i + 1;
            while j < self.len() {
                let equal = self.macroclassifiers[i]
                    .borrow()
                    .equals(&self.macroclassifiers[j].borrow(), representation);
                if equal {
                    let duplicate = self.macroclassifiers.remove(j);
                    let keeper = &mut self.macroclassifiers[i];
                    keeper.numerosity += duplicate.numerosity;
                    keeper.subsumptions += 1;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        debug_assert_eq!(self.total_numerosity, self.recount_numerosity());
    }

    /// Drops rules whose exploration fitness is below `threshold`. Returns how many went.
    pub fn delete_classifiers_below_fitness_threshold<U>(&mut self, threshold: f64, strategy: &U) -> usize
    where
        U: UpdateStrategy<Data = D>,
    {
        self.retain_macroclassifiers(|m| {
            strategy.comparison_value(&m.borrow(), ComparisonMode::Exploration) >= threshold
        })
    }

    /// Drops thin rules (numerosity below `threshold`) that are not clearly fit.
    pub fn delete_classifiers_below_numerosity_threshold<U>(&mut self, threshold: usize, strategy: &U) -> usize
    where
        U: UpdateStrategy<Data = D>,
    {
        self.retain_macroclassifiers(|m| {
            m.numerosity >= threshold
                || strategy.comparison_value(&m.borrow(), ComparisonMode::Exploration) >= 0.9
        })
    }

    fn retain_macroclassifiers<F>(&mut self, keep: F) -> usize
    where
        F: Fn(&Macroclassifier<D>) -> bool,
    {
        let before = self.len();
        self.macroclassifiers.retain(|m| keep(m));
        self.total_numerosity = self.recount_numerosity();
        before - self.len()
    }

    /// Sorts descending by comparison value times numerosity.
    pub fn sort_by_macro_fitness<U>(&mut self, mode: ComparisonMode, strategy: &U)
    where
        U: UpdateStrategy<Data = D>,
    {
        let macro_fitness =
            |m: &Macroclassifier<D>| strategy.comparison_value(&m.borrow(), mode) * m.numerosity as f64;
        self.macroclassifiers.sort_by(|a, b| {
            macro_fitness(b)
                .partial_cmp(&macro_fitness(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Numerosity-weighted mean of a comparison value, 0 for an empty set.
    pub fn mean_comparison_value<U>(&self, mode: ComparisonMode, strategy: &U) -> f64
    where
        U: UpdateStrategy<Data = D>,
    {
        let weighted: f64 = self
            .macroclassifiers
            .iter()
            .map(|m| strategy.comparison_value(&m.borrow(), mode) * m.numerosity as f64)
            .sum();
        safe_ratio(weighted, self.total_numerosity as f64)
    }

    /// Serial one past the highest serial in the set.
    pub fn next_free_serial(&self) -> u64 {
        self.macroclassifiers
            .iter()
            .map(|m| m.serial() + 1)
            .max()
            .unwrap_or(0)
    }
}
