use super::{check_cap, delete_counted, PopulationControl};
use crate::engines::population::ClassifierSet;
use crate::engines::selection::Selector;
use crate::engines::update::UpdateStrategy;
use crate::error::Result;
use crate::types::ComparisonMode;
use log::trace;
use rand::RngCore;

/// Soft cap: a selected rule that is already perfectly accurate is spared and
/// the cap grows by one instead. Later deletions shrink it back toward nominal.
pub struct LowestFitnessRemoval<U: UpdateStrategy> {
    population_size: usize,
    nominal_population_size: usize,
    selector: Box<dyn Selector<U>>,
    deletions: usize,
}

impl<U: UpdateStrategy> LowestFitnessRemoval<U> {
    pub fn new(population_size: usize, selector: Box<dyn Selector<U>>) -> Result<Self> {
        check_cap(population_size)?;
        Ok(Self {
            population_size,
            nominal_population_size: population_size,
            selector,
            deletions: 0,
        })
    }

    /// Current, possibly relaxed, cap.
    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn nominal_population_size(&self) -> usize {
        self.nominal_population_size
    }
}

impl<U: UpdateStrategy> PopulationControl<U> for LowestFitnessRemoval<U> {
    fn control_population(&mut self, set: &mut ClassifierSet<U::Data>, strategy: &U, rng: &mut dyn RngCore) {
        self.deletions = 0;
        while set.total_numerosity() > self.population_size {
            let Some(index) = self.selector.select_one(set, strategy, rng) else {
                break;
            };
            let accuracy = strategy.comparison_value(&set.classifier(index), ComparisonMode::Accuracy);
            if accuracy < 1.0 {
                delete_counted(set, index);
                self.deletions += 1;
                if self.population_size > self.nominal_population_size {
                    self.population_size -= 1;
                }
            } else {
                self.population_size += 1;
                trace!("Sparing accurate classifier, cap relaxed to {}", self.population_size);
            }
        }
    }

    fn deletions_conducted(&self) -> usize {
        self.deletions
    }
}
