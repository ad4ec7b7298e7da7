use super::{check_cap, delete_counted, PopulationControl};
use crate::engines::population::ClassifierSet;
use crate::engines::selection::Selector;
use crate::engines::update::UpdateStrategy;
use crate::error::Result;
use log::trace;
use rand::RngCore;

/// Hard cap on total numerosity. Deletion probabilities are recomputed before
/// every single removal.
pub struct FixedSizeWorstFitnessDeletion<U: UpdateStrategy> {
    population_size: usize,
    selector: Box<dyn Selector<U>>,
    deletions: usize,
}

impl<U: UpdateStrategy> FixedSizeWorstFitnessDeletion<U> {
    pub fn new(population_size: usize, selector: Box<dyn Selector<U>>) -> Result<Self> {
        check_cap(population_size)?;
        Ok(Self {
            population_size,
            selector,
            deletions: 0,
        })
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }
}

impl<U: UpdateStrategy> PopulationControl<U> for FixedSizeWorstFitnessDeletion<U> {
    fn control_population(&mut self, set: &mut ClassifierSet<U::Data>, strategy: &U, rng: &mut dyn RngCore) {
        self.deletions = 0;
        while set.total_numerosity() > self.population_size {
            strategy.compute_deletion_probabilities(set);
            let Some(index) = self.selector.select_one(set, strategy, rng) else {
                break;
            };
            trace!("Deleting one copy of classifier {}", set.macroclassifier(index).serial());
            delete_counted(set, index);
            self.deletions += 1;
        }
    }

    fn deletions_conducted(&self) -> usize {
        self.deletions
    }
}
