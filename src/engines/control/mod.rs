//! Population size control.

pub mod fixed_size;
pub mod lowest_fitness;

pub use fixed_size::FixedSizeWorstFitnessDeletion;
pub use lowest_fitness::LowestFitnessRemoval;

use crate::engines::context::LcsContext;
use crate::engines::population::{ClassifierSet, Macroclassifier};
use crate::engines::update::UpdateStrategy;
use crate::error::{LcsError, Result};
use crate::types::ClassifierOrigin;
use rand::RngCore;

/// Removes micro-classifiers until the set is back within its bound.
pub trait PopulationControl<U: UpdateStrategy> {
    fn control_population(&mut self, set: &mut ClassifierSet<U::Data>, strategy: &U, rng: &mut dyn RngCore);

    /// Micro-classifiers deleted by the last `control_population` call.
    fn deletions_conducted(&self) -> usize;
}

pub(crate) fn check_cap(cap: usize) -> Result<()> {
    if cap == 0 {
        return Err(LcsError::Configuration(
            "population size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Deletes one micro-classifier and charges it to the origin counters.
pub(crate) fn delete_counted<D>(set: &mut ClassifierSet<D>, index: usize) {
    let origin = set.classifier(index).origin();
    match origin {
        ClassifierOrigin::Cover | ClassifierOrigin::Init => set.stats.covered_deleted += 1,
        ClassifierOrigin::Ga => set.stats.gaed_deleted += 1,
    }
    set.delete_classifier(index);
}

/// The population paired with the control strategy that keeps it bounded.
pub struct ControlledPopulation<'a, U: UpdateStrategy> {
    pub set: &'a mut ClassifierSet<U::Data>,
    control: &'a mut dyn PopulationControl<U>,
}

impl<'a, U: UpdateStrategy> ControlledPopulation<'a, U> {
    pub fn new(set: &'a mut ClassifierSet<U::Data>, control: &'a mut dyn PopulationControl<U>) -> Self {
        Self { set, control }
    }

    /// Inserts a rule and then lets the control strategy run.
    pub fn add_classifier(
        &mut self,
        macroclassifier: Macroclassifier<U::Data>,
        thorough: bool,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> bool {
        let absorbed = self
            .set
            .add_classifier(macroclassifier, thorough, strategy, ctx.representation.as_ref());
        self.control(strategy, ctx);
        absorbed
    }

    /// Controlled, non-thorough insertion of every rule of `other`.
    pub fn merge(&mut self, other: ClassifierSet<U::Data>, strategy: &U, ctx: &mut LcsContext) {
        for macroclassifier in other.macroclassifiers().iter().cloned() {
            self.add_classifier(macroclassifier, false, strategy, ctx);
        }
    }

    pub fn control(&mut self, strategy: &U, ctx: &mut LcsContext) {
        self.control.control_population(self.set, strategy, &mut ctx.rng);
    }

    pub fn deletions_conducted(&self) -> usize {
        self.control.deletions_conducted()
    }
}
