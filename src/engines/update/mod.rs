//! Statistics update, deletion vote and covering.

pub mod mlslcs;
pub mod slcs;

pub use mlslcs::{LabelStats, MlslcsData, MlslcsUpdate};
pub use slcs::{SlcsData, SlcsUpdate};

use crate::config::DeletionMode;
use crate::engines::context::LcsContext;
use crate::engines::control::ControlledPopulation;
use crate::engines::generation::GeneticAlgorithm;
use crate::engines::population::{Classifier, ClassifierSet, Macroclassifier};
use crate::error::Result;
use crate::types::{ClassifierOrigin, ComparisonMode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// How matched classifiers learn from a training instance.
pub trait UpdateStrategy: Sized {
    /// Per-classifier learning state.
    type Data: Clone + Debug + Serialize + DeserializeOwned;

    fn create_data(&self) -> Self::Data;

    fn comparison_value(&self, classifier: &Classifier<Self::Data>, mode: ComparisonMode) -> f64;

    fn set_comparison_value(&self, classifier: &mut Classifier<Self::Data>, mode: ComparisonMode, value: f64);

    fn accuracy(&self, classifier: &Classifier<Self::Data>) -> f64;

    fn niche_size(&self, classifier: &Classifier<Self::Data>) -> f64;

    /// Short textual rendering of the learning state, used by the population dump.
    fn data_summary(&self, classifier: &Classifier<Self::Data>) -> String;

    fn inherit_parent_parameters(
        &self,
        parent_a: &Classifier<Self::Data>,
        parent_b: &Classifier<Self::Data>,
        child: &mut Classifier<Self::Data>,
    );

    /// Refreshes the deletion vote of every rule in `set`.
    fn compute_deletion_probabilities(&self, set: &ClassifierSet<Self::Data>);

    /// New rule matching training instance `instance_index`.
    fn cover(&self, instance_index: usize, ctx: &mut LcsContext) -> Macroclassifier<Self::Data> {
        let chromosome = ctx.covering_chromosome(instance_index);
        let mut classifier = Classifier::new(
            ctx.serials.next_serial(),
            chromosome,
            self.create_data(),
            ClassifierOrigin::Cover,
        );
        classifier.created = ctx.total_repetition;
        classifier.cumulative_instance_created = ctx.cumulative_instance_index;
        ctx.covers += 1;
        Macroclassifier::new(classifier, 1)
    }

    /// Updates the match set and, when `evolve` is set, runs the GA with
    /// insertion and population control after every offspring.
    fn update_set(
        &mut self,
        population: &mut ControlledPopulation<'_, Self>,
        match_set: &mut ClassifierSet<Self::Data>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()>;

    /// Like `update_set`, but collects all offspring first and controls the
    /// population once at the end.
    fn update_set_batched(
        &mut self,
        population: &mut ControlledPopulation<'_, Self>,
        match_set: &mut ClassifierSet<Self::Data>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()>;
}

/// Inputs of the deletion vote.
#[derive(Debug, Clone, Copy)]
pub struct DeletionInputs {
    pub niche_size: f64,
    pub fitness: f64,
    pub experience: u32,
    pub mean_fitness: f64,
}

/// Deletion vote of a single rule. Non-finite results become 0.
pub fn deletion_vote(
    mode: DeletionMode,
    inputs: DeletionInputs,
    theta_del: u32,
    delta: f64,
    n: f64,
) -> f64 {
    let DeletionInputs {
        niche_size,
        fitness,
        experience,
        mean_fitness,
    } = inputs;
    let gate = experience > theta_del && fitness < delta * mean_fitness;

    let vote = match mode {
        DeletionMode::Default => niche_size * if gate { mean_fitness / fitness } else { 1.0 },
        DeletionMode::Power => {
            niche_size * if gate { mean_fitness / fitness.powf(n) } else { 1.0 }
        }
        DeletionMode::Icannga => {
            let factor = if experience < theta_del {
                delta
            } else {
                (1.0 - niche_size).exp()
            };
            1.0 / (fitness * factor)
        }
        DeletionMode::Journal => {
            if experience < theta_del {
                (1.0 / fitness).exp()
            } else {
                (niche_size - 1.0).exp() / fitness
            }
        }
    };

    if vote.is_finite() {
        vote
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(niche_size: f64, fitness: f64, experience: u32, mean_fitness: f64) -> DeletionInputs {
        DeletionInputs {
            niche_size,
            fitness,
            experience,
            mean_fitness,
        }
    }

    #[test]
    fn test_default_vote_gated_by_experience_and_fitness() {
        // young rule: plain niche size
        let young = deletion_vote(DeletionMode::Default, inputs(4.0, 0.01, 5, 0.8), 20, 0.1, 10.0);
        assert_eq!(young, 4.0);
        // experienced, unfit rule: scaled by mean / fitness
        let unfit = deletion_vote(DeletionMode::Default, inputs(4.0, 0.01, 30, 0.8), 20, 0.1, 10.0);
        assert!((unfit - 4.0 * 80.0).abs() < 1e-9);
        // experienced but fit enough
        let fit = deletion_vote(DeletionMode::Default, inputs(4.0, 0.5, 30, 0.8), 20, 0.1, 10.0);
        assert_eq!(fit, 4.0);
    }

    #[test]
    fn test_power_vote_uses_fitness_power() {
        let vote = deletion_vote(DeletionMode::Power, inputs(2.0, 0.05, 30, 1.0), 20, 0.1, 2.0);
        assert!((vote - 2.0 * (1.0 / 0.0025)).abs() < 1e-6);
    }

    #[test]
    fn test_icannga_and_journal_votes() {
        let young = deletion_vote(DeletionMode::Icannga, inputs(3.0, 0.5, 1, 1.0), 20, 0.1, 10.0);
        assert!((young - 1.0 / 0.05).abs() < 1e-9);
        let old = deletion_vote(DeletionMode::Icannga, inputs(3.0, 0.5, 25, 1.0), 20, 0.1, 10.0);
        assert!((old - 1.0 / (0.5 * (-2.0f64).exp())).abs() < 1e-9);

        let young = deletion_vote(DeletionMode::Journal, inputs(3.0, 0.5, 1, 1.0), 20, 0.1, 10.0);
        assert!((young - 2.0f64.exp()).abs() < 1e-9);
        let old = deletion_vote(DeletionMode::Journal, inputs(3.0, 0.5, 25, 1.0), 20, 0.1, 10.0);
        assert!((old - 2.0f64.exp() / 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_fitness_vote_is_zero_not_infinite() {
        let vote = deletion_vote(DeletionMode::Journal, inputs(3.0, 0.0, 25, 1.0), 20, 0.1, 10.0);
        assert_eq!(vote, 0.0);
        let vote = deletion_vote(DeletionMode::Default, inputs(3.0, 0.0, 25, 1.0), 20, 0.1, 10.0);
        assert_eq!(vote, 0.0);
    }
}
