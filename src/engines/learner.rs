//! Training driver: owns the population, the strategies and the context.

use crate::config::{LcsConfig, PopulationControlKind, UpdateMode};
use crate::data::instances::InstanceMatrix;
use crate::data::representation::Representation;
use crate::engines::context::LcsContext;
use crate::engines::control::{
    ControlledPopulation, FixedSizeWorstFitnessDeletion, LowestFitnessRemoval, PopulationControl,
};
use crate::engines::generation::{ProgressCallback, RepetitionSummary, SteadyStateGa};
use crate::engines::population::{dump_population, ClassifierSet, PopulationSnapshot, SerialSequence};
use crate::engines::selection::build_selector;
use crate::engines::update::{MlslcsUpdate, SlcsUpdate, UpdateStrategy};
use crate::error::{LcsError, Result};
use crate::types::ComparisonMode;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

pub struct Learner<U: UpdateStrategy + 'static> {
    config: LcsConfig,
    population: ClassifierSet<U::Data>,
    strategy: U,
    ga: SteadyStateGa<U>,
    control: Box<dyn PopulationControl<U>>,
    ctx: LcsContext,
}

impl Learner<MlslcsUpdate> {
    pub fn mlslcs(
        config: LcsConfig,
        representation: Arc<dyn Representation>,
        instances: Arc<InstanceMatrix>,
    ) -> Result<Self> {
        let strategy = MlslcsUpdate::new(config.update.clone(), config.learner.number_of_labels)?;
        Self::new(config, strategy, representation, instances)
    }
}

impl Learner<SlcsUpdate> {
    pub fn slcs(
        config: LcsConfig,
        representation: Arc<dyn Representation>,
        instances: Arc<InstanceMatrix>,
    ) -> Result<Self> {
        let strategy = SlcsUpdate::new(config.update.clone());
        Self::new(config, strategy, representation, instances)
    }
}

impl<U: UpdateStrategy + 'static> Learner<U> {
    pub fn new(
        config: LcsConfig,
        strategy: U,
        representation: Arc<dyn Representation>,
        instances: Arc<InstanceMatrix>,
    ) -> Result<Self> {
        config.validate()?;
        let labels = config.learner.number_of_labels;
        if representation.number_of_labels() != labels || instances.number_of_labels() != labels {
            return Err(LcsError::Configuration(format!(
                "label count mismatch: config {}, representation {}, instances {}",
                labels,
                representation.number_of_labels(),
                instances.number_of_labels()
            )));
        }
        if !instances.is_empty() && instances.number_of_attributes() != representation.number_of_attributes() {
            return Err(LcsError::Data(format!(
                "instances have {} attribute columns, representation expects {}",
                instances.number_of_attributes(),
                representation.number_of_attributes()
            )));
        }

        let ga_selector = build_selector(&config.evolution.selector, ComparisonMode::Exploration, true);
        let ga = SteadyStateGa::new(&config.evolution, ga_selector);

        let control: Box<dyn PopulationControl<U>> = match config.learner.population_control {
            PopulationControlKind::FixedSize => {
                let selector = build_selector(&config.learner.deletion_selector, ComparisonMode::Deletion, true);
                Box::new(FixedSizeWorstFitnessDeletion::new(config.learner.population_size, selector)?)
            }
            PopulationControlKind::LowestFitness => {
                let selector =
                    build_selector(&config.learner.deletion_selector, ComparisonMode::PureFitness, false);
                Box::new(LowestFitnessRemoval::new(config.learner.population_size, selector)?)
            }
        };

        let ctx = LcsContext::new(representation, instances, config.learner.seed);
        Ok(Self {
            config,
            population: ClassifierSet::new(),
            strategy,
            ga,
            control,
            ctx,
        })
    }

    /// Full training: `train_iterations` evolving repetitions followed by the
    /// update-only phase.
    pub fn train(&mut self, callback: &mut dyn ProgressCallback) -> Result<()> {
        let evolving = self.config.learner.train_iterations;
        let update_only = self.config.learner.update_only_iterations();
        let total = evolving + update_only;
        info!(
            "Training on {} instances: {} evolving and {} update-only repetitions",
            self.ctx.instances.len(),
            evolving,
            update_only
        );

        for repetition in 0..total {
            let evolve = repetition < evolving;
            let report = (repetition + 1) % self.config.learner.callback_rate == 0
                || repetition + 1 == evolving
                || repetition + 1 == total;
            if report {
                callback.on_repetition_start(repetition, total);
            }
            self.run_repetition(evolve)?;
            if report {
                callback.on_repetition_complete(repetition, &self.summary());
            }
        }
        info!(
            "Training finished with {} rules (numerosity {})",
            self.population.len(),
            self.population.total_numerosity()
        );
        Ok(())
    }

    /// Update-only repetitions over the training set; the GA stays off.
    pub fn update_population(&mut self, repetitions: usize) -> Result<()> {
        for _ in 0..repetitions {
            self.run_repetition(false)?;
        }
        Ok(())
    }

    /// One pass over every training instance, in order.
    pub fn run_repetition(&mut self, evolve: bool) -> Result<()> {
        for index in 0..self.ctx.instances.len() {
            self.train_with_instance(index, evolve)?;
            self.ctx.cumulative_instance_index += 1;
        }
        if !self.config.evolution.thoroughly_check_with_population {
            let representation = Arc::clone(&self.ctx.representation);
            self.population.assimilate_duplicate_classifiers(representation.as_ref());
        }
        self.ctx.total_repetition += 1;

        let summary = self.summary();
        debug!(
            "Repetition {}: {} rules, numerosity {}, mean fitness {:.4}, covers {}, match-set deletions {}, mean correct set size {}",
            self.ctx.total_repetition,
            summary.macroclassifiers,
            summary.numerosity,
            summary.mean_fitness,
            summary.covers,
            self.ctx.deleted_in_match_sets,
            summary.mean_correct_set_size
        );
        Ok(())
    }

    /// Match set, update and, when `evolve` is set, GA for one training instance.
    pub fn train_with_instance(&mut self, instance_index: usize, evolve: bool) -> Result<()> {
        if instance_index >= self.ctx.instances.len() {
            return Err(LcsError::Data(format!(
                "instance {} out of range, {} instances loaded",
                instance_index,
                self.ctx.instances.len()
            )));
        }
        let representation = Arc::clone(&self.ctx.representation);
        let instances = Arc::clone(&self.ctx.instances);
        let mut match_set =
            self.population
                .generate_match_set(instance_index, representation.as_ref(), &instances);

        let mut population = ControlledPopulation::new(&mut self.population, self.control.as_mut());
        match self.config.learner.update_mode {
            UpdateMode::Immediate => self.strategy.update_set(
                &mut population,
                &mut match_set,
                instance_index,
                evolve,
                &mut self.ga,
                &mut self.ctx,
            ),
            UpdateMode::Batched => self.strategy.update_set_batched(
                &mut population,
                &mut match_set,
                instance_index,
                evolve,
                &mut self.ga,
                &mut self.ctx,
            ),
        }
    }

    /// Per-label decision by fitness-weighted vote of the matching rules.
    /// Labels no matching rule decides on come out negative.
    pub fn classify(&self, instance: &[f64]) -> Vec<bool> {
        let representation = self.ctx.representation();
        let match_set = self.population.match_set_for(instance, representation);
        let labels = representation.number_of_labels();
        let mut votes = vec![0.0f64; labels];

        for macroclassifier in match_set.iter() {
            let classifier = macroclassifier.borrow();
            let weight = self.strategy.comparison_value(&classifier, ComparisonMode::PureFitness)
                * macroclassifier.numerosity as f64;
            for (label, vote) in votes.iter_mut().enumerate() {
                match representation.label_decision(classifier.chromosome(), label) {
                    Some(true) => *vote += weight,
                    Some(false) => *vote -= weight,
                    None => {}
                }
            }
        }
        votes.into_iter().map(|vote| vote > 0.0).collect()
    }

    /// Fills every rule's match cache, so coverage is known without a full pass.
    pub fn precompute_matches(&self) {
        self.population
            .precompute_matches(self.ctx.representation(), self.ctx.instances());
    }

    pub fn summary(&self) -> RepetitionSummary {
        RepetitionSummary {
            macroclassifiers: self.population.len(),
            numerosity: self.population.total_numerosity(),
            mean_fitness: self
                .population
                .mean_comparison_value(ComparisonMode::PureFitness, &self.strategy),
            covers: self.ctx.covers,
            ga_invocations: self.population.stats.total_ga_invocations,
            mean_correct_set_size: self.ctx.mean_correct_set_numerosity,
        }
    }

    pub fn dump(&self) -> String {
        dump_population(
            &self.population,
            &self.strategy,
            self.ctx.representation(),
            self.ctx.instances.len(),
        )
    }

    pub fn snapshot(&self) -> PopulationSnapshot<U::Data> {
        PopulationSnapshot::new(self.population.clone(), self.ctx.serials)
    }

    pub fn save_population<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.snapshot().save(path)?;
        info!("Saved {} rules", self.population.len());
        Ok(())
    }

    /// Replaces the population with a saved one. Serials continue after the
    /// highest one in use.
    pub fn load_population<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let snapshot = PopulationSnapshot::<U::Data>::load(path)?;
        self.restore(snapshot);
        Ok(())
    }

    pub fn restore(&mut self, snapshot: PopulationSnapshot<U::Data>) {
        let next_free = snapshot.population.next_free_serial();
        self.ctx.serials = if snapshot.serials.peek() >= next_free {
            snapshot.serials
        } else {
            SerialSequence::after(next_free - 1)
        };
        self.population = snapshot.population;
        info!(
            "Restored {} rules saved at {}",
            self.population.len(),
            snapshot.saved_at
        );
    }

    pub fn population(&self) -> &ClassifierSet<U::Data> {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut ClassifierSet<U::Data> {
        &mut self.population
    }

    pub fn strategy(&self) -> &U {
        &self.strategy
    }

    pub fn context(&self) -> &LcsContext {
        &self.ctx
    }

    pub fn config(&self) -> &LcsConfig {
        &self.config
    }

    pub fn ga(&self) -> &SteadyStateGa<U> {
        &self.ga
    }

    /// Micro-classifiers removed by the last population control run.
    pub fn deletions_conducted(&self) -> usize {
        self.control.deletions_conducted()
    }
}
