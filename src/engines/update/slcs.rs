use super::{deletion_vote, DeletionInputs, UpdateStrategy};
use crate::config::UpdateConfig;
use crate::data::representation::Representation;
use crate::engines::context::LcsContext;
use crate::engines::control::ControlledPopulation;
use crate::engines::generation::GeneticAlgorithm;
use crate::engines::population::{Classifier, ClassifierSet};
use crate::error::Result;
use crate::types::{safe_ratio, ComparisonMode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlcsData {
    pub fitness: f64,
    /// Running mean of the correct-set numerosity.
    pub ns: f64,
    pub msa: u32,
    pub tp: u32,
    pub d: f64,
}

impl Default for SlcsData {
    fn default() -> Self {
        Self {
            fitness: 0.5,
            ns: 0.0,
            msa: 0,
            tp: 0,
            d: 0.0,
        }
    }
}

impl SlcsData {
    pub fn accuracy(&self) -> f64 {
        safe_ratio(self.tp as f64, self.msa as f64)
    }
}

/// Single correct set built from the whole label vector.
pub struct SlcsUpdate {
    config: UpdateConfig,
    commenced_deletions: Cell<bool>,
}

impl SlcsUpdate {
    pub fn new(config: UpdateConfig) -> Self {
        Self {
            config,
            commenced_deletions: Cell::new(false),
        }
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    pub fn commenced_deletions(&self) -> bool {
        self.commenced_deletions.get()
    }

    /// Rules advocating every label of `instance` correctly.
    pub fn correct_set(
        &self,
        match_set: &ClassifierSet<SlcsData>,
        instance: &[f64],
        representation: &dyn Representation,
    ) -> ClassifierSet<SlcsData> {
        let mut correct_set = ClassifierSet::new();
        for macroclassifier in match_set.iter() {
            let positive = representation
                .classify_ability_all(macroclassifier.borrow().chromosome(), instance)
                .is_positive();
            if positive {
                correct_set.push(macroclassifier.clone());
            }
        }
        correct_set
    }

    fn update_match_set(&self, match_set: &ClassifierSet<SlcsData>, correct_set: &ClassifierSet<SlcsData>) {
        let correct_numerosity = correct_set.total_numerosity() as f64;
        for macroclassifier in match_set.iter() {
            let member = correct_set.index_of_serial(macroclassifier.serial()).is_some();
            let mut classifier = macroclassifier.borrow_mut();

            let data = &mut classifier.data;
            if member {
                let msa = data.msa as f64;
                data.ns = (msa * data.ns + correct_numerosity) / (msa + 1.0);
                data.tp += 1;
            }
            data.msa += 1;
            data.fitness = data.accuracy().powf(self.config.n);

            let eligible = self.comparison_value(&classifier, ComparisonMode::Exploitation)
                > self.config.subsumption_fitness_threshold
                && classifier.experience > self.config.subsumption_experience_threshold;
            classifier.set_subsumption_ability(eligible);
            classifier.experience += 1;
        }
    }

    /// Correct set of the instance, or `None` when it is empty.
    fn prepare(
        &self,
        match_set: &ClassifierSet<SlcsData>,
        instance_index: usize,
        ctx: &mut LcsContext,
    ) -> Option<ClassifierSet<SlcsData>> {
        let correct_set = self.correct_set(match_set, ctx.instance(instance_index), ctx.representation());
        ctx.mean_correct_set_numerosity = correct_set.len();
        if correct_set.is_empty() {
            return None;
        }
        self.update_match_set(match_set, &correct_set);
        Some(correct_set)
    }
}

impl UpdateStrategy for SlcsUpdate {
    type Data = SlcsData;

    fn create_data(&self) -> SlcsData {
        SlcsData::default()
    }

    fn comparison_value(&self, classifier: &Classifier<SlcsData>, mode: ComparisonMode) -> f64 {
        let data = &classifier.data;
        match mode {
            ComparisonMode::Exploration | ComparisonMode::PureFitness => data.fitness,
            ComparisonMode::Deletion => data.d,
            ComparisonMode::Exploitation | ComparisonMode::PureAccuracy => data.accuracy(),
            ComparisonMode::Accuracy => {
                if classifier.objective_coverage() < 0.0 {
                    2.0
                } else {
                    data.accuracy()
                }
            }
        }
    }

    fn set_comparison_value(&self, classifier: &mut Classifier<SlcsData>, _mode: ComparisonMode, value: f64) {
        classifier.data.fitness = value;
    }

    fn accuracy(&self, classifier: &Classifier<SlcsData>) -> f64 {
        classifier.data.accuracy()
    }

    fn niche_size(&self, classifier: &Classifier<SlcsData>) -> f64 {
        classifier.data.ns
    }

    fn data_summary(&self, classifier: &Classifier<SlcsData>) -> String {
        let data = &classifier.data;
        format!("tp:|{}|msa:|{}|ns:|{:.4}|", data.tp, data.msa, data.ns)
    }

    fn inherit_parent_parameters(
        &self,
        parent_a: &Classifier<SlcsData>,
        parent_b: &Classifier<SlcsData>,
        child: &mut Classifier<SlcsData>,
    ) {
        child.data.ns = (parent_a.data.ns + parent_b.data.ns) / 2.0;
    }

    fn compute_deletion_probabilities(&self, set: &ClassifierSet<SlcsData>) {
        self.commenced_deletions.set(true);
        let mean_fitness = set.mean_comparison_value(ComparisonMode::Exploration, self);
        for macroclassifier in set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            let inputs = DeletionInputs {
                niche_size: classifier.data.ns,
                fitness: classifier.data.fitness,
                experience: classifier.experience,
                mean_fitness,
            };
            classifier.data.d = deletion_vote(
                self.config.deletion_mode,
                inputs,
                self.config.theta_del,
                self.config.delta,
                self.config.n,
            );
        }
    }

    fn update_set(
        &mut self,
        population: &mut ControlledPopulation<'_, Self>,
        match_set: &mut ClassifierSet<SlcsData>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()> {
        let Some(correct_set) = self.prepare(match_set, instance_index, ctx) else {
            if evolve {
                let covering = self.cover(instance_index, ctx);
                population.add_classifier(covering, false, self, ctx);
            }
            return Ok(());
        };
        if !evolve {
            return Ok(());
        }

        if ctx.rng.gen::<f64>() < self.config.match_set_run_probability {
            ga.evolve_set(match_set, population, 0, self, ctx)?;
        } else {
            ga.evolve_set(&correct_set, population, 0, self, ctx)?;
        }
        population.set.stats.total_ga_invocations = ga.timestamp();
        Ok(())
    }

    fn update_set_batched(
        &mut self,
        population: &mut ControlledPopulation<'_, Self>,
        match_set: &mut ClassifierSet<SlcsData>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()> {
        let Some(correct_set) = self.prepare(match_set, instance_index, ctx) else {
            if evolve {
                let covering = self.cover(instance_index, ctx);
                population.set.push(covering);
                population.control(self, ctx);
            }
            return Ok(());
        };
        if !evolve {
            return Ok(());
        }

        let evolve_set = if ctx.rng.gen::<f64>() < self.config.match_set_run_probability {
            &*match_set
        } else {
            &correct_set
        };
        ga.increase_timestamp();
        let mean_age = ga.mean_age(evolve_set);
        if ga.timestamp().saturating_sub(mean_age) < ga.activation_age() {
            return Ok(());
        }
        for macroclassifier in evolve_set.iter() {
            macroclassifier.borrow_mut().timestamp = ga.timestamp();
        }

        let offspring = ga.evolve_set_batched(evolve_set, population.set, 0, self, ctx)?;
        population.set.stats.total_ga_invocations = ga.timestamp();
        for index in offspring.indices_to_subsume {
            population.set.absorb_offspring(index);
        }
        population.set.merge_without_control(offspring.new_classifiers);
        population.control(self, ctx);
        Ok(())
    }
}
