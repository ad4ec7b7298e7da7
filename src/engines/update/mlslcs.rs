use super::{deletion_vote, DeletionInputs, UpdateStrategy};
use crate::config::{FitnessMode, UpdateConfig};
use crate::data::representation::Representation;
use crate::engines::context::LcsContext;
use crate::engines::control::ControlledPopulation;
use crate::engines::generation::GeneticAlgorithm;
use crate::engines::population::{Classifier, ClassifierSet};
use crate::error::{LcsError, Result};
use crate::types::{safe_ratio, ComparisonMode, LabelAbility};
use log::trace;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::Arc;

/// Learning statistics, kept once for the whole rule and once per label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStats {
    pub fitness: f64,
    /// Niche size estimate.
    pub ns: f64,
    /// Match set appearances.
    pub msa: f64,
    /// True positives.
    pub tp: f64,
    /// Relative accuracy share, sharing mode only.
    pub k: f64,
    /// Numerosity of the last correct set the rule advocated this label in.
    pub min_current_ns: usize,
}

impl Default for LabelStats {
    fn default() -> Self {
        Self {
            fitness: 1.0,
            ns: 1.0,
            msa: 0.0,
            tp: 0.0,
            k: 0.0,
            min_current_ns: 0,
        }
    }
}

impl LabelStats {
    pub fn accuracy(&self) -> f64 {
        safe_ratio(self.tp, self.msa)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlslcsData {
    pub aggregate: LabelStats,
    pub labels: Vec<LabelStats>,
    /// Deletion vote.
    pub d: f64,
}

/// Multi-label update with per-label correct sets.
pub struct MlslcsUpdate {
    config: UpdateConfig,
    number_of_labels: usize,
    commenced_deletions: Cell<bool>,
}

impl MlslcsUpdate {
    pub fn new(config: UpdateConfig, number_of_labels: usize) -> Result<Self> {
        if number_of_labels == 0 {
            return Err(LcsError::Configuration(
                "multi-label update needs at least one label".to_string(),
            ));
        }
        Ok(Self {
            config,
            number_of_labels,
            commenced_deletions: Cell::new(false),
        })
    }

    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Whether deletion probabilities have been computed at least once.
    pub fn commenced_deletions(&self) -> bool {
        self.commenced_deletions.get()
    }

    /// Rules of the match set that advocate `label` correctly (or abstain, when
    /// wildcards participate).
    pub fn label_correct_set(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        instance: &[f64],
        label: usize,
        representation: &dyn Representation,
    ) -> ClassifierSet<MlslcsData> {
        let mut correct_set = ClassifierSet::new();
        let mut only_wildcards = 0usize;
        let mut without_wildcards = ClassifierSet::new();

        for macroclassifier in match_set.iter() {
            let ability = macroclassifier.borrow().classify_label(instance, label, representation);
            if self.config.wildcards_participate_in_correct_sets {
                if ability != LabelAbility::Negative {
                    correct_set.push(macroclassifier.clone());
                }
                if self.config.balance_correct_sets {
                    match ability {
                        LabelAbility::Abstain => only_wildcards += 1,
                        LabelAbility::Positive => without_wildcards.push(macroclassifier.clone()),
                        LabelAbility::Negative => {}
                    }
                }
            } else if ability.is_positive() {
                correct_set.push(macroclassifier.clone());
            }
        }

        if self.config.wildcards_participate_in_correct_sets && self.config.balance_correct_sets {
            let allowed = self.config.wildcard_participation_ratio * without_wildcards.len() as f64;
            if only_wildcards as f64 > allowed {
                return without_wildcards;
            }
        }
        correct_set
    }

    fn correct_sets(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        instance: &[f64],
        representation: &dyn Representation,
        ctx: &mut LcsContext,
    ) -> Vec<ClassifierSet<MlslcsData>> {
        let sets: Vec<_> = (0..self.number_of_labels)
            .map(|label| self.label_correct_set(match_set, instance, label, representation))
            .collect();
        ctx.mean_correct_set_numerosity =
            sets.iter().map(|s| s.len()).sum::<usize>() / self.number_of_labels;
        sets
    }

    fn update_eligibility(&self, classifier: &mut Classifier<MlslcsData>) {
        let eligible = self.comparison_value(classifier, ComparisonMode::Exploitation)
            > self.config.subsumption_fitness_threshold
            && classifier.experience > self.config.subsumption_experience_threshold
            && classifier.timestamp > 0;
        classifier.set_subsumption_ability(eligible);
    }

    fn update_simple_or_complex(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        correct_sets: &[ClassifierSet<MlslcsData>],
        instance: &[f64],
        representation: &dyn Representation,
    ) {
        let beta = self.config.beta;
        for macroclassifier in match_set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            let mut min_current_ns = usize::MAX;

            for (label, correct_set) in correct_sets.iter().enumerate() {
                let ability = classifier.classify_label(instance, label, representation);
                let label_ns = correct_set.total_numerosity();
                let data = &mut classifier.data.aggregate;
                match ability {
                    LabelAbility::Abstain => {
                        data.tp += self.config.omega;
                        data.msa += self.config.phi;
                        if self.config.wildcards_participate_in_correct_sets {
                            min_current_ns = min_current_ns.min(label_ns);
                        }
                    }
                    LabelAbility::Positive => {
                        data.tp += 1.0;
                        min_current_ns = min_current_ns.min(label_ns);
                    }
                    LabelAbility::Negative => {}
                }
                if !ability.is_abstain() {
                    data.msa += 1.0;
                }
            }

            classifier.experience += 1;
            let data = &mut classifier.data.aggregate;
            if min_current_ns != usize::MAX {
                data.ns += beta * (min_current_ns as f64 - data.ns);
            }
            let target = data.accuracy().powf(self.config.n);
            match self.config.fitness_mode {
                FitnessMode::Complex => data.fitness += beta * (target - data.fitness),
                _ => data.fitness = target,
            }
            self.update_eligibility(&mut classifier);
        }
    }

    fn label_share(&self, stats: &LabelStats) -> f64 {
        if stats.tp > self.config.acc0 * stats.msa {
            1.0
        } else {
            self.config.alpha * (stats.accuracy() / self.config.acc0).powf(self.config.n)
        }
    }

    /// Fitness sharing for one label across the whole match set.
    fn share_fitness(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        correct_set: &ClassifierSet<MlslcsData>,
        label: usize,
        instance: &[f64],
        representation: &dyn Representation,
    ) {
        let label_ns = correct_set.total_numerosity();
        let mut relative_accuracy = 0.0;

        for macroclassifier in match_set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            let ability = classifier.classify_label(instance, label, representation);
            let data = &mut classifier.data;
            let stats = &mut data.labels[label];
            let aggregate = &mut data.aggregate;

            match ability {
                LabelAbility::Abstain => {
                    stats.tp += self.config.omega;
                    stats.msa += self.config.phi;
                    aggregate.tp += self.config.omega;
                    aggregate.msa += self.config.phi;
                    if self.config.wildcards_participate_in_correct_sets {
                        stats.min_current_ns = label_ns;
                        let k = self.label_share(stats);
                        stats.k = k;
                    } else {
                        stats.k = 0.0;
                    }
                }
                LabelAbility::Positive => {
                    stats.min_current_ns = label_ns;
                    stats.tp += 1.0;
                    aggregate.tp += 1.0;
                    let k = self.label_share(stats);
                    stats.k = k;
                }
                LabelAbility::Negative => stats.k = 0.0,
            }
            if !ability.is_abstain() {
                stats.msa += 1.0;
                aggregate.msa += 1.0;
            }
            relative_accuracy += macroclassifier.numerosity as f64 * stats.k;
        }

        if relative_accuracy == 0.0 {
            relative_accuracy = 1.0;
        }

        let beta = self.config.beta;
        for macroclassifier in match_set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            let stats = &mut classifier.data.labels[label];
            let share = macroclassifier.numerosity as f64 * stats.k / relative_accuracy;
            stats.fitness += beta * (share - stats.fitness);
        }
    }

    fn update_sharing(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        correct_sets: &[ClassifierSet<MlslcsData>],
        instance: &[f64],
        representation: &dyn Representation,
    ) {
        for (label, correct_set) in correct_sets.iter().enumerate() {
            self.share_fitness(match_set, correct_set, label, instance, representation);
        }

        let labels = self.number_of_labels as f64;
        for macroclassifier in match_set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            classifier.experience += 1;

            let data = &mut classifier.data;
            let fitness_sum: f64 = data.labels.iter().map(|s| s.fitness).sum();
            let mean_ns =
                data.labels.iter().map(|s| s.min_current_ns as f64).sum::<f64>() / labels;
            data.aggregate.fitness = fitness_sum / macroclassifier.numerosity as f64 / labels;
            data.aggregate.ns += self.config.beta * (mean_ns - data.aggregate.ns);

            let accurate = data.aggregate.accuracy().powf(self.config.n) > self.config.acc0;
            if !accurate {
                classifier.set_subsumption_ability(false);
            } else if classifier.experience >= self.config.subsumption_experience_threshold
                && classifier.timestamp > 0
            {
                classifier.set_subsumption_ability(true);
            }
        }
    }

    fn update_match_set(
        &self,
        match_set: &ClassifierSet<MlslcsData>,
        correct_sets: &[ClassifierSet<MlslcsData>],
        instance: &[f64],
        representation: &dyn Representation,
    ) {
        match self.config.fitness_mode {
            FitnessMode::Simple | FitnessMode::Complex => {
                self.update_simple_or_complex(match_set, correct_sets, instance, representation)
            }
            FitnessMode::Sharing => {
                self.update_sharing(match_set, correct_sets, instance, representation)
            }
        }
    }

    /// Among match-set rules tied at the lowest positive objective coverage,
    /// removes one copy of the least fit (the last one on equal fitness).
    fn control_population_in_match_set(
        &self,
        population: &mut ClassifierSet<MlslcsData>,
        match_set: &mut ClassifierSet<MlslcsData>,
        ctx: &mut LcsContext,
    ) {
        let mut lowest_coverage = f64::MAX;
        let mut lowest = Vec::new();
        for (index, macroclassifier) in match_set.iter().enumerate() {
            let coverage = macroclassifier.borrow().objective_coverage();
            if coverage > 0.0 && coverage <= lowest_coverage {
                if coverage < lowest_coverage {
                    lowest.clear();
                }
                lowest_coverage = coverage;
                lowest.push(index);
            }
        }
        if lowest.len() < 2 {
            return;
        }

        let mut lowest_fitness = f64::MAX;
        let mut to_delete = None;
        for &index in &lowest {
            let fitness = self.comparison_value(&match_set.classifier(index), ComparisonMode::PureFitness);
            if fitness <= lowest_fitness {
                lowest_fitness = fitness;
                to_delete = Some(index);
            }
        }

        if let Some(index) = to_delete {
            let serial = match_set.macroclassifier(index).serial();
            trace!("Match set control removes one copy of classifier {}", serial);
            population.delete_classifier_by_serial(serial);
            match_set.delete_classifier(index);
            ctx.deleted_in_match_sets += 1;
        }
    }

    /// Shared first half of both update modes.
    fn prepare(
        &self,
        population: &mut ClassifierSet<MlslcsData>,
        match_set: &mut ClassifierSet<MlslcsData>,
        instance_index: usize,
        ctx: &mut LcsContext,
    ) -> Vec<ClassifierSet<MlslcsData>> {
        if self.commenced_deletions.get() && self.config.match_set_population_control {
            self.control_population_in_match_set(population, match_set, ctx);
        }
        let representation = Arc::clone(&ctx.representation);
        let instances = Arc::clone(&ctx.instances);
        let instance = instances.row(instance_index);

        let correct_sets = self.correct_sets(match_set, instance, representation.as_ref(), ctx);
        self.update_match_set(match_set, &correct_sets, instance, representation.as_ref());
        correct_sets
    }
}

impl UpdateStrategy for MlslcsUpdate {
    type Data = MlslcsData;

    fn create_data(&self) -> MlslcsData {
        MlslcsData {
            aggregate: LabelStats::default(),
            labels: vec![LabelStats::default(); self.number_of_labels],
            d: 0.0,
        }
    }

    fn comparison_value(&self, classifier: &Classifier<MlslcsData>, mode: ComparisonMode) -> f64 {
        let data = &classifier.data.aggregate;
        match mode {
            ComparisonMode::Exploration => {
                if classifier.experience < self.config.theta_del {
                    0.0
                } else {
                    data.fitness
                }
            }
            ComparisonMode::Deletion => classifier.data.d,
            ComparisonMode::Exploitation | ComparisonMode::PureAccuracy => data.accuracy(),
            ComparisonMode::PureFitness => data.fitness,
            ComparisonMode::Accuracy => {
                if classifier.objective_coverage() < 0.0 {
                    2.0
                } else {
                    data.accuracy()
                }
            }
        }
    }

    fn set_comparison_value(&self, classifier: &mut Classifier<MlslcsData>, _mode: ComparisonMode, value: f64) {
        classifier.data.aggregate.fitness = value;
    }

    fn accuracy(&self, classifier: &Classifier<MlslcsData>) -> f64 {
        classifier.data.aggregate.accuracy()
    }

    fn niche_size(&self, classifier: &Classifier<MlslcsData>) -> f64 {
        classifier.data.aggregate.ns
    }

    fn data_summary(&self, classifier: &Classifier<MlslcsData>) -> String {
        let data = &classifier.data.aggregate;
        format!("tp:|{:.4}|msa:|{:.4}|ns:|{:.4}|", data.tp, data.msa, data.ns)
    }

    fn inherit_parent_parameters(
        &self,
        _parent_a: &Classifier<MlslcsData>,
        _parent_b: &Classifier<MlslcsData>,
        child: &mut Classifier<MlslcsData>,
    ) {
        child.data.aggregate.ns = 1.0;
        self.set_comparison_value(child, ComparisonMode::Exploration, 1.0);
    }

    fn compute_deletion_probabilities(&self, set: &ClassifierSet<MlslcsData>) {
        self.commenced_deletions.set(true);
        let mean_fitness = set.mean_comparison_value(ComparisonMode::Exploration, self);
        for macroclassifier in set.iter() {
            let mut classifier = macroclassifier.borrow_mut();
            let inputs = DeletionInputs {
                niche_size: classifier.data.aggregate.ns,
                fitness: classifier.data.aggregate.fitness,
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
        match_set: &mut ClassifierSet<MlslcsData>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()> {
        let correct_sets = self.prepare(population.set, match_set, instance_index, ctx);
        if !evolve {
            return Ok(());
        }

        for (label, correct_set) in correct_sets.iter().enumerate() {
            if correct_set.is_empty() {
                let covering = self.cover(instance_index, ctx);
                population.add_classifier(covering, false, self, ctx);
            } else {
                ga.evolve_set(correct_set, population, label, self, ctx)?;
                population.set.stats.total_ga_invocations = ga.timestamp();
            }
        }
        Ok(())
    }

    fn update_set_batched(
        &mut self,
        population: &mut ControlledPopulation<'_, Self>,
        match_set: &mut ClassifierSet<MlslcsData>,
        instance_index: usize,
        evolve: bool,
        ga: &mut dyn GeneticAlgorithm<Self>,
        ctx: &mut LcsContext,
    ) -> Result<()> {
        let correct_sets = self.prepare(population.set, match_set, instance_index, ctx);
        if !evolve {
            return Ok(());
        }

        let mut to_evolve = Vec::new();
        let mut to_cover = 0;
        for (label, correct_set) in correct_sets.iter().enumerate() {
            if correct_set.is_empty() {
                to_cover += 1;
                continue;
            }
            ga.increase_timestamp();
            let mean_age = ga.mean_age(correct_set);
            if ga.timestamp().saturating_sub(mean_age) >= ga.activation_age() {
                for macroclassifier in correct_set.iter() {
                    macroclassifier.borrow_mut().timestamp = ga.timestamp();
                }
                to_evolve.push(label);
            }
        }

        let mut indices_to_subsume = Vec::new();
        let mut new_classifiers = ClassifierSet::new();
        for label in to_evolve {
            let offspring = ga.evolve_set_batched(&correct_sets[label], population.set, label, self, ctx)?;
            indices_to_subsume.extend(offspring.indices_to_subsume);
            new_classifiers.merge_without_control(offspring.new_classifiers);
        }
        for _ in 0..to_cover {
            new_classifiers.push(self.cover(instance_index, ctx));
        }

        population.set.stats.total_ga_invocations = ga.timestamp();
        for index in indices_to_subsume {
            population.set.absorb_offspring(index);
        }
        population.set.merge_without_control(new_classifiers);
        population.control(self, ctx);
        Ok(())
    }
}
