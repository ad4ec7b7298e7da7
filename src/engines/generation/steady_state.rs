use super::operators::{build_crossover, CrossoverOperator, MutationOperator, UniformBitMutation};
use crate::config::EvolutionConfig;
use crate::data::bitset::Chromosome;
use crate::data::representation::Representation;
use crate::engines::context::LcsContext;
use crate::engines::control::ControlledPopulation;
use crate::engines::population::{Classifier, ClassifierSet, Macroclassifier};
use crate::engines::selection::Selector;
use crate::engines::update::UpdateStrategy;
use crate::error::Result;
use crate::types::{ClassifierOrigin, ComparisonMode};
use log::trace;
use rand::Rng;
use rayon::prelude::*;

const CHILDREN_PER_GENERATION: usize = 2;

/// Offspring of one batched GA run, applied to the population by the caller.
pub struct BatchedOffspring<D> {
    /// Population indices that absorb one offspring each.
    pub indices_to_subsume: Vec<usize>,
    pub new_classifiers: ClassifierSet<D>,
}

/// Counters of the last immediate-mode `evolve_set` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GaRunStats {
    pub evolution_conducted: bool,
    pub subsumptions: usize,
    pub new_classifiers: usize,
    pub deletions: usize,
}

pub trait GeneticAlgorithm<U: UpdateStrategy> {
    /// Runs the GA on `evolve_set` if its mean age allows it, inserting every
    /// viable child into the controlled population right away.
    fn evolve_set(
        &mut self,
        evolve_set: &ClassifierSet<U::Data>,
        population: &mut ControlledPopulation<'_, U>,
        label: usize,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Result<()>;

    /// Produces offspring without touching the population. The activation
    /// check is left to the caller.
    fn evolve_set_batched(
        &mut self,
        evolve_set: &ClassifierSet<U::Data>,
        population: &ClassifierSet<U::Data>,
        label: usize,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Result<BatchedOffspring<U::Data>>;

    fn timestamp(&self) -> u64;

    fn increase_timestamp(&mut self);

    fn activation_age(&self) -> u64;

    /// Numerosity-weighted mean of the members' timestamps, 0 for an empty set.
    fn mean_age(&self, set: &ClassifierSet<U::Data>) -> u64 {
        let total = set.total_numerosity() as u64;
        if total == 0 {
            return 0;
        }
        let weighted: u64 = set
            .iter()
            .map(|m| m.numerosity as u64 * m.borrow().timestamp)
            .sum();
        weighted / total
    }
}

/// What parent subsumption needs to know about a parent, copied out so no
/// borrow is held while the population changes.
struct ParentView {
    index: usize,
    serial: u64,
    chromosome: Chromosome,
    can_subsume: bool,
    fitness: f64,
    experience: u32,
}

impl ParentView {
    fn capture<U: UpdateStrategy>(set: &ClassifierSet<U::Data>, index: usize, strategy: &U) -> Self {
        let classifier = set.classifier(index);
        Self {
            index,
            serial: classifier.serial(),
            chromosome: classifier.chromosome().clone(),
            can_subsume: classifier.can_subsume(),
            fitness: strategy.comparison_value(&classifier, ComparisonMode::Exploration),
            experience: classifier.experience,
        }
    }

    fn can_absorb(&self, child: &Chromosome, representation: &dyn Representation) -> bool {
        (self.can_subsume && representation.is_more_general(&self.chromosome, child))
            || representation.are_equal(&self.chromosome, child)
    }
}

/// Population index of the parent that absorbs `child`, if any.
fn parent_subsumer<D>(
    population: &ClassifierSet<D>,
    a: &ParentView,
    b: &ParentView,
    child: &Chromosome,
    representation: &dyn Representation,
) -> Option<usize> {
    let index_a = population.index_of_serial(a.serial);
    let index_b = population.index_of_serial(b.serial);

    match (index_a, index_b) {
        (Some(ia), Some(ib)) if ia == ib => a.can_absorb(child, representation).then_some(ia),
        (Some(ia), Some(ib)) => {
            match (a.can_absorb(child, representation), b.can_absorb(child, representation)) {
                (true, true) => {
                    let a_wins = if a.fitness == b.fitness {
                        a.experience > b.experience
                    } else {
                        a.fitness > b.fitness
                    };
                    Some(if a_wins { ia } else { ib })
                }
                (true, false) => Some(ia),
                (false, true) => Some(ib),
                (false, false) => None,
            }
        }
        (Some(ia), None) => a.can_absorb(child, representation).then_some(ia),
        (None, Some(ib)) => b.can_absorb(child, representation).then_some(ib),
        (None, None) => None,
    }
}

/// Steady-state GA: two parents, two children per run.
pub struct SteadyStateGa<U: UpdateStrategy> {
    selector: Box<dyn Selector<U>>,
    crossover: Box<dyn CrossoverOperator>,
    mutation: Box<dyn MutationOperator>,
    crossover_rate: f64,
    activation_age: u64,
    decide_crossover_at_once: bool,
    thorough_check: bool,
    timestamp: u64,
    last_run: GaRunStats,
}

impl<U: UpdateStrategy> SteadyStateGa<U> {
    pub fn new(config: &EvolutionConfig, selector: Box<dyn Selector<U>>) -> Self {
        Self {
            selector,
            crossover: build_crossover(config.crossover_operator),
            mutation: Box::new(UniformBitMutation::new(config.mutation_rate)),
            crossover_rate: config.crossover_rate,
            activation_age: config.activation_age,
            decide_crossover_at_once: config.decide_crossover_at_once,
            thorough_check: config.thoroughly_check_with_population,
            timestamp: 0,
            last_run: GaRunStats::default(),
        }
    }

    pub fn with_operators(
        config: &EvolutionConfig,
        selector: Box<dyn Selector<U>>,
        crossover: Box<dyn CrossoverOperator>,
        mutation: Box<dyn MutationOperator>,
    ) -> Self {
        Self {
            crossover,
            mutation,
            ..Self::new(config, selector)
        }
    }

    pub fn last_run(&self) -> GaRunStats {
        self.last_run
    }

    fn select_parents(
        &self,
        evolve_set: &ClassifierSet<U::Data>,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Option<(ParentView, ParentView)> {
        let a = self.selector.select_one(evolve_set, strategy, &mut ctx.rng)?;
        let b = self.selector.select_one(evolve_set, strategy, &mut ctx.rng)?;
        Some((
            ParentView::capture(evolve_set, a, strategy),
            ParentView::capture(evolve_set, b, strategy),
        ))
    }

    /// Cut point per child, `None` where the child is a copy of its parent.
    fn crossover_points(
        &self,
        a: &ParentView,
        b: &ParentView,
        ctx: &mut LcsContext,
    ) -> [Option<usize>; CHILDREN_PER_GENERATION] {
        let mut points = [None; CHILDREN_PER_GENERATION];
        let span = self.crossover.span(ctx.representation.as_ref());
        if span == 0 {
            return points;
        }
        let distinct = !ctx.representation.are_equal(&a.chromosome, &b.chromosome);

        if self.decide_crossover_at_once {
            if ctx.rng.gen::<f64>() < self.crossover_rate && distinct {
                for point in points.iter_mut() {
                    *point = Some(ctx.rng.gen_range(0..span));
                }
            }
        } else {
            for point in points.iter_mut() {
                if ctx.rng.gen::<f64>() < self.crossover_rate && distinct {
                    *point = Some(ctx.rng.gen_range(0..span));
                }
            }
        }
        points
    }

    /// Builds both children; those matching no training instance are dropped.
    fn breed(
        &self,
        evolve_set: &ClassifierSet<U::Data>,
        a: &ParentView,
        b: &ParentView,
        label: usize,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Result<Vec<Classifier<U::Data>>> {
        let points = self.crossover_points(a, b, ctx);
        let mut children = Vec::with_capacity(CHILDREN_PER_GENERATION);

        for (i, point) in points.iter().enumerate() {
            let (first, second) = if i == 0 { (b, a) } else { (a, b) };
            let (mut chromosome, inherited_fitness) = match point {
                Some(position) => (
                    self.crossover.cross(
                        &first.chromosome,
                        &second.chromosome,
                        label,
                        *position,
                        ctx.representation.as_ref(),
                    )?,
                    None,
                ),
                None => {
                    let parent = if i == 0 { a } else { b };
                    (parent.chromosome.clone(), Some(parent.fitness))
                }
            };
            self.mutation.mutate(&mut chromosome, &mut ctx.rng);

            let representation = ctx.representation.as_ref();
            let viable = ctx
                .instances
                .rows()
                .par_iter()
                .any(|row| representation.is_match(row, &chromosome));
            if !viable {
                trace!("Dropping child {} that matches no instance", i);
                continue;
            }

            representation.fix_chromosome(&mut chromosome);
            let mut child = Classifier::new(
                ctx.serials.next_serial(),
                chromosome,
                strategy.create_data(),
                ClassifierOrigin::Ga,
            );
            if let Some(fitness) = inherited_fitness {
                strategy.set_comparison_value(&mut child, ComparisonMode::Exploration, fitness);
            }
            {
                let parent_a = evolve_set.classifier(a.index);
                let parent_b = evolve_set.classifier(b.index);
                strategy.inherit_parent_parameters(&parent_a, &parent_b, &mut child);
            }
            child.created = ctx.total_repetition;
            child.cumulative_instance_created = ctx.cumulative_instance_index;
            children.push(child);
        }
        Ok(children)
    }
}

impl<U: UpdateStrategy> GeneticAlgorithm<U> for SteadyStateGa<U> {
    fn evolve_set(
        &mut self,
        evolve_set: &ClassifierSet<U::Data>,
        population: &mut ControlledPopulation<'_, U>,
        label: usize,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Result<()> {
        self.timestamp += 1;
        self.last_run = GaRunStats::default();

        let mean_age = self.mean_age(evolve_set);
        if self.timestamp.saturating_sub(mean_age) < self.activation_age {
            return Ok(());
        }
        self.last_run.evolution_conducted = true;
        for macroclassifier in evolve_set.iter() {
            macroclassifier.borrow_mut().timestamp = self.timestamp;
        }

        let Some((a, b)) = self.select_parents(evolve_set, strategy, ctx) else {
            return Ok(());
        };
        let children = self.breed(evolve_set, &a, &b, label, strategy, ctx)?;

        for child in children {
            let subsumer = parent_subsumer(
                population.set,
                &a,
                &b,
                child.chromosome(),
                ctx.representation.as_ref(),
            );
            match subsumer {
                Some(index) => {
                    trace!("Parent at {} absorbs child {}", index, child.serial());
                    population.set.absorb_offspring(index);
                    population.control(strategy, ctx);
                    self.last_run.subsumptions += 1;
                }
                None => {
                    let offspring = Macroclassifier::new(child, 1);
                    if population.add_classifier(offspring, self.thorough_check, strategy, ctx) {
                        self.last_run.subsumptions += 1;
                    } else {
                        self.last_run.new_classifiers += 1;
                    }
                }
            }
            self.last_run.deletions += population.deletions_conducted();
        }
        Ok(())
    }

    fn evolve_set_batched(
        &mut self,
        evolve_set: &ClassifierSet<U::Data>,
        population: &ClassifierSet<U::Data>,
        label: usize,
        strategy: &U,
        ctx: &mut LcsContext,
    ) -> Result<BatchedOffspring<U::Data>> {
        let mut offspring = BatchedOffspring {
            indices_to_subsume: Vec::new(),
            new_classifiers: ClassifierSet::new(),
        };
        let Some((a, b)) = self.select_parents(evolve_set, strategy, ctx) else {
            return Ok(offspring);
        };

        for child in self.breed(evolve_set, &a, &b, label, strategy, ctx)? {
            let representation = ctx.representation.as_ref();
            if let Some(index) = parent_subsumer(population, &a, &b, child.chromosome(), representation) {
                offspring.indices_to_subsume.push(index);
                continue;
            }
            let child = Macroclassifier::new(child, 1);
            match population.let_population_subsume(&child, self.thorough_check, strategy, representation) {
                Some(index) => offspring.indices_to_subsume.push(index),
                None => offspring.new_classifiers.push(child),
            }
        }
        Ok(offspring)
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn increase_timestamp(&mut self) {
        self.timestamp += 1;
    }

    fn activation_age(&self) -> u64 {
        self.activation_age
    }
}
