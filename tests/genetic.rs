use mlslcs::config::{EvolutionConfig, RepresentationConfig, UpdateConfig};
use mlslcs::data::{AttributeRepresentation, Chromosome, InstanceMatrix, Representation};
use mlslcs::engines::control::{ControlledPopulation, FixedSizeWorstFitnessDeletion};
use mlslcs::engines::generation::{
    CrossoverOperator, GeneticAlgorithm, SinglePointCrossover, SteadyStateGa, UniformBitMutation,
};
use mlslcs::engines::population::{Classifier, ClassifierSet, Macroclassifier};
use mlslcs::engines::selection::{RouletteWheelSelector, Selector};
use mlslcs::engines::update::{MlslcsData, MlslcsUpdate, UpdateStrategy};
use mlslcs::engines::LcsContext;
use mlslcs::error::Result;
use mlslcs::types::{ClassifierOrigin, ComparisonMode};
use rand::RngCore;
use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Picks indices 0, 1, 2, ... in turn, so the two parents always differ.
struct InOrder {
    next: Cell<usize>,
}

impl Selector<MlslcsUpdate> for InOrder {
    fn select(
        &self,
        how_many: usize,
        set: &ClassifierSet<MlslcsData>,
        _strategy: &MlslcsUpdate,
        _rng: &mut dyn RngCore,
    ) -> Vec<usize> {
        (0..how_many)
            .map(|_| {
                let index = self.next.get();
                self.next.set(index + 1);
                index % set.len()
            })
            .collect()
    }
}

/// Single-point crossover that counts its invocations.
struct CountingCrossover {
    calls: Arc<AtomicUsize>,
}

impl CrossoverOperator for CountingCrossover {
    fn span(&self, representation: &dyn Representation) -> usize {
        SinglePointCrossover.span(representation)
    }

    fn cross(
        &self,
        a: &Chromosome,
        b: &Chromosome,
        label: usize,
        position: usize,
        representation: &dyn Representation,
    ) -> Result<Chromosome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SinglePointCrossover.cross(a, b, label, position, representation)
    }
}

struct Fixture {
    strategy: MlslcsUpdate,
    population: ClassifierSet<MlslcsData>,
    ctx: LcsContext,
}

// one boolean attribute, two labels; parents differ only in label values
fn fixture() -> Fixture {
    let repr = AttributeRepresentation::boolean(1, 2, &RepresentationConfig::default()).unwrap();
    let instances = InstanceMatrix::new(vec![vec![1.0, 1.0, 0.0]], 2).unwrap();
    let strategy = MlslcsUpdate::new(UpdateConfig::default(), 2).unwrap();
    let mut population = ClassifierSet::new();
    for (serial, bits) in [(0u64, "001111"), (1, "001010")] {
        let chromosome = Chromosome::from_bit_str(bits).unwrap();
        population.push(Macroclassifier::new(
            Classifier::new(serial, chromosome, strategy.create_data(), ClassifierOrigin::Cover),
            1,
        ));
    }
    let mut ctx = LcsContext::new(Arc::new(repr), Arc::new(instances), Some(11));
    ctx.serials.next_serial();
    ctx.serials.next_serial();
    Fixture {
        strategy,
        population,
        ctx,
    }
}

fn ga(crossover_rate: f64, activation_age: u64, calls: &Arc<AtomicUsize>) -> SteadyStateGa<MlslcsUpdate> {
    let config = EvolutionConfig {
        crossover_rate,
        mutation_rate: 0.0,
        activation_age,
        ..EvolutionConfig::default()
    };
    SteadyStateGa::with_operators(
        &config,
        Box::new(InOrder { next: Cell::new(0) }),
        Box::new(CountingCrossover {
            calls: Arc::clone(calls),
        }),
        Box::new(UniformBitMutation::new(0.0)),
    )
}

fn control() -> FixedSizeWorstFitnessDeletion<MlslcsUpdate> {
    let selector = Box::new(RouletteWheelSelector::new(ComparisonMode::Deletion, true));
    FixedSizeWorstFitnessDeletion::new(100, selector).unwrap()
}

#[test]
fn test_full_crossover_rate_always_crosses() {
    let Fixture {
        strategy,
        mut population,
        mut ctx,
    } = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ga = ga(1.0, 0, &calls);
    let mut control = control();
    let evolve_set = population.clone();

    let mut controlled = ControlledPopulation::new(&mut population, &mut control);
    ga.evolve_set(&evolve_set, &mut controlled, 0, &strategy, &mut ctx).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(ga.last_run().evolution_conducted);
    assert_eq!(population.total_numerosity(), 4);
    assert_eq!(population.total_numerosity(), population.recount_numerosity());
}

#[test]
fn test_zero_crossover_rate_clones_parents() {
    let Fixture {
        strategy,
        mut population,
        mut ctx,
    } = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ga = ga(0.0, 0, &calls);
    let mut control = control();
    let evolve_set = population.clone();

    let mut controlled = ControlledPopulation::new(&mut population, &mut control);
    ga.evolve_set(&evolve_set, &mut controlled, 0, &strategy, &mut ctx).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    // each clone equals its parent, which absorbs it
    assert_eq!(ga.last_run().subsumptions, 2);
    assert_eq!(population.len(), 2);
    assert_eq!(population.numerosity(0), 2);
    assert_eq!(population.numerosity(1), 2);
    assert_eq!(population.macroclassifier(0).subsumptions, 1);
}

#[test]
fn test_young_set_is_not_evolved() {
    let Fixture {
        strategy,
        mut population,
        mut ctx,
    } = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ga = ga(1.0, 5, &calls);
    let mut control = control();
    let evolve_set = population.clone();

    let mut controlled = ControlledPopulation::new(&mut population, &mut control);
    ga.evolve_set(&evolve_set, &mut controlled, 0, &strategy, &mut ctx).unwrap();

    assert_eq!(ga.timestamp(), 1);
    assert!(!ga.last_run().evolution_conducted);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(population.total_numerosity(), 2);
    // members keep their old timestamp
    assert_eq!(population.classifier(0).timestamp, 0);
}

#[test]
fn test_mean_age_weights_by_numerosity() {
    let Fixture { population, .. } = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let ga = ga(1.0, 0, &calls);
    population.macroclassifier(0).borrow_mut().timestamp = 10;
    population.macroclassifier(1).borrow_mut().timestamp = 4;
    assert_eq!(ga.mean_age(&population), 7);
    assert_eq!(ga.mean_age(&ClassifierSet::new()), 0);
}

#[test]
fn test_batched_run_leaves_population_untouched() {
    let Fixture {
        strategy,
        population,
        mut ctx,
    } = fixture();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut ga = ga(0.0, 0, &calls);

    let offspring = ga
        .evolve_set_batched(&population, &population, 0, &strategy, &mut ctx)
        .unwrap();

    assert_eq!(offspring.indices_to_subsume, vec![0, 1]);
    assert!(offspring.new_classifiers.is_empty());
    assert_eq!(population.total_numerosity(), 2);
    assert_eq!(population.numerosity(0), 1);
}
