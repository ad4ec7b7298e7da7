use mlslcs::config::{RepresentationConfig, UpdateConfig};
use mlslcs::data::{AttributeRepresentation, Chromosome, InstanceMatrix, Representation};
use mlslcs::engines::control::{ControlledPopulation, FixedSizeWorstFitnessDeletion, PopulationControl};
use mlslcs::engines::population::{Classifier, ClassifierSet, Macroclassifier, PopulationSnapshot, SerialSequence};
use mlslcs::engines::selection::RouletteWheelSelector;
use mlslcs::engines::update::{MlslcsData, MlslcsUpdate, UpdateStrategy};
use mlslcs::engines::LcsContext;
use mlslcs::types::{ClassifierOrigin, ComparisonMode};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

// two boolean attributes, one label: [a0 spec, a0, a1 spec, a1, l0 spec, l0]
fn representation() -> AttributeRepresentation {
    AttributeRepresentation::boolean(2, 1, &RepresentationConfig::default()).unwrap()
}

fn strategy() -> MlslcsUpdate {
    MlslcsUpdate::new(UpdateConfig::default(), 1).unwrap()
}

fn rule(strategy: &MlslcsUpdate, serial: u64, bits: &str, numerosity: usize) -> Macroclassifier<MlslcsData> {
    let chromosome = Chromosome::from_bit_str(bits).unwrap();
    Macroclassifier::new(
        Classifier::new(serial, chromosome, strategy.create_data(), ClassifierOrigin::Cover),
        numerosity,
    )
}

fn six_bits(value: usize) -> String {
    (0..6).map(|i| if value >> i & 1 == 1 { '1' } else { '0' }).collect()
}

#[test]
fn test_thorough_insertion_merges_identical_chromosomes() {
    let repr = representation();
    let strategy = strategy();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110111", 2));
    set.push(rule(&strategy, 1, "011111", 1));

    let absorbed = set.add_classifier(rule(&strategy, 2, "110111", 3), true, &strategy, &repr);

    assert!(absorbed);
    assert_eq!(set.len(), 2);
    assert_eq!(set.numerosity(0), 5);
    assert_eq!(set.macroclassifier(0).subsumptions, 1);
    assert_eq!(set.total_numerosity(), 6);
}

#[test]
fn test_plain_insertion_appends() {
    let repr = representation();
    let strategy = strategy();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110111", 1));

    let absorbed = set.add_classifier(rule(&strategy, 1, "110111", 1), false, &strategy, &repr);

    assert!(!absorbed);
    assert_eq!(set.len(), 2);
    assert_eq!(set.total_numerosity(), 2);
}

#[test]
fn test_equal_candidates_tie_broken_by_experience() {
    let repr = representation();
    let strategy = strategy();

    // same value, later candidate has at least the experience: later wins
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110111", 1));
    set.push(rule(&strategy, 1, "110111", 1));
    set.macroclassifier(0).borrow_mut().experience = 5;
    set.macroclassifier(1).borrow_mut().experience = 5;
    set.add_classifier(rule(&strategy, 2, "110111", 1), true, &strategy, &repr);
    assert_eq!(set.numerosity(0), 1);
    assert_eq!(set.numerosity(1), 2);

    // earlier candidate more experienced: it keeps the offspring
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110111", 1));
    set.push(rule(&strategy, 1, "110111", 1));
    set.macroclassifier(0).borrow_mut().experience = 7;
    set.macroclassifier(1).borrow_mut().experience = 5;
    set.add_classifier(rule(&strategy, 2, "110111", 1), true, &strategy, &repr);
    assert_eq!(set.numerosity(0), 2);
    assert_eq!(set.numerosity(1), 1);
}

#[test]
fn test_zero_coverage_rule_removed_after_full_check() {
    let repr = representation();
    let strategy = strategy();
    // both instances have a0 = 0
    let instances = InstanceMatrix::new(vec![vec![0.0, 1.0, 1.0], vec![0.0, 0.0, 0.0]], 1).unwrap();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110000", 1)); // needs a0 = 1
    set.push(rule(&strategy, 1, "000000", 1)); // matches everything

    let first = set.generate_match_set(0, &repr, &instances);
    assert_eq!(first.len(), 1);
    assert_eq!(set.len(), 2);
    assert_eq!(set.stats.zero_coverage_deletions, 0);

    let second = set.generate_match_set(1, &repr, &instances);
    assert_eq!(second.len(), 1);
    assert_eq!(set.len(), 1);
    assert_eq!(set.macroclassifier(0).serial(), 1);
    assert_eq!(set.stats.zero_coverage_deletions, 1);
    assert_eq!(set.classifier(0).objective_coverage(), 1.0);
}

#[test]
fn test_match_set_generation_is_idempotent() {
    let repr = representation();
    let strategy = strategy();
    let instances = InstanceMatrix::new(vec![vec![1.0, 0.0, 1.0], vec![0.0, 0.0, 0.0]], 1).unwrap();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110000", 1));
    set.push(rule(&strategy, 1, "001100", 1));
    set.push(rule(&strategy, 2, "000000", 2));

    let serials = |s: &ClassifierSet<MlslcsData>| s.iter().map(|m| m.serial()).collect::<Vec<_>>();
    let first = set.generate_match_set(0, &repr, &instances);
    let second = set.generate_match_set(0, &repr, &instances);
    assert_eq!(serials(&first), vec![0, 2]);
    assert_eq!(serials(&first), serials(&second));
    assert_eq!(second.total_numerosity(), 3);
    assert_eq!(set.classifier(0).checked(), 1);
}

#[test]
fn test_fixed_size_control_deletes_down_to_cap() {
    let strategy = strategy();
    let mut set = ClassifierSet::new();
    for i in 0..12 {
        set.push(rule(&strategy, i as u64, &six_bits(i), 1));
    }
    let selector = Box::new(RouletteWheelSelector::new(ComparisonMode::Deletion, true));
    let mut control = FixedSizeWorstFitnessDeletion::<MlslcsUpdate>::new(10, selector).unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    control.control_population(&mut set, &strategy, &mut rng);

    assert_eq!(set.total_numerosity(), 10);
    assert_eq!(set.len(), 10);
    assert_eq!(control.deletions_conducted(), 2);
    assert_eq!(set.stats.covered_deleted, 2);
    assert!(strategy.commenced_deletions());
}

#[test]
fn test_fixed_size_control_applied_on_every_insertion() {
    let strategy = strategy();
    let instances = InstanceMatrix::new(vec![vec![1.0, 1.0, 1.0]], 1).unwrap();
    let mut ctx = LcsContext::new(Arc::new(representation()), Arc::new(instances), Some(8));
    let mut set = ClassifierSet::new();
    let selector = Box::new(RouletteWheelSelector::new(ComparisonMode::Deletion, true));
    let mut control = FixedSizeWorstFitnessDeletion::<MlslcsUpdate>::new(10, selector).unwrap();
    let mut deletions = 0;

    let mut population = ControlledPopulation::new(&mut set, &mut control);
    for i in 0..12 {
        population.add_classifier(rule(&strategy, i as u64, &six_bits(i), 1), false, &strategy, &mut ctx);
        deletions += population.deletions_conducted();
        assert!(population.set.total_numerosity() <= 10);
    }

    assert_eq!(deletions, 2);
    assert_eq!(set.total_numerosity(), 10);
    assert_eq!(set.stats.covered_deleted, 2);
    assert_eq!(set.stats.gaed_deleted, 0);
}

/// Rules given as (fitness, numerosity, experience).
fn scored(strategy: &MlslcsUpdate, rules: &[(f64, usize, u32)]) -> ClassifierSet<MlslcsData> {
    let mut set = ClassifierSet::new();
    for (i, &(fitness, numerosity, experience)) in rules.iter().enumerate() {
        let macroclassifier = rule(strategy, i as u64, &six_bits(i), numerosity);
        {
            let mut classifier = macroclassifier.borrow_mut();
            classifier.data.aggregate.fitness = fitness;
            classifier.experience = experience;
        }
        set.push(macroclassifier);
    }
    set
}

#[test]
fn test_fitness_threshold_deletes_unfit_and_inexperienced_rules() {
    let strategy = strategy();
    // the last rule is fit but too young to show it
    let mut set = scored(&strategy, &[(0.3, 2, 25), (0.8, 1, 25), (0.9, 3, 4)]);

    let removed = set.delete_classifiers_below_fitness_threshold(0.5, &strategy);

    assert_eq!(removed, 2);
    assert_eq!(set.len(), 1);
    assert_eq!(set.macroclassifier(0).serial(), 1);
    assert_eq!(set.total_numerosity(), 1);
}

#[test]
fn test_numerosity_threshold_spares_fit_rules() {
    let strategy = strategy();
    let mut set = scored(&strategy, &[(0.95, 1, 25), (0.5, 1, 25), (0.1, 3, 25)]);

    let removed = set.delete_classifiers_below_numerosity_threshold(2, &strategy);

    assert_eq!(removed, 1);
    let serials: Vec<u64> = set.iter().map(|m| m.serial()).collect();
    assert_eq!(serials, vec![0, 2]);
    assert_eq!(set.total_numerosity(), 4);
    assert_eq!(set.total_numerosity(), set.recount_numerosity());
}

#[test]
fn test_sort_by_macro_fitness_weights_numerosity() {
    let strategy = strategy();
    let mut set = scored(&strategy, &[(0.2, 4, 0), (0.9, 1, 0), (0.5, 1, 0)]);

    set.sort_by_macro_fitness(ComparisonMode::PureFitness, &strategy);

    let serials: Vec<u64> = set.iter().map(|m| m.serial()).collect();
    assert_eq!(serials, vec![1, 0, 2]);
}

#[test]
fn test_zero_cap_is_rejected() {
    let selector = Box::new(RouletteWheelSelector::new(ComparisonMode::Deletion, true));
    assert!(FixedSizeWorstFitnessDeletion::<MlslcsUpdate>::new(0, selector).is_err());
}

#[test]
fn test_snapshot_round_trip() {
    let strategy = strategy();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 3, "110111", 2));
    set.push(rule(&strategy, 7, "011101", 1));
    set.macroclassifier(1).borrow_mut().experience = 12;

    let json = PopulationSnapshot::new(set.clone(), SerialSequence::after(7)).to_json().unwrap();
    let restored = PopulationSnapshot::<MlslcsData>::from_json(&json).unwrap();

    assert_eq!(restored.serials.peek(), 8);
    let population = restored.population;
    assert_eq!(population.total_numerosity(), 3);
    assert_eq!(population.len(), 2);
    for (before, after) in set.iter().zip(population.iter()) {
        assert_eq!(before.serial(), after.serial());
        assert_eq!(before.numerosity, after.numerosity);
        assert_eq!(before.borrow().chromosome(), after.borrow().chromosome());
    }
    assert_eq!(population.classifier(1).experience, 12);
    assert_eq!(population.classifier(1).data, set.classifier(1).data);
}

#[test]
fn test_whole_population_sweep_folds_duplicates() {
    let repr = representation();
    let strategy = strategy();
    let mut set = ClassifierSet::new();
    set.push(rule(&strategy, 0, "110111", 1));
    set.push(rule(&strategy, 1, "011111", 2));
    set.push(rule(&strategy, 2, "110111", 3));

    set.check_whole_population_for_possible_subsumptions(&strategy, &repr);

    assert_eq!(set.len(), 2);
    assert_eq!(set.total_numerosity(), 6);
    assert_eq!(set.macroclassifier(1).serial(), 2);
    assert_eq!(set.numerosity(1), 4);
}

#[derive(Debug, Clone)]
enum Op {
    Add { pattern: usize, numerosity: usize, thorough: bool },
    Delete { index: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8, 1usize..4, any::<bool>()).prop_map(|(pattern, numerosity, thorough)| Op::Add {
            pattern,
            numerosity,
            thorough
        }),
        (0usize..16).prop_map(|index| Op::Delete { index }),
    ]
}

proptest! {
    #[test]
    fn prop_total_numerosity_matches_sum(ops in prop::collection::vec(op(), 1..60)) {
        let repr = representation();
        let strategy = strategy();
        let mut set = ClassifierSet::new();
        let mut serial = 0;

        for op in ops {
            match op {
                Op::Add { pattern, numerosity, thorough } => {
                    set.add_classifier(rule(&strategy, serial, &six_bits(pattern), numerosity), thorough, &strategy, &repr);
                    serial += 1;
                }
                Op::Delete { index } => {
                    if !set.is_empty() {
                        set.delete_classifier(index % set.len());
                    }
                }
            }
            prop_assert_eq!(set.total_numerosity(), set.recount_numerosity());
            prop_assert!(set.iter().all(|m| m.numerosity >= 1));
        }
    }

    #[test]
    fn prop_fixed_size_control_respects_cap(cap in 1usize..12, extra in 0usize..12) {
        let strategy = strategy();
        let mut set = ClassifierSet::new();
        for i in 0..cap + extra {
            set.push(rule(&strategy, i as u64, &six_bits(i % 64), 1));
        }
        let selector = Box::new(RouletteWheelSelector::new(ComparisonMode::Deletion, true));
        let mut control = FixedSizeWorstFitnessDeletion::<MlslcsUpdate>::new(cap, selector).unwrap();
        let mut rng = StdRng::seed_from_u64(cap as u64);
        control.control_population(&mut set, &strategy, &mut rng);
        prop_assert!(set.total_numerosity() <= cap);
        prop_assert_eq!(control.deletions_conducted(), extra);
    }
}

#[test]
fn test_representation_reports_layout() {
    let repr = representation();
    assert_eq!(repr.chromosome_size(), 6);
    assert_eq!(repr.label_gene(0), 4..6);
}
