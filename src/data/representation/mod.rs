//! How rule conditions and label decisions are laid out in a chromosome.

pub mod attribute;

pub use attribute::{AttributeRepresentation, AttributeSpec};

use crate::data::bitset::Chromosome;
use crate::types::LabelAbility;
use rand::RngCore;
use std::ops::Range;

/// Encoding contract the rule engine relies on.
///
/// A chromosome is a condition part (`0..condition_size()`) followed by one
/// gene per label. Implementations must keep the layout fixed for their lifetime.
pub trait Representation: Send + Sync {
    fn chromosome_size(&self) -> usize;

    /// Attribute columns an instance row starts with.
    fn number_of_attributes(&self) -> usize;

    fn number_of_labels(&self) -> usize;

    /// Bits used by the rule condition.
    fn condition_size(&self) -> usize;

    /// Bit range of the gene deciding `label`.
    fn label_gene(&self, label: usize) -> Range<usize>;

    fn is_match(&self, instance: &[f64], chromosome: &Chromosome) -> bool;

    /// Whether `base` matches everything `test` matches and advocates the same labels.
    fn is_more_general(&self, base: &Chromosome, test: &Chromosome) -> bool;

    fn are_equal(&self, a: &Chromosome, b: &Chromosome) -> bool;

    /// Restores encoding invariants broken by crossover or mutation.
    fn fix_chromosome(&self, chromosome: &mut Chromosome);

    fn classify_ability_label(
        &self,
        chromosome: &Chromosome,
        instance: &[f64],
        label: usize,
    ) -> LabelAbility;

    /// Positive only when every label is advocated correctly.
    fn classify_ability_all(&self, chromosome: &Chromosome, instance: &[f64]) -> LabelAbility {
        let mut all_positive = true;
        for label in 0..self.number_of_labels() {
            match self.classify_ability_label(chromosome, instance, label) {
                LabelAbility::Negative => return LabelAbility::Negative,
                LabelAbility::Abstain => all_positive = false,
                LabelAbility::Positive => {}
            }
        }
        if all_positive {
            LabelAbility::Positive
        } else {
            LabelAbility::Abstain
        }
    }

    /// Random chromosome guaranteed to match `instance` and advocate its labels.
    fn create_covering_chromosome(&self, instance: &[f64], rng: &mut dyn RngCore) -> Chromosome;

    /// Label value advocated by the rule, `None` for a wildcard.
    fn label_decision(&self, chromosome: &Chromosome, label: usize) -> Option<bool>;

    fn describe(&self, chromosome: &Chromosome) -> String;
}
