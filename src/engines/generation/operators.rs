use crate::config::CrossoverKind;
use crate::data::bitset::Chromosome;
use crate::data::representation::Representation;
use crate::error::{LcsError, Result};
use rand::{Rng, RngCore};

/// Recombines two parent chromosomes at a cut point.
pub trait CrossoverOperator: Send + Sync {
    /// Number of valid cut points, `0..span`.
    fn span(&self, representation: &dyn Representation) -> usize;

    fn cross(
        &self,
        a: &Chromosome,
        b: &Chromosome,
        label: usize,
        position: usize,
        representation: &dyn Representation,
    ) -> Result<Chromosome>;
}

/// Child takes `a` up to `position` and `b` from there on.
pub struct SinglePointCrossover;

impl CrossoverOperator for SinglePointCrossover {
    fn span(&self, representation: &dyn Representation) -> usize {
        representation.chromosome_size()
    }

    fn cross(
        &self,
        a: &Chromosome,
        b: &Chromosome,
        _label: usize,
        position: usize,
        _representation: &dyn Representation,
    ) -> Result<Chromosome> {
        if position > a.len() || a.len() != b.len() {
            return Err(LcsError::Operator(format!(
                "single-point crossover at {} on chromosomes of {} and {} bits",
                position,
                a.len(),
                b.len()
            )));
        }
        let mut child = a.clone();
        child.copy_range_from(b, position, a.len() - position);
        Ok(child)
    }
}

/// Crosses the condition part and takes the evolved label's gene from `b`.
/// Genes of the other labels stay as in `a`.
pub struct MultiPointCrossover;

impl CrossoverOperator for MultiPointCrossover {
    fn span(&self, representation: &dyn Representation) -> usize {
        representation.condition_size() + 2
    }

    fn cross(
        &self,
        a: &Chromosome,
        b: &Chromosome,
        label: usize,
        position: usize,
        representation: &dyn Representation,
    ) -> Result<Chromosome> {
        let labels = representation.number_of_labels();
        if labels == 0 {
            return Err(LcsError::Operator(
                "multi-point crossover needs at least one label".to_string(),
            ));
        }
        let span = self.span(representation);
        if position > span - 1 {
            return Err(LcsError::Operator(format!(
                "multi-point crossover position {} outside 0..{}",
                position, span
            )));
        }
        if label >= labels {
            return Err(LcsError::Operator(format!(
                "multi-point crossover label {} but only {} labels",
                label, labels
            )));
        }

        let condition_size = representation.condition_size();
        let mut child = a.clone();
        if position < condition_size {
            child.copy_range_from(b, position, condition_size - position);
        }
        let gene = representation.label_gene(label);
        child.copy_range_from(b, gene.start, gene.len());
        Ok(child)
    }
}

pub fn build_crossover(kind: CrossoverKind) -> Box<dyn CrossoverOperator> {
    match kind {
        CrossoverKind::SinglePoint => Box::new(SinglePointCrossover),
        CrossoverKind::MultiPoint => Box::new(MultiPointCrossover),
    }
}

pub trait MutationOperator: Send + Sync {
    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore);
}

/// Flips every bit independently with probability `rate`.
pub struct UniformBitMutation {
    rate: f64,
}

impl UniformBitMutation {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl MutationOperator for UniformBitMutation {
    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) {
        for i in 0..chromosome.len() {
            if rng.gen::<f64>() < self.rate {
                chromosome.flip(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepresentationConfig;
    use crate::data::representation::AttributeRepresentation;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bits(s: &str) -> Chromosome {
        Chromosome::from_bit_str(s).unwrap()
    }

    #[test]
    fn test_single_point_takes_tail_from_second_parent() {
        let repr = AttributeRepresentation::boolean(1, 2, &RepresentationConfig::default()).unwrap();
        let child = SinglePointCrossover
            .cross(&bits("111111"), &bits("000000"), 0, 2, &repr)
            .unwrap();
        assert_eq!(child, bits("110000"));
    }

    #[test]
    fn test_multi_point_keeps_other_labels() {
        // two attributes, three labels: condition 4 bits, labels at 4, 6, 8
        let repr = AttributeRepresentation::boolean(2, 3, &RepresentationConfig::default()).unwrap();
        let a = bits("1111111111");
        let b = bits("0000000000");
        assert_eq!(MultiPointCrossover.span(&repr), 6);

        let child = MultiPointCrossover.cross(&a, &b, 1, 1, &repr).unwrap();
        assert_eq!(child, bits("1000110011"));

        // past the condition only the label gene comes from b
        let child = MultiPointCrossover.cross(&a, &b, 2, 5, &repr).unwrap();
        assert_eq!(child, bits("1111111100"));
    }

    #[test]
    fn test_multi_point_rejects_bad_arguments() {
        let repr = AttributeRepresentation::boolean(2, 3, &RepresentationConfig::default()).unwrap();
        let a = bits("1111111111");
        let b = bits("0000000000");
        assert!(matches!(
            MultiPointCrossover.cross(&a, &b, 0, 6, &repr),
            Err(LcsError::Operator(_))
        ));
        assert!(matches!(
            MultiPointCrossover.cross(&a, &b, 3, 0, &repr),
            Err(LcsError::Operator(_))
        ));
    }

    #[test]
    fn test_mutation_rate_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut chromosome = bits("101010");
        UniformBitMutation::new(0.0).mutate(&mut chromosome, &mut rng);
        assert_eq!(chromosome, bits("101010"));
        UniformBitMutation::new(1.0).mutate(&mut chromosome, &mut rng);
        assert_eq!(chromosome, bits("010101"));
    }
}
