use super::Representation;
use crate::config::{ConfigSection, RepresentationConfig};
use crate::data::bitset::Chromosome;
use crate::error::{LcsError, Result};
use crate::types::LabelAbility;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Attribute declaration, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeSpec {
    Boolean { name: String },
    Nominal { name: String, values: Vec<String> },
    Interval { name: String, min: f64, max: f64 },
}

impl AttributeSpec {
    pub fn name(&self) -> &str {
        match self {
            AttributeSpec::Boolean { name }
            | AttributeSpec::Nominal { name, .. }
            | AttributeSpec::Interval { name, .. } => name,
        }
    }
}

/// Every gene starts with a "specific" flag; a cleared flag is a wildcard.
#[derive(Debug, Clone)]
enum Gene {
    /// [specific, value]
    Boolean { position: usize },
    /// [specific, one bit per allowed value]
    Nominal { position: usize, values: usize },
    /// [specific, low bound, high bound]
    Interval {
        position: usize,
        min: f64,
        max: f64,
        precision: usize,
    },
}

impl Gene {
    fn position(&self) -> usize {
        match *self {
            Gene::Boolean { position }
            | Gene::Nominal { position, .. }
            | Gene::Interval { position, .. } => position,
        }
    }

    fn len(&self) -> usize {
        match *self {
            Gene::Boolean { .. } => 2,
            Gene::Nominal { values, .. } => values + 1,
            Gene::Interval { precision, .. } => 2 * precision + 1,
        }
    }

    fn is_specific(&self, c: &Chromosome) -> bool {
        c.get(self.position())
    }

    fn total_parts(precision: usize) -> f64 {
        ((1u64 << precision) - 1) as f64
    }

    fn bounds(&self, c: &Chromosome) -> (f64, f64) {
        match *self {
            Gene::Interval {
                position,
                min,
                max,
                precision,
            } => {
                let parts = Self::total_parts(precision);
                let low = c.get_range(position + 1, precision) as f64;
                let high = c.get_range(position + 1 + precision, precision) as f64;
                (
                    low / parts * (max - min) + min,
                    high / parts * (max - min) + min,
                )
            }
            _ => (0.0, 0.0),
        }
    }

    fn is_match(&self, value: f64, c: &Chromosome) -> bool {
        if !self.is_specific(c) {
            return true;
        }
        match *self {
            Gene::Boolean { position } => (value != 0.0) == c.get(position + 1),
            Gene::Nominal { position, values } => {
                value >= 0.0 && (value as usize) < values && c.get(position + 1 + value as usize)
            }
            Gene::Interval { .. } => {
                let (low, high) = self.bounds(c);
                value >= low && value <= high
            }
        }
    }

    fn is_equal(&self, a: &Chromosome, b: &Chromosome) -> bool {
        if self.is_specific(a) != self.is_specific(b) {
            return false;
        }
        if !self.is_specific(a) {
            return true;
        }
        a.range_eq(b, self.position() + 1, self.len() - 1)
    }

    fn is_more_general(&self, base: &Chromosome, test: &Chromosome) -> bool {
        if !self.is_specific(base) {
            return true;
        }
        if !self.is_specific(test) {
            return false;
        }
        match self {
            Gene::Interval { .. } => {
                let (base_low, base_high) = self.bounds(base);
                let (test_low, test_high) = self.bounds(test);
                base_high >= test_high && base_low <= test_low
            }
            _ => base.range_eq(test, self.position() + 1, self.len() - 1),
        }
    }

    fn fix(&self, c: &mut Chromosome) {
        match *self {
            Gene::Boolean { .. } => {}
            Gene::Nominal { position, values } => {
                if c.get(position) {
                    let ones = c.count_ones_in(position + 1, values);
                    if ones == 0 || ones == values {
                        c.clear(position);
                    }
                }
            }
            Gene::Interval {
                position,
                precision,
                ..
            } => {
                let low = c.get_range(position + 1, precision);
                let high = c.get_range(position + 1 + precision, precision);
                if low > high {
                    c.set_range(position + 1, precision, high);
                    c.set_range(position + 1 + precision, precision, low);
                }
            }
        }
    }

    fn cover(&self, value: f64, generalization_rate: f64, c: &mut Chromosome, rng: &mut dyn RngCore) {
        let specific = rng.gen::<f64>() >= generalization_rate;
        match *self {
            Gene::Boolean { position } => {
                c.set_to(position + 1, value != 0.0);
            }
            Gene::Nominal { position, values } => {
                c.clear_range(position + 1, values);
                for i in 0..values {
                    c.set_to(position + 1 + i, rng.gen::<f64>() < 0.5);
                }
                if value >= 0.0 && (value as usize) < values {
                    c.set(position + 1 + value as usize);
                }
            }
            Gene::Interval {
                position,
                min,
                max,
                precision,
            } => {
                let parts = Self::total_parts(precision);
                let span = max - min;
                let (low, high) = if span > 0.0 {
                    let low = ((value - min) * rng.gen::<f64>() / span * parts).floor();
                    let high = ((span - (max - value) * rng.gen::<f64>()) / span * parts).ceil();
                    (low.clamp(0.0, parts), high.clamp(0.0, parts))
                } else {
                    (0.0, parts)
                };
                c.set_range(position + 1, precision, low as u64);
                c.set_range(position + 1 + precision, precision, high as u64);
            }
        }
        c.set_to(self.position(), specific);
    }
}

/// Mixed boolean / nominal / interval conditions with one boolean gene per label.
#[derive(Debug, Clone)]
pub struct AttributeRepresentation {
    attributes: Vec<Gene>,
    attribute_names: Vec<String>,
    nominal_values: Vec<Vec<String>>,
    label_names: Vec<String>,
    condition_size: usize,
    chromosome_size: usize,
    attribute_generalization_rate: f64,
    label_generalization_rate: f64,
}

impl AttributeRepresentation {
    pub fn new(
        specs: &[AttributeSpec],
        label_names: Vec<String>,
        config: &RepresentationConfig,
    ) -> Result<Self> {
        config.validate()?;
        if label_names.is_empty() {
            return Err(LcsError::Representation(
                "At least one label is required".to_string(),
            ));
        }
        let precision = config.precision_bits as usize;
        let mut position = 0;
        let mut attributes = Vec::with_capacity(specs.len());
        let mut nominal_values = Vec::with_capacity(specs.len());

        for spec in specs {
            let gene = match spec {
                AttributeSpec::Boolean { .. } => Gene::Boolean { position },
                AttributeSpec::Nominal { name, values } => {
                    if values.is_empty() {
                        return Err(LcsError::Representation(format!(
                            "Nominal attribute '{}' has no values",
                            name
                        )));
                    }
                    Gene::Nominal {
                        position,
                        values: values.len(),
                    }
                }
                AttributeSpec::Interval { name, min, max } => {
                    if !(max > min) {
                        return Err(LcsError::Representation(format!(
                            "Interval attribute '{}' needs max > min, got [{}, {}]",
                            name, min, max
                        )));
                    }
                    Gene::Interval {
                        position,
                        min: *min,
                        max: *max,
                        precision,
                    }
                }
            };
            position += gene.len();
            attributes.push(gene);
            nominal_values.push(match spec {
                AttributeSpec::Nominal { values, .. } => values.clone(),
                _ => Vec::new(),
            });
        }

        let condition_size = position;
        let chromosome_size = condition_size + 2 * label_names.len();

        Ok(Self {
            attributes,
            attribute_names: specs.iter().map(|s| s.name().to_string()).collect(),
            nominal_values,
            label_names,
            condition_size,
            chromosome_size,
            attribute_generalization_rate: config.attribute_generalization_rate,
            label_generalization_rate: config.label_generalization_rate,
        })
    }

    /// Boolean attributes named `a0..` and labels named `l0..`.
    pub fn boolean(
        attributes: usize,
        labels: usize,
        config: &RepresentationConfig,
    ) -> Result<Self> {
        let specs: Vec<AttributeSpec> = (0..attributes)
            .map(|i| AttributeSpec::Boolean {
                name: format!("a{}", i),
            })
            .collect();
        let label_names = (0..labels).map(|i| format!("l{}", i)).collect();
        Self::new(&specs, label_names, config)
    }

    fn label_position(&self, label: usize) -> usize {
        self.condition_size + 2 * label
    }

    fn label_value(&self, instance: &[f64], label: usize) -> bool {
        instance[self.attributes.len() + label] != 0.0
    }

    fn labels_more_general(&self, base: &Chromosome, test: &Chromosome) -> bool {
        (0..self.label_names.len()).all(|l| {
            let p = self.label_position(l);
            if !base.get(p) {
                return true;
            }
            test.get(p) && base.get(p + 1) == test.get(p + 1)
        })
    }

    fn labels_equal(&self, a: &Chromosome, b: &Chromosome) -> bool {
        (0..self.label_names.len()).all(|l| {
            let p = self.label_position(l);
            a.get(p) == b.get(p) && (!a.get(p) || a.get(p + 1) == b.get(p + 1))
        })
    }
}

impl Representation for AttributeRepresentation {
    fn chromosome_size(&self) -> usize {
        self.chromosome_size
    }

    fn number_of_attributes(&self) -> usize {
        self.attributes.len()
    }

    fn number_of_labels(&self) -> usize {
        self.label_names.len()
    }

    fn condition_size(&self) -> usize {
        self.condition_size
    }

    fn label_gene(&self, label: usize) -> Range<usize> {
        let start = self.label_position(label);
        start..start + 2
    }

    fn is_match(&self, instance: &[f64], chromosome: &Chromosome) -> bool {
        self.attributes
            .iter()
            .zip(instance)
            .all(|(gene, value)| gene.is_match(*value, chromosome))
    }

    fn is_more_general(&self, base: &Chromosome, test: &Chromosome) -> bool {
        self.attributes
            .iter()
            .all(|gene| gene.is_more_general(base, test))
            && self.labels_more_general(base, test)
    }

    fn are_equal(&self, a: &Chromosome, b: &Chromosome) -> bool {
        self.attributes.iter().all(|gene| gene.is_equal(a, b)) && self.labels_equal(a, b)
    }

    fn fix_chromosome(&self, chromosome: &mut Chromosome) {
        for gene in &self.attributes {
            gene.fix(chromosome);
        }
    }

    fn classify_ability_label(
        &self,
        chromosome: &Chromosome,
        instance: &[f64],
        label: usize,
    ) -> LabelAbility {
        let p = self.label_position(label);
        if !chromosome.get(p) {
            LabelAbility::Abstain
        } else if chromosome.get(p + 1) == self.label_value(instance, label) {
            LabelAbility::Positive
        } else {
            LabelAbility::Negative
        }
    }

    fn create_covering_chromosome(&self, instance: &[f64], rng: &mut dyn RngCore) -> Chromosome {
        let mut chromosome = Chromosome::new(self.chromosome_size);
        for (gene, value) in self.attributes.iter().zip(instance) {
            gene.cover(*value, self.attribute_generalization_rate, &mut chromosome, rng);
        }
        for label in 0..self.label_names.len() {
            let p = self.label_position(label);
            chromosome.set_to(p + 1, self.label_value(instance, label));
            chromosome.set_to(p, rng.gen::<f64>() >= self.label_generalization_rate);
        }
        self.fix_chromosome(&mut chromosome);
        chromosome
    }

    fn label_decision(&self, chromosome: &Chromosome, label: usize) -> Option<bool> {
        let p = self.label_position(label);
        chromosome.get(p).then(|| chromosome.get(p + 1))
    }

    fn describe(&self, chromosome: &Chromosome) -> String {
        let mut condition = Vec::new();
        for (i, gene) in self.attributes.iter().enumerate() {
            if !gene.is_specific(chromosome) {
                continue;
            }
            let name = &self.attribute_names[i];
            let text = match *gene {
                Gene::Boolean { position } => {
                    format!("{}:{}", name, if chromosome.get(position + 1) { 1 } else { 0 })
                }
                Gene::Nominal { position, values } => {
                    let allowed: Vec<&str> = (0..values)
                        .filter(|v| chromosome.get(position + 1 + v))
                        .map(|v| self.nominal_values[i][v].as_str())
                        .collect();
                    format!("{} in {{{}}}", name, allowed.join(", "))
                }
                Gene::Interval { .. } => {
                    let (low, high) = gene.bounds(chromosome);
                    format!("{} in [{:.3}, {:.3}]", name, low, high)
                }
            };
            condition.push(text);
        }

        let consequent: Vec<String> = (0..self.label_names.len())
            .map(|l| match self.label_decision(chromosome, l) {
                Some(true) => format!("{}:1", self.label_names[l]),
                Some(false) => format!("{}:0", self.label_names[l]),
                None => format!("{}:#", self.label_names[l]),
            })
            .collect();

        let antecedent = if condition.is_empty() {
            "*".to_string()
        } else {
            condition.join(" AND ")
        };
        format!("{} => {}", antecedent, consequent.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> RepresentationConfig {
        RepresentationConfig::default()
    }

    #[test]
    fn test_out_of_range_precision_rejected() {
        let specs = vec![AttributeSpec::Interval {
            name: "t".into(),
            min: 0.0,
            max: 1.0,
        }];
        for precision_bits in [0, 64] {
            let config = RepresentationConfig {
                precision_bits,
                ..config()
            };
            let result = AttributeRepresentation::new(&specs, vec!["y".into()], &config);
            assert!(matches!(result, Err(LcsError::Configuration(_))));
        }
    }

    #[test]
    fn test_boolean_layout_and_match() {
        let repr = AttributeRepresentation::boolean(2, 1, &config()).unwrap();
        assert_eq!(repr.chromosome_size(), 6);
        assert_eq!(repr.condition_size(), 4);
        assert_eq!(repr.label_gene(0), 4..6);

        // a0 specific = 1, a1 wildcard, l0 specific = 1
        let rule = Chromosome::from_bit_str("110011").unwrap();
        assert!(repr.is_match(&[1.0, 0.0, 1.0], &rule));
        assert!(repr.is_match(&[1.0, 1.0, 0.0], &rule));
        assert!(!repr.is_match(&[0.0, 1.0, 1.0], &rule));

        assert_eq!(
            repr.classify_ability_label(&rule, &[1.0, 0.0, 1.0], 0),
            LabelAbility::Positive
        );
        assert_eq!(
            repr.classify_ability_label(&rule, &[1.0, 0.0, 0.0], 0),
            LabelAbility::Negative
        );
    }

    #[test]
    fn test_generality_and_equality() {
        let repr = AttributeRepresentation::boolean(2, 1, &config()).unwrap();
        let general = Chromosome::from_bit_str("110011").unwrap();
        let specific = Chromosome::from_bit_str("111011").unwrap();
        assert!(repr.is_more_general(&general, &specific));
        assert!(!repr.is_more_general(&specific, &general));
        // wildcard value bits are ignored by equality
        let general_noise = Chromosome::from_bit_str("110111").unwrap();
        assert!(repr.are_equal(&general, &general_noise));
    }

    #[test]
    fn test_covering_matches_instance() {
        let specs = vec![
            AttributeSpec::Boolean { name: "b".into() },
            AttributeSpec::Nominal {
                name: "colour".into(),
                values: vec!["red".into(), "green".into(), "blue".into()],
            },
            AttributeSpec::Interval {
                name: "x".into(),
                min: 0.0,
                max: 10.0,
            },
        ];
        let repr =
            AttributeRepresentation::new(&specs, vec!["y0".into(), "y1".into()], &config()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let instance = [1.0, 2.0, 3.7, 1.0, 0.0];
        for _ in 0..200 {
            let rule = repr.create_covering_chromosome(&instance, &mut rng);
            assert!(repr.is_match(&instance, &rule));
            assert_eq!(
                repr.classify_ability_label(&rule, &instance, 0),
                LabelAbility::Positive
            );
            assert_eq!(
                repr.classify_ability_label(&rule, &instance, 1),
                LabelAbility::Positive
            );
        }
    }

    #[test]
    fn test_fix_swaps_interval_bounds() {
        let specs = vec![AttributeSpec::Interval {
            name: "x".into(),
            min: 0.0,
            max: 255.0,
        }];
        let repr = AttributeRepresentation::new(&specs, vec!["y".into()], &config()).unwrap();
        let mut rule = Chromosome::new(repr.chromosome_size());
        rule.set(0);
        rule.set_range(1, 8, 200);
        rule.set_range(9, 8, 10);
        repr.fix_chromosome(&mut rule);
        assert_eq!(rule.get_range(1, 8), 10);
        assert_eq!(rule.get_range(9, 8), 200);
        assert!(repr.is_match(&[100.0, 0.0], &rule));
    }

    #[test]
    fn test_invalid_layouts_fail() {
        assert!(AttributeRepresentation::boolean(3, 0, &config()).is_err());
        let specs = vec![AttributeSpec::Interval {
            name: "x".into(),
            min: 1.0,
            max: 1.0,
        }];
        assert!(AttributeRepresentation::new(&specs, vec!["y".into()], &config()).is_err());
    }
}
