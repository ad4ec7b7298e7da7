use crate::data::bitset::Chromosome;
use crate::data::instances::InstanceMatrix;
use crate::data::representation::Representation;
use crate::engines::population::SerialSequence;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Everything a training step needs besides the population and the strategies.
pub struct LcsContext {
    pub representation: Arc<dyn Representation>,
    pub instances: Arc<InstanceMatrix>,
    pub rng: StdRng,
    pub serials: SerialSequence,
    /// Completed passes over the training set.
    pub total_repetition: u64,
    /// Instances presented so far, across passes.
    pub cumulative_instance_index: u64,
    pub covers: u64,
    pub deleted_in_match_sets: u64,
    pub mean_correct_set_numerosity: usize,
}

impl LcsContext {
    pub fn new(
        representation: Arc<dyn Representation>,
        instances: Arc<InstanceMatrix>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            representation,
            instances,
            rng,
            serials: SerialSequence::new(),
            total_repetition: 0,
            cumulative_instance_index: 0,
            covers: 0,
            deleted_in_match_sets: 0,
            mean_correct_set_numerosity: 0,
        }
    }

    pub fn representation(&self) -> &dyn Representation {
        self.representation.as_ref()
    }

    pub fn instances(&self) -> &InstanceMatrix {
        &self.instances
    }

    pub fn instance(&self, index: usize) -> &[f64] {
        self.instances.row(index)
    }

    /// Random chromosome matching training instance `index`.
    pub fn covering_chromosome(&mut self, index: usize) -> Chromosome {
        self.representation
            .create_covering_chromosome(self.instances.row(index), &mut self.rng)
    }
}
