pub mod traits;
pub mod learner;
pub mod update;
pub mod evolution;
pub mod representation;
pub mod manager;

pub use manager::{ConfigManager, LcsConfig};
pub use learner::{LearnerConfig, PopulationControlKind, UpdateMode};
pub use update::{DeletionMode, FitnessMode, UpdateAlgorithm, UpdateConfig};
pub use evolution::{CrossoverKind, EvolutionConfig, SelectorKind};
pub use representation::RepresentationConfig;
pub use traits::ConfigSection;
