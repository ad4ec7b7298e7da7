pub mod classifier;
pub mod classifier_set;
pub mod dump;
pub mod macroclassifier;

pub use classifier::{Classifier, SerialSequence};
pub use classifier_set::{ClassifierSet, PopulationStats};
pub use dump::{dump_population, PopulationSnapshot};
pub use macroclassifier::Macroclassifier;
