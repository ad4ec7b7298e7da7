pub mod bitset;
pub mod dataset;
pub mod instances;
pub mod representation;

pub use bitset::Chromosome;
pub use dataset::Dataset;
pub use instances::InstanceMatrix;
pub use representation::{AttributeRepresentation, AttributeSpec, Representation};
