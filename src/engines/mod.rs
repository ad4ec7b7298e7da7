pub mod context;
pub mod control;
pub mod generation;
pub mod learner;
pub mod population;
pub mod selection;
pub mod update;

pub use context::LcsContext;
pub use learner::Learner;
