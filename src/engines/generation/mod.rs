pub mod operators;
pub mod progress;
pub mod steady_state;

pub use operators::{
    build_crossover, CrossoverOperator, MultiPointCrossover, MutationOperator, SinglePointCrossover,
    UniformBitMutation,
};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage, RepetitionSummary,
    SilentProgressCallback,
};
pub use steady_state::{BatchedOffspring, GaRunStats, GeneticAlgorithm, SteadyStateGa};
