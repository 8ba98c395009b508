pub mod adapter;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod orchestrator;
pub mod variation;

pub use adapter::SimulatorAdapter;
pub use evolution::{EvolutionLoop, Individual, Statistics};
pub use fitness::FitnessContext;
pub use genome::{Codec, GeneKind};
pub use orchestrator::{optimize_site, OptimizationResult, RunParameters};
