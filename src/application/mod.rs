// Application layer: coloring use cases

pub mod decoder;
pub mod formulation_builder;
pub mod orchestrator;

pub use decoder::SolutionDecoder;
pub use formulation_builder::FormulationBuilder;
pub use orchestrator::ColoringService;
