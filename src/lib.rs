// Domain layer: graph, formulation and result models
pub mod domain;

// Application layer: formulation building, decoding and orchestration
pub mod application;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Re-export commonly used types
pub use domain::{
    CliqueBudget, CliqueCutMode, ColorAssignment, ColoringConfig, Constraint, Formulation, Graph,
    Solution, SolutionStatus, SolveResult, SolverBackend, SolverError, SolverService, Strategy,
};

pub use application::{ColoringService, FormulationBuilder, SolutionDecoder};

pub use solver::{BranchAndBoundSolver, SolverFactory};

#[cfg(feature = "mip")]
pub use solver::{CoinCbcSolver, HighsSolver};
