// Solver adapters: concrete implementations of SolverService

pub mod branch_and_bound;
#[cfg(feature = "mip")]
pub mod coin_cbc_solver;
pub mod factory;
#[cfg(feature = "mip")]
pub mod highs_solver;
pub mod linear;

pub use branch_and_bound::BranchAndBoundSolver;
#[cfg(feature = "mip")]
pub use coin_cbc_solver::CoinCbcSolver;
pub use factory::SolverFactory;
#[cfg(feature = "mip")]
pub use highs_solver::HighsSolver;
