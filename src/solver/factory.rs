use crate::domain::{
    solver_service::{Result, SolverService},
    value_objects::SolverBackend,
};
use crate::solver::BranchAndBoundSolver;
#[cfg(feature = "mip")]
use crate::solver::{CoinCbcSolver, HighsSolver};
use std::sync::Arc;

/// Factory for creating solver instances based on configuration
pub struct SolverFactory;

impl SolverFactory {
    /// Create a solver for a specific backend
    pub fn create_from_backend(backend: SolverBackend) -> Result<Arc<dyn SolverService>> {
        match backend {
            SolverBackend::Auto | SolverBackend::BranchAndBound => {
                Ok(Arc::new(BranchAndBoundSolver::new()))
            }
            #[cfg(feature = "mip")]
            SolverBackend::CoinCbc => Ok(Arc::new(CoinCbcSolver::new())),
            #[cfg(feature = "mip")]
            SolverBackend::Highs => Ok(Arc::new(HighsSolver::new())),
            #[cfg(not(feature = "mip"))]
            SolverBackend::CoinCbc | SolverBackend::Highs => {
                Err(crate::domain::SolverError::SolverNotAvailable(format!(
                    "{} (build with the `mip` feature)",
                    backend
                )))
            }
        }
    }

    /// Get the default solver (built-in branch and bound)
    pub fn default_solver() -> Arc<dyn SolverService> {
        Arc::new(BranchAndBoundSolver::new())
    }
}
