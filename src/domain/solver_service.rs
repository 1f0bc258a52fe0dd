// Domain service interface for solving coloring formulations
// Defines the contract that any solver implementation must follow

use std::time::Duration;

use super::models::{Constraint, Formulation, Operand, Solution};
use super::value_objects::Strategy;

/// Error types for parsing, building, solving and decoding
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Malformed instance: {0}")]
    MalformedInstance(String),

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Unsupported strategy: {0}")]
    StrategyUnsupported(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("No feasible coloring found for {node_count} nodes with strategy {strategy} within {budget:?}")]
    TimeoutNoIncumbent {
        node_count: usize,
        strategy: Strategy,
        budget: Option<Duration>,
    },

    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Domain service interface for discrete constraint solvers
///
/// Any backend able to handle bounded integer variables, difference
/// constraints, `≤` constraints and a linear minimization objective under a
/// wall-clock budget can implement this trait. The formulation is only ever
/// borrowed: a solver never mutates it.
pub trait SolverService: Send + Sync {
    /// Solve a formulation, giving up after `time_budget` if one is set.
    ///
    /// On cutoff the best incumbent is returned with status `Feasible`, or a
    /// `Timeout` solution without values when none was found.
    fn solve(&self, formulation: &Formulation, time_budget: Option<Duration>)
        -> Result<Solution>;

    /// Validate a formulation without solving it
    fn validate(&self, formulation: &Formulation) -> Result<()> {
        let mut errors = Vec::new();
        let num_vars = formulation.num_variables();

        for (i, var) in formulation.variables.iter().enumerate() {
            if var.lower_bound > var.upper_bound {
                errors.push(format!(
                    "Variable {} '{}' has lower bound ({}) > upper bound ({})",
                    i, var.name, var.lower_bound, var.upper_bound
                ));
            }
        }

        let check = |id: usize, what: &str, errors: &mut Vec<String>| {
            if id >= num_vars {
                errors.push(format!(
                    "{} references variable {} but formulation has {} variables",
                    what, id, num_vars
                ));
            }
        };

        for (i, constraint) in formulation.constraints.iter().enumerate() {
            let what = format!("Constraint {}", i);
            match constraint {
                Constraint::NotEqual(a, b) => {
                    check(a.index(), &what, &mut errors);
                    check(b.index(), &what, &mut errors);
                }
                Constraint::AllDifferent(vars) => {
                    if vars.len() < 2 {
                        errors.push(format!("{} is an all-different over {} variables", what, vars.len()));
                    }
                    for v in vars {
                        check(v.index(), &what, &mut errors);
                    }
                }
                Constraint::LessOrEqual { lhs, rhs } => {
                    check(lhs.index(), &what, &mut errors);
                    if let Operand::Var(v) = rhs {
                        check(v.index(), &what, &mut errors);
                    }
                }
            }
        }

        for (v, _) in formulation.objective.expr.terms() {
            check(v.index(), "Objective", &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::InvalidProblem(errors.join("; ")))
        }
    }

    /// Get the name of this solver backend
    fn name(&self) -> &str;
}
