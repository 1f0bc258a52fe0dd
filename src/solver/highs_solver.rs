// HiGHS Solver Adapter
// Implements the SolverService interface for HiGHS on the linearised
// formulation

use crate::domain::{
    models::{Formulation, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolutionStatus as DomainSolutionStatus,
};
use crate::solver::linear::LinearModel;
use std::time::{Duration, Instant};

pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for HighsSolver {
    fn solve(
        &self,
        formulation: &Formulation,
        time_budget: Option<Duration>,
    ) -> Result<DomainSolution> {
        self.validate(formulation)?;

        let start_time = Instant::now();
        let linear = LinearModel::from_formulation(formulation);

        // Use HiGHS RowProblem (add variables first, then constraints)
        use highs::{HighsModelStatus, RowProblem, Sense};

        let mut pb = RowProblem::default();
        let mut costs = vec![0.0; linear.columns.len()];
        for &(i, coeff) in &linear.objective {
            costs[i] += coeff;
        }

        let cols: Vec<_> = linear
            .columns
            .iter()
            .zip(&costs)
            .map(|(col, &cost)| pb.add_integer_column(cost, col.lower..=col.upper))
            .collect();

        for row in &linear.rows {
            let terms: Vec<_> = row.terms.iter().map(|&(i, coeff)| (cols[i], coeff)).collect();
            pb.add_row(row.lower.., &terms);
        }

        let mut model = pb.optimise(Sense::Minimise);
        model.set_option("output_flag", false);
        if let Some(budget) = time_budget {
            model.set_option("time_limit", budget.as_secs_f64());
        }

        let solved = model.solve();
        let mut statistics = SolverStatistics::for_formulation(formulation);
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;
        statistics.num_variables = linear.columns.len() as u32;
        statistics.num_constraints = linear.rows.len() as u32;
        statistics.num_binary_vars = linear.num_binaries() as u32;

        let columns = || solved.get_solution().columns().to_vec();

        let solution = match solved.status() {
            // the decoder checks whatever HiGHS claims to have solved
            HighsModelStatus::Optimal => {
                let columns = columns();
                DomainSolution::optimal(
                    linear.objective_value(&columns),
                    linear.formulation_values(&columns),
                )
            }
            HighsModelStatus::ReachedTimeLimit => {
                let columns = columns();
                if linear.holds_incumbent(formulation, &columns) {
                    DomainSolution::feasible(
                        linear.objective_value(&columns),
                        linear.formulation_values(&columns),
                    )
                } else {
                    DomainSolution::new(
                        DomainSolutionStatus::Timeout,
                        "HiGHS reached its time limit without a feasible solution",
                    )
                }
            }
            HighsModelStatus::Infeasible => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
            status => {
                return Err(SolverError::ExecutionFailed(format!(
                    "HiGHS solver returned status: {:?}",
                    status
                )))
            }
        };

        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}
