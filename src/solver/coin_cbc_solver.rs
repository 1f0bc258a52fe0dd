use crate::domain::{
    models::{Formulation, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverError, SolverService},
    value_objects::SolutionStatus as DomainSolutionStatus,
};
use crate::domain::value_objects::VariableType;
use crate::solver::linear::LinearModel;
use good_lp::{
    solvers::coin_cbc, variable, variables, Expression, ResolutionError,
    Solution as GoodLpSolutionTrait, SolverModel, Variable as GoodLpVariable,
};
use std::time::{Duration, Instant};

pub struct CoinCbcSolver;

impl CoinCbcSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CoinCbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for CoinCbcSolver {
    fn solve(
        &self,
        formulation: &Formulation,
        time_budget: Option<Duration>,
    ) -> Result<DomainSolution> {
        self.validate(formulation)?;

        let start_time = Instant::now();
        let linear = LinearModel::from_formulation(formulation);

        // Build variables using good_lp
        let mut vars = variables!();
        let lp_variables: Vec<GoodLpVariable> = linear
            .columns
            .iter()
            .map(|col| match col.variable_type {
                VariableType::Integer => {
                    vars.add(variable().integer().min(col.lower).max(col.upper))
                }
                VariableType::Binary => vars.add(variable().binary()),
            })
            .collect();

        // Build objective expression
        let mut obj_expr: Expression = linear.objective_constant.into();
        for &(i, coeff) in &linear.objective {
            obj_expr += coeff * lp_variables[i];
        }

        let mut lp_model = vars.minimise(obj_expr).using(coin_cbc::coin_cbc);
        lp_model.set_parameter("log", "0");
        if let Some(budget) = time_budget {
            lp_model.set_parameter("seconds", &format!("{}", budget.as_secs_f64()));
        }

        for row in &linear.rows {
            let mut lhs: Expression = 0.into();
            for &(i, coeff) in &row.terms {
                lhs += coeff * lp_variables[i];
            }
            lp_model = lp_model.with(lhs.geq(row.lower));
        }

        // Solve the problem
        let solution_result = lp_model.solve();
        let elapsed = start_time.elapsed();

        let mut statistics = SolverStatistics::for_formulation(formulation);
        statistics.solve_time_ms = elapsed.as_secs_f64() * 1000.0;
        statistics.num_variables = linear.columns.len() as u32;
        statistics.num_constraints = linear.rows.len() as u32;
        statistics.num_binary_vars = linear.num_binaries() as u32;

        let out_of_time = time_budget.map_or(false, |budget| elapsed >= budget);

        match solution_result {
            Ok(sol) => {
                let columns: Vec<f64> = lp_variables.iter().map(|&var| sol.value(var)).collect();
                let objective = linear.objective_value(&columns);
                let values = linear.formulation_values(&columns);
                // the decoder checks whatever CBC claims to have solved
                let solution = if !out_of_time {
                    DomainSolution::optimal(objective, values)
                } else if linear.holds_incumbent(formulation, &columns) {
                    DomainSolution::feasible(objective, values)
                } else {
                    DomainSolution::new(
                        DomainSolutionStatus::Timeout,
                        "CBC stopped on its time limit without a feasible solution",
                    )
                };
                Ok(solution.with_statistics(statistics))
            }
            Err(ResolutionError::Infeasible) => Ok(DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            )
            .with_statistics(statistics)),
            // CBC reports a stop on its limit as an error and drops the incumbent
            Err(e) if out_of_time => Ok(DomainSolution::new(
                DomainSolutionStatus::Timeout,
                format!("CBC stopped on its time limit: {:?}", e),
            )
            .with_statistics(statistics)),
            Err(e) => Err(SolverError::ExecutionFailed(format!("{:?}", e))),
        }
    }

    fn name(&self) -> &str {
        "COIN-OR CBC"
    }
}
