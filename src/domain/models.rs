use std::time::Duration;

use super::graph::CliqueBudget;
use super::value_objects::{CliqueCutMode, SolutionStatus, SolverBackend, Strategy};

/// Handle to a variable inside one formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Decision variable with a bounded integer domain
#[derive(Debug, Clone)]
pub struct Variable {
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub name: String,
}

impl Variable {
    pub fn integer(name: impl Into<String>, lower: i64, upper: i64) -> Self {
        Self {
            lower_bound: lower,
            upper_bound: upper,
            name: name.into(),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lower_bound <= value && value <= self.upper_bound
    }
}

/// Right-hand side of a `≤` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Var(VarId),
    Const(i64),
}

/// Constraint over formulation variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// `a ≠ b`
    NotEqual(VarId, VarId),
    /// All members take pairwise distinct values
    AllDifferent(Vec<VarId>),
    /// `lhs ≤ rhs`
    LessOrEqual { lhs: VarId, rhs: Operand },
}

impl Constraint {
    /// Whether the constraint holds for a full valuation indexed by `VarId`
    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        match self {
            Constraint::NotEqual(a, b) => values[a.0] != values[b.0],
            Constraint::AllDifferent(vars) => vars
                .iter()
                .enumerate()
                .all(|(i, a)| vars[i + 1..].iter().all(|b| values[a.0] != values[b.0])),
            Constraint::LessOrEqual { lhs, rhs } => {
                let bound = match rhs {
                    Operand::Var(v) => values[v.0],
                    Operand::Const(c) => *c,
                };
                values[lhs.0] <= bound
            }
        }
    }

    /// Variables mentioned by this constraint
    pub fn scope(&self) -> Vec<VarId> {
        match self {
            Constraint::NotEqual(a, b) => vec![*a, *b],
            Constraint::AllDifferent(vars) => vars.clone(),
            Constraint::LessOrEqual { lhs, rhs } => match rhs {
                Operand::Var(v) => vec![*lhs, *v],
                Operand::Const(_) => vec![*lhs],
            },
        }
    }
}

/// Integer linear expression `Σ coeff·var + constant`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
    constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
            constant: 0,
        }
    }

    pub fn term(mut self, var: VarId, coeff: i64) -> Self {
        if coeff != 0 {
            self.terms.push((var, coeff));
        }
        self
    }

    pub fn with_constant(mut self, constant: i64) -> Self {
        self.constant = constant;
        self
    }

    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn constant(&self) -> i64 {
        self.constant
    }

    pub fn evaluate(&self, values: &[i64]) -> i64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.0])
            .sum::<i64>()
            + self.constant
    }
}

/// Objective function, always minimized
#[derive(Debug, Clone, Default)]
pub struct Objective {
    pub expr: LinearExpr,
}

impl Objective {
    pub fn minimize(expr: LinearExpr) -> Self {
        Self { expr }
    }

    /// The variable of a `1·x + c` objective, if that is its shape
    pub fn single_variable(&self) -> Option<VarId> {
        match self.expr.terms() {
            [(v, 1)] => Some(*v),
            _ => None,
        }
    }
}

/// Everything handed to a solver for one coloring invocation
///
/// Built fresh per invocation by the formulation builder and only borrowed by
/// solvers and the decoder afterwards.
#[derive(Debug, Clone)]
pub struct Formulation {
    pub strategy: Strategy,
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: Objective,
    /// `color_vars[node]` holds the color of `node`
    pub color_vars: Vec<VarId>,
    /// Graph edges the coloring must respect, whatever constraints encode them
    pub edges: Vec<(usize, usize)>,
    /// Explicit "max color in use" variable (`k`)
    pub usage_var: Option<VarId>,
    /// Variables whose values can be permuted freely without changing
    /// feasibility or objective ranking
    pub value_symmetric: Vec<VarId>,
    pub num_cliques: usize,
    /// Node `i` restricted to colors `[0, i]`
    pub index_bounded: bool,
}

impl Formulation {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
            color_vars: Vec::new(),
            edges: Vec::new(),
            usage_var: None,
            value_symmetric: Vec::new(),
            num_cliques: 0,
            index_bounded: false,
        }
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// First constraint (or domain) violated by a full valuation
    pub fn first_violation(&self, values: &[i64]) -> Option<String> {
        if values.len() != self.variables.len() {
            return Some(format!(
                "expected {} values, got {}",
                self.variables.len(),
                values.len()
            ));
        }
        for (var, &value) in self.variables.iter().zip(values) {
            if !var.contains(value) {
                return Some(format!(
                    "{} = {} outside [{}, {}]",
                    var.name, value, var.lower_bound, var.upper_bound
                ));
            }
        }
        self.constraints
            .iter()
            .find(|c| !c.is_satisfied_by(values))
            .map(|c| format!("{:?} violated", c))
    }

    pub fn is_satisfied_by(&self, values: &[i64]) -> bool {
        self.first_violation(values).is_none()
    }
}

/// Configuration of one coloring invocation
#[derive(Debug, Clone)]
pub struct ColoringConfig {
    pub strategy: Strategy,
    /// Wall-clock budget of the search, `None` for unbounded
    pub time_budget: Option<Duration>,
    pub clique_budget: CliqueBudget,
    pub clique_mode: CliqueCutMode,
    /// Restrict node `i` to colors `[0, i]`. Heuristic: results obtained
    /// with it are never reported as proven optimal.
    pub index_bounded_domains: bool,
    pub backend: SolverBackend,
}

impl Default for ColoringConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::BoundedByUsage,
            time_budget: None,
            clique_budget: CliqueBudget::default(),
            clique_mode: CliqueCutMode::Supplement,
            index_bounded_domains: false,
            backend: SolverBackend::Auto,
        }
    }
}

impl ColoringConfig {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn with_clique_budget(mut self, budget: CliqueBudget) -> Self {
        self.clique_budget = budget;
        self
    }

    pub fn with_clique_mode(mut self, mode: CliqueCutMode) -> Self {
        self.clique_mode = mode;
        self
    }

    pub fn with_index_bounded_domains(mut self, enabled: bool) -> Self {
        self.index_bounded_domains = enabled;
        self
    }

    pub fn with_backend(mut self, backend: SolverBackend) -> Self {
        self.backend = backend;
        self
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub nodes_explored: u64,
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    /// Binaries introduced by a linearisation, 0 for the constraint engine
    pub num_binary_vars: u32,
}

impl SolverStatistics {
    pub fn for_formulation(formulation: &Formulation) -> Self {
        Self {
            nodes_explored: 0,
            solve_time_ms: 0.0,
            num_variables: formulation.num_variables() as u32,
            num_constraints: formulation.num_constraints() as u32,
            num_binary_vars: 0,
        }
    }
}

/// Raw answer of a solver backend, indexed by `VarId`
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(status: SolutionStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn feasible(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolutionStatus::Feasible,
            objective_value: Some(value),
            variable_values,
            message: "Feasible solution found, optimality not proven".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Formulation {
        let mut f = Formulation::new(Strategy::BoundedByUsage);
        let a = f.add_variable(Variable::integer("a", 0, 2));
        let b = f.add_variable(Variable::integer("b", 0, 2));
        let k = f.add_variable(Variable::integer("k", 0, 3));
        f.add_constraint(Constraint::NotEqual(a, b));
        f.add_constraint(Constraint::LessOrEqual { lhs: a, rhs: Operand::Var(k) });
        f.add_constraint(Constraint::LessOrEqual { lhs: b, rhs: Operand::Var(k) });
        f.with_objective(Objective::minimize(LinearExpr::new().term(k, 1)))
    }

    #[test]
    fn satisfied_valuation() {
        let f = tiny();
        assert!(f.is_satisfied_by(&[0, 1, 1]));
        assert!(!f.is_satisfied_by(&[1, 1, 1]));
        assert!(!f.is_satisfied_by(&[0, 2, 1]));
    }

    #[test]
    fn domain_violation_is_reported() {
        let f = tiny();
        let msg = f.first_violation(&[0, 5, 5]).unwrap();
        assert!(msg.contains("outside"));
        assert!(f.first_violation(&[0, 1]).is_some());
    }

    #[test]
    fn all_different_checks_every_pair() {
        let c = Constraint::AllDifferent(vec![VarId(0), VarId(1), VarId(2)]);
        assert!(c.is_satisfied_by(&[0, 1, 2]));
        assert!(!c.is_satisfied_by(&[0, 1, 0]));
    }

    #[test]
    fn linear_expression_value() {
        let e = LinearExpr::sum([VarId(0), VarId(2)]).with_constant(3);
        assert_eq!(e.evaluate(&[1, 10, 4]), 8);
        let zero = LinearExpr::new().term(VarId(1), 0);
        assert!(zero.terms().is_empty());
    }

    #[test]
    fn single_variable_objective() {
        let f = tiny();
        assert_eq!(f.objective.single_variable(), Some(VarId(2)));
        let sum = Objective::minimize(LinearExpr::sum([VarId(0), VarId(1)]));
        assert_eq!(sum.single_variable(), None);
    }
}
