// Built-in constraint solver
// Depth-first branch and bound over bitset domains, used when no native MIP
// backend is compiled in (and by default everywhere else)

use std::collections::HashSet;
use std::time::{Duration, Instant};

use bit_set::BitSet;

use crate::domain::{
    models::{Constraint, Formulation, Operand, Solution as DomainSolution, SolverStatistics},
    solver_service::{Result, SolverService},
    value_objects::SolutionStatus as DomainSolutionStatus,
};

/// Nodes explored between two looks at the clock
const CHECK_INTERVAL: u64 = 256;

pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BranchAndBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverService for BranchAndBoundSolver {
    fn solve(
        &self,
        formulation: &Formulation,
        time_budget: Option<Duration>,
    ) -> Result<DomainSolution> {
        self.validate(formulation)?;

        let start_time = Instant::now();
        let deadline = time_budget.and_then(|budget| start_time.checked_add(budget));

        let mut search = Search::new(formulation, deadline);
        let root: Vec<Domain> = formulation
            .variables
            .iter()
            .map(|v| Domain::new(v.lower_bound, v.upper_bound))
            .collect();
        let all = (0..root.len()).collect();
        search.explore(root, all);

        let mut statistics = SolverStatistics::for_formulation(formulation);
        statistics.nodes_explored = search.nodes;
        statistics.solve_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        let solution = match (search.incumbent.take(), search.timed_out) {
            (Some((value, values)), false) => {
                DomainSolution::optimal(value as f64, to_f64(&values))
            }
            (Some((value, values)), true) => {
                DomainSolution::feasible(value as f64, to_f64(&values))
                    .with_message("Time budget exhausted, returning best incumbent")
            }
            (None, true) => DomainSolution::new(
                DomainSolutionStatus::Timeout,
                "Time budget exhausted before any solution was found",
            ),
            (None, false) => DomainSolution::new(
                DomainSolutionStatus::Infeasible,
                "Problem is infeasible: no solution satisfies all constraints",
            ),
        };

        log::debug!(
            "branch and bound: {} after {} nodes in {:.1} ms",
            solution.status,
            statistics.nodes_explored,
            statistics.solve_time_ms
        );
        Ok(solution.with_statistics(statistics))
    }

    fn name(&self) -> &str {
        "Branch and Bound"
    }
}

fn to_f64(values: &[i64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

/// Remaining values of one variable, stored relative to its lower bound
#[derive(Debug, Clone)]
struct Domain {
    offset: i64,
    values: BitSet,
}

impl Domain {
    fn new(lower: i64, upper: i64) -> Self {
        let values = if upper < lower {
            BitSet::new()
        } else {
            (0..=(upper - lower) as usize).collect()
        };
        Self {
            offset: lower,
            values,
        }
    }

    fn singleton(&self, value: i64) -> Self {
        let mut values = BitSet::with_capacity(self.values.capacity());
        values.insert((value - self.offset) as usize);
        Self {
            offset: self.offset,
            values,
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().map(move |v| v as i64 + self.offset)
    }

    fn min(&self) -> Option<i64> {
        self.iter().next()
    }

    fn max(&self) -> Option<i64> {
        self.iter().last()
    }

    fn fixed(&self) -> Option<i64> {
        if self.len() == 1 {
            self.min()
        } else {
            None
        }
    }

    fn remove(&mut self, value: i64) -> bool {
        value >= self.offset && self.values.remove((value - self.offset) as usize)
    }

    fn retain(&mut self, keep: impl Fn(i64) -> bool) -> bool {
        let doomed: Vec<i64> = self.iter().filter(|&v| !keep(v)).collect();
        for &v in &doomed {
            self.remove(v);
        }
        !doomed.is_empty()
    }

    fn remove_above(&mut self, bound: i64) -> bool {
        self.retain(|v| v <= bound)
    }

    fn remove_below(&mut self, bound: i64) -> bool {
        self.retain(|v| v >= bound)
    }
}

struct Search<'f> {
    formulation: &'f Formulation,
    /// Constraints to revisit when a variable's domain changes
    watches: Vec<Vec<usize>>,
    degree: Vec<usize>,
    symmetric: Vec<bool>,
    objective_var: Option<usize>,
    deadline: Option<Instant>,
    nodes: u64,
    timed_out: bool,
    incumbent: Option<(i64, Vec<i64>)>,
}

impl<'f> Search<'f> {
    fn new(formulation: &'f Formulation, deadline: Option<Instant>) -> Self {
        let num_vars = formulation.num_variables();
        let mut watches = vec![Vec::new(); num_vars];
        for (i, constraint) in formulation.constraints.iter().enumerate() {
            for var in constraint.scope() {
                watches[var.index()].push(i);
            }
        }
        let degree = watches.iter().map(Vec::len).collect();

        let mut symmetric = vec![false; num_vars];
        for var in &formulation.value_symmetric {
            symmetric[var.index()] = true;
        }

        Self {
            formulation,
            watches,
            degree,
            symmetric,
            objective_var: formulation.objective.single_variable().map(|v| v.index()),
            deadline,
            nodes: 0,
            timed_out: false,
            incumbent: None,
        }
    }

    fn explore(&mut self, mut domains: Vec<Domain>, mut changed: Vec<usize>) {
        self.nodes += 1;
        if self.nodes % CHECK_INTERVAL == 1 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                }
            }
        }
        if self.timed_out {
            return;
        }

        // Every new incumbent must strictly improve the last one
        if let (Some(var), Some((best, _))) = (self.objective_var, &self.incumbent) {
            let bound = best - 1 - self.formulation.objective.expr.constant();
            if domains[var].remove_above(bound) {
                if domains[var].is_empty() {
                    return;
                }
                changed.push(var);
            }
        }

        if !self.propagate(&mut domains, changed) {
            return;
        }

        if let Some((best, _)) = &self.incumbent {
            if self.objective_lower_bound(&domains) >= *best {
                return;
            }
        }

        let var = match self.select_variable(&domains) {
            Some(var) => var,
            None => return self.record(&domains),
        };

        for value in self.candidate_values(var, &domains) {
            let mut child = domains.clone();
            child[var] = domains[var].singleton(value);
            self.explore(child, vec![var]);
            if self.timed_out {
                return;
            }
        }
    }

    fn record(&mut self, domains: &[Domain]) {
        let values: Vec<i64> = domains.iter().filter_map(Domain::fixed).collect();
        if let Some(violation) = self.formulation.first_violation(&values) {
            log::warn!("propagation let an invalid leaf through: {}", violation);
            return;
        }
        let value = self.formulation.objective.expr.evaluate(&values);
        let improves = self.incumbent.as_ref().map_or(true, |(best, _)| value < *best);
        if improves {
            log::debug!("new incumbent {} after {} nodes", value, self.nodes);
            self.incumbent = Some((value, values));
        }
    }

    /// Smallest domain first, then most constrained, then lowest index
    fn select_variable(&self, domains: &[Domain]) -> Option<usize> {
        (0..domains.len())
            .filter(|&v| domains[v].len() > 1)
            .min_by(|&a, &b| {
                domains[a]
                    .len()
                    .cmp(&domains[b].len())
                    .then(self.degree[b].cmp(&self.degree[a]))
                    .then(a.cmp(&b))
            })
    }

    /// Values to branch on, ascending. For a value-symmetric variable only
    /// the values already in use plus the smallest unused one are worth trying.
    fn candidate_values(&self, var: usize, domains: &[Domain]) -> Vec<i64> {
        if !self.symmetric[var] {
            return domains[var].iter().collect();
        }
        let used: HashSet<i64> = self
            .formulation
            .value_symmetric
            .iter()
            .filter_map(|v| domains[v.index()].fixed())
            .collect();
        let mut fresh_taken = false;
        domains[var]
            .iter()
            .filter(|v| {
                if used.contains(v) {
                    true
                } else if !fresh_taken {
                    fresh_taken = true;
                    true
                } else {
                    false
                }
            })
            .collect()
    }

    fn objective_lower_bound(&self, domains: &[Domain]) -> i64 {
        let expr = &self.formulation.objective.expr;
        expr.terms()
            .iter()
            .map(|&(v, c)| {
                let d = &domains[v.index()];
                let extreme = if c > 0 { d.min() } else { d.max() };
                c * extreme.unwrap_or(0)
            })
            .sum::<i64>()
            + expr.constant()
    }

    /// Run the filters to a fixpoint. `false` on a domain wipe-out.
    fn propagate(&self, domains: &mut [Domain], mut queue: Vec<usize>) -> bool {
        let mut queued = vec![false; domains.len()];
        queue.retain(|&v| !std::mem::replace(&mut queued[v], true));

        let mut touched = Vec::new();
        while let Some(var) = queue.pop() {
            queued[var] = false;
            for &c in &self.watches[var] {
                if !self.filter(c, domains, &mut touched) {
                    return false;
                }
                for t in touched.drain(..) {
                    if !queued[t] {
                        queued[t] = true;
                        queue.push(t);
                    }
                }
            }
        }
        true
    }

    fn filter(&self, c: usize, domains: &mut [Domain], touched: &mut Vec<usize>) -> bool {
        match &self.formulation.constraints[c] {
            Constraint::NotEqual(a, b) => {
                let (a, b) = (a.index(), b.index());
                if let Some(v) = domains[a].fixed() {
                    if domains[b].remove(v) {
                        touched.push(b);
                    }
                }
                if let Some(v) = domains[b].fixed() {
                    if domains[a].remove(v) {
                        touched.push(a);
                    }
                }
                !domains[a].is_empty() && !domains[b].is_empty()
            }
            Constraint::AllDifferent(vars) => {
                for (i, x) in vars.iter().enumerate() {
                    let Some(v) = domains[x.index()].fixed() else {
                        continue;
                    };
                    for (j, y) in vars.iter().enumerate() {
                        if i != j && domains[y.index()].remove(v) {
                            touched.push(y.index());
                            if domains[y.index()].is_empty() {
                                return false;
                            }
                        }
                    }
                }
                // pigeonhole: fewer values left than members to place
                let mut base = i64::MAX;
                for x in vars {
                    match domains[x.index()].min() {
                        Some(min) => base = base.min(min),
                        None => return false,
                    }
                }
                let mut union = BitSet::new();
                for x in vars {
                    for v in domains[x.index()].iter() {
                        union.insert((v - base) as usize);
                    }
                }
                union.len() >= vars.len()
            }
            Constraint::LessOrEqual { lhs, rhs } => {
                let a = lhs.index();
                match rhs {
                    Operand::Const(bound) => {
                        if domains[a].remove_above(*bound) {
                            touched.push(a);
                        }
                        !domains[a].is_empty()
                    }
                    Operand::Var(b) => {
                        let b = b.index();
                        if let Some(hi) = domains[b].max() {
                            if domains[a].remove_above(hi) {
                                touched.push(a);
                            }
                        }
                        if let Some(lo) = domains[a].min() {
                            if domains[b].remove_below(lo) {
                                touched.push(b);
                            }
                        }
                        !domains[a].is_empty() && !domains[b].is_empty()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{LinearExpr, Objective, VarId, Variable};
    use crate::domain::value_objects::Strategy;

    fn solve(f: &Formulation) -> DomainSolution {
        BranchAndBoundSolver::new().solve(f, None).unwrap()
    }

    fn ints(s: &DomainSolution) -> Vec<i64> {
        s.variable_values.iter().map(|v| *v as i64).collect()
    }

    #[test]
    fn domain_operations() {
        let mut d = Domain::new(2, 6);
        assert_eq!(d.len(), 5);
        assert_eq!((d.min(), d.max()), (Some(2), Some(6)));
        assert!(d.remove(4));
        assert!(!d.remove(4));
        assert!(!d.remove(-3));
        assert!(d.remove_above(5));
        assert!(d.remove_below(3));
        assert_eq!(d.iter().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(d.singleton(5).fixed(), Some(5));
        assert!(Domain::new(3, 1).is_empty());
    }

    #[test]
    fn minimizes_a_linear_sum() {
        let mut f = Formulation::new(Strategy::Pairwise);
        let a = f.add_variable(Variable::integer("a", 0, 3));
        let b = f.add_variable(Variable::integer("b", 1, 3));
        let c = f.add_variable(Variable::integer("c", 0, 3));
        f.add_constraint(Constraint::AllDifferent(vec![a, b, c]));
        let f = f.with_objective(Objective::minimize(LinearExpr::sum([a, b, c])));

        let s = solve(&f);
        assert_eq!(s.status, DomainSolutionStatus::Optimal);
        assert_eq!(s.objective_value, Some(3.0));
        assert!(f.is_satisfied_by(&ints(&s)));
    }

    #[test]
    fn negative_coefficients_push_values_up() {
        let mut f = Formulation::new(Strategy::Pairwise);
        let a = f.add_variable(Variable::integer("a", -2, 4));
        let b = f.add_variable(Variable::integer("b", 0, 5));
        f.add_constraint(Constraint::LessOrEqual { lhs: b, rhs: Operand::Var(a) });
        f.add_constraint(Constraint::LessOrEqual { lhs: a, rhs: Operand::Const(3) });
        let f = f.with_objective(Objective::minimize(LinearExpr::new().term(b, -1)));

        let s = solve(&f);
        assert_eq!(s.objective_value, Some(-3.0));
        assert_eq!(ints(&s)[b.index()], 3);
    }

    #[test]
    fn reports_infeasibility() {
        let mut f = Formulation::new(Strategy::CliqueCut);
        let vars: Vec<VarId> = (0..4)
            .map(|i| f.add_variable(Variable::integer(format!("x{}", i), 0, 2)))
            .collect();
        f.add_constraint(Constraint::AllDifferent(vars));
        let s = solve(&f);
        assert_eq!(s.status, DomainSolutionStatus::Infeasible);
        assert!(s.variable_values.is_empty());
        // the pigeonhole check fails at the root
        assert_eq!(s.statistics.nodes_explored, 1);
    }

    #[test]
    fn zero_budget_times_out_without_incumbent() {
        let mut f = Formulation::new(Strategy::Pairwise);
        let a = f.add_variable(Variable::integer("a", 0, 1));
        let b = f.add_variable(Variable::integer("b", 0, 1));
        f.add_constraint(Constraint::NotEqual(a, b));
        let s = BranchAndBoundSolver::new()
            .solve(&f, Some(Duration::ZERO))
            .unwrap();
        assert_eq!(s.status, DomainSolutionStatus::Timeout);
        assert!(s.variable_values.is_empty());
    }

    #[test]
    fn usage_variable_proves_complete_graph_bound() {
        let n = 7;
        let mut f = Formulation::new(Strategy::BoundedByUsage);
        let colors: Vec<VarId> = (0..n)
            .map(|i| f.add_variable(Variable::integer(format!("node_{}", i), 0, n - 1)))
            .collect();
        let k = f.add_variable(Variable::integer("k", 0, n));
        for (i, &u) in colors.iter().enumerate() {
            for &v in &colors[i + 1..] {
                f.add_constraint(Constraint::NotEqual(u, v));
            }
            f.add_constraint(Constraint::LessOrEqual { lhs: u, rhs: Operand::Var(k) });
        }
        f.value_symmetric = colors.clone();
        let f = f.with_objective(Objective::minimize(LinearExpr::new().term(k, 1)));

        let s = solve(&f);
        assert_eq!(s.status, DomainSolutionStatus::Optimal);
        assert_eq!(s.objective_value, Some((n - 1) as f64));
        assert!(s.statistics.nodes_explored < 100);
    }

    #[test]
    fn rejects_invalid_formulation() {
        let mut f = Formulation::new(Strategy::Pairwise);
        let a = f.add_variable(Variable::integer("a", 3, 1));
        f.add_constraint(Constraint::NotEqual(a, VarId(9)));
        assert!(BranchAndBoundSolver::new().solve(&f, None).is_err());
    }
}
