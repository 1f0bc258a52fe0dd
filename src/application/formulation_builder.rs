// Formulation builder: turns a graph and a strategy into solver input

use std::collections::HashSet;

use crate::domain::{
    graph::Graph,
    models::{ColoringConfig, Constraint, Formulation, LinearExpr, Objective, Operand, VarId, Variable},
    solver_service::{Result, SolverError},
    value_objects::{CliqueCutMode, Strategy},
};

/// Builds a fresh [`Formulation`] for one invocation
pub struct FormulationBuilder<'a> {
    graph: &'a Graph,
    config: &'a ColoringConfig,
}

impl<'a> FormulationBuilder<'a> {
    pub fn new(graph: &'a Graph, config: &'a ColoringConfig) -> Self {
        Self { graph, config }
    }

    pub fn build(&self) -> Result<Formulation> {
        let n = self.graph.node_count();
        if n == 0 {
            return Err(SolverError::EmptyGraph);
        }

        let strategy = self.config.strategy;
        let mut formulation = Formulation::new(strategy);
        formulation.index_bounded = self.config.index_bounded_domains;
        formulation.color_vars = self.color_variables(&mut formulation);
        formulation.edges = self.graph.edges().to_vec();

        let formulation = match strategy {
            Strategy::Pairwise => {
                self.edge_constraints(&mut formulation, &HashSet::new());
                Self::label_sum_objective(formulation)
            }
            Strategy::CliqueCut => {
                let covered = self.clique_constraints(&mut formulation);
                let skip = match self.config.clique_mode {
                    CliqueCutMode::Supplement => HashSet::new(),
                    CliqueCutMode::Replace => covered,
                };
                self.edge_constraints(&mut formulation, &skip);
                Self::label_sum_objective(formulation)
            }
            Strategy::BoundedByUsage => {
                self.edge_constraints(&mut formulation, &HashSet::new());
                self.usage_bound(formulation)
            }
        };

        log::info!(
            "formulation ({}): {} variables, {} constraints, {} cliques",
            strategy,
            formulation.num_variables(),
            formulation.num_constraints(),
            formulation.num_cliques
        );
        Ok(formulation)
    }

    fn color_variables(&self, formulation: &mut Formulation) -> Vec<VarId> {
        let n = self.graph.node_count();
        (0..n)
            .map(|node| {
                let upper = if self.config.index_bounded_domains {
                    node
                } else {
                    n - 1
                };
                formulation.add_variable(Variable::integer(format!("node_{}", node), 0, upper as i64))
            })
            .collect()
    }

    /// One `≠` per edge, skipping the edges listed in `skip`
    fn edge_constraints(&self, formulation: &mut Formulation, skip: &HashSet<(usize, usize)>) {
        for &(u, v) in self.graph.edges() {
            if skip.contains(&(u, v)) {
                continue;
            }
            let (a, b) = (formulation.color_vars[u], formulation.color_vars[v]);
            formulation.add_constraint(Constraint::NotEqual(a, b));
        }
    }

    /// One all-different per enumerated maximal clique. Returns the edges the
    /// cliques cover.
    fn clique_constraints(&self, formulation: &mut Formulation) -> HashSet<(usize, usize)> {
        let enumeration = self.graph.cliques_within(&self.config.clique_budget);
        if !enumeration.complete {
            log::warn!(
                "clique enumeration stopped by its budget after {} cliques",
                enumeration.cliques.len()
            );
        }

        let mut covered = HashSet::new();
        for clique in &enumeration.cliques {
            let vars = clique
                .members()
                .iter()
                .map(|&node| formulation.color_vars[node])
                .collect();
            formulation.add_constraint(Constraint::AllDifferent(vars));
            covered.extend(clique.pairs());
        }
        formulation.num_cliques = enumeration.cliques.len();
        covered
    }

    /// Historical objective: minimize the sum of the color labels. A proxy
    /// only, it does not always minimize the number of distinct colors.
    fn label_sum_objective(formulation: Formulation) -> Formulation {
        let expr = LinearExpr::sum(formulation.color_vars.iter().copied());
        formulation.with_objective(Objective::minimize(expr))
    }

    /// `k ≥ color_of[node]` for every node, minimize `k`
    fn usage_bound(&self, mut formulation: Formulation) -> Formulation {
        let n = self.graph.node_count() as i64;
        let k = formulation.add_variable(Variable::integer("colors_used", 0, n));
        for node in 0..formulation.color_vars.len() {
            let lhs = formulation.color_vars[node];
            formulation.add_constraint(Constraint::LessOrEqual {
                lhs,
                rhs: Operand::Var(k),
            });
        }
        formulation.usage_var = Some(k);
        if !self.config.index_bounded_domains {
            formulation.value_symmetric = formulation.color_vars.clone();
        }
        formulation.with_objective(Objective::minimize(LinearExpr::new().term(k, 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::graph::CliqueBudget;

    fn triangle_with_tail() -> Graph {
        Graph::build(4, &[(0, 1), (1, 2), (0, 2), (2, 3)]).unwrap()
    }

    fn count<F: Fn(&Constraint) -> bool>(f: &Formulation, pred: F) -> usize {
        f.constraints.iter().filter(|c| pred(c)).count()
    }

    fn is_not_equal(c: &Constraint) -> bool {
        matches!(c, Constraint::NotEqual(..))
    }

    fn is_all_different(c: &Constraint) -> bool {
        matches!(c, Constraint::AllDifferent(_))
    }

    #[test]
    fn empty_graph_short_circuits() {
        let g = Graph::build(0, &[]).unwrap();
        let config = ColoringConfig::default();
        assert!(matches!(
            FormulationBuilder::new(&g, &config).build(),
            Err(SolverError::EmptyGraph)
        ));
    }

    #[test]
    fn pairwise_has_one_constraint_per_edge() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::Pairwise);
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        assert_eq!(f.num_variables(), 4);
        assert_eq!(count(&f, is_not_equal), 4);
        assert!(f.variables.iter().all(|v| v.lower_bound == 0 && v.upper_bound == 3));
        assert_eq!(f.objective.expr.terms().len(), 4);
        assert!(f.usage_var.is_none());
        assert!(f.value_symmetric.is_empty());
    }

    #[test]
    fn clique_cut_supplements_edges_by_default() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::CliqueCut);
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        assert_eq!(f.num_cliques, 2);
        assert_eq!(count(&f, is_all_different), 2);
        assert_eq!(count(&f, is_not_equal), 4);
    }

    #[test]
    fn clique_cut_replace_drops_covered_edges() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::CliqueCut).with_clique_mode(CliqueCutMode::Replace);
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        assert_eq!(count(&f, is_all_different), 2);
        assert_eq!(count(&f, is_not_equal), 0);
    }

    #[test]
    fn replace_keeps_edges_outside_the_budget() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::CliqueCut)
            .with_clique_mode(CliqueCutMode::Replace)
            .with_clique_budget(CliqueBudget::unlimited().with_max_cliques(1));
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        assert_eq!(f.num_cliques, 1);
        // whichever clique came first, the other one's edges stay pairwise
        assert!(count(&f, is_not_equal) >= 1);
        let all_colors_equal = vec![0; 4];
        assert!(!f.is_satisfied_by(&all_colors_equal));
    }

    #[test]
    fn usage_bound_adds_k() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::BoundedByUsage);
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        let k = f.usage_var.unwrap();
        assert_eq!(f.num_variables(), 5);
        assert_eq!(f.variables[k.index()].upper_bound, 4);
        assert_eq!(f.objective.single_variable(), Some(k));
        assert_eq!(
            count(&f, |c| matches!(c, Constraint::LessOrEqual { rhs: Operand::Var(v), .. } if *v == k)),
            4
        );
        assert_eq!(f.value_symmetric.len(), 4);
        assert!(f.is_satisfied_by(&[0, 1, 2, 0, 2]));
        assert!(!f.is_satisfied_by(&[0, 1, 2, 0, 1]));
    }

    #[test]
    fn index_bounded_domains() {
        let g = triangle_with_tail();
        let config = ColoringConfig::new(Strategy::BoundedByUsage).with_index_bounded_domains(true);
        let f = FormulationBuilder::new(&g, &config).build().unwrap();
        let uppers: Vec<_> = f.color_vars.iter().map(|v| f.variables[v.index()].upper_bound).collect();
        assert_eq!(uppers, vec![0, 1, 2, 3]);
        assert!(f.index_bounded);
        assert!(f.value_symmetric.is_empty());
    }
}
