// Linearisation of a coloring formulation for MIP backends
//
// `≠` has no linear form, so each one becomes a disjunction
//   x_a - x_b ≥ 1   or   x_b - x_a ≥ 1
// selected by a fresh binary y and a big-M large enough to relax the other
// side:  x_a - x_b + M·y ≥ 1   and   x_b - x_a - M·y ≥ 1 - M.

use crate::domain::models::{Constraint, Formulation, Operand, VarId};
use crate::domain::value_objects::VariableType;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub lower: f64,
    pub upper: f64,
    pub variable_type: VariableType,
}

/// `lower ≤ Σ coeff·col` (the only row shape the translation needs)
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub terms: Vec<(usize, f64)>,
    pub lower: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    /// The first `num_original` columns are the formulation variables, in
    /// `VarId` order; the rest are disjunction binaries
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub objective: Vec<(usize, f64)>,
    pub objective_constant: f64,
    pub num_original: usize,
}

impl LinearModel {
    pub fn from_formulation(formulation: &Formulation) -> Self {
        let mut model = LinearModel {
            columns: formulation
                .variables
                .iter()
                .map(|v| Column {
                    lower: v.lower_bound as f64,
                    upper: v.upper_bound as f64,
                    variable_type: VariableType::Integer,
                })
                .collect(),
            num_original: formulation.num_variables(),
            ..Default::default()
        };

        for constraint in &formulation.constraints {
            match constraint {
                Constraint::NotEqual(a, b) => model.not_equal(formulation, *a, *b),
                Constraint::AllDifferent(vars) => {
                    for (i, &a) in vars.iter().enumerate() {
                        for &b in &vars[i + 1..] {
                            model.not_equal(formulation, a, b);
                        }
                    }
                }
                Constraint::LessOrEqual { lhs, rhs } => match rhs {
                    // rhs - lhs ≥ 0
                    Operand::Var(v) => model.rows.push(Row {
                        terms: vec![(v.index(), 1.0), (lhs.index(), -1.0)],
                        lower: 0.0,
                    }),
                    // -lhs ≥ -c
                    Operand::Const(c) => model.rows.push(Row {
                        terms: vec![(lhs.index(), -1.0)],
                        lower: -(*c as f64),
                    }),
                },
            }
        }

        model.objective = formulation
            .objective
            .expr
            .terms()
            .iter()
            .map(|(v, c)| (v.index(), *c as f64))
            .collect();
        model.objective_constant = formulation.objective.expr.constant() as f64;
        model
    }

    fn not_equal(&mut self, formulation: &Formulation, a: VarId, b: VarId) {
        let va = &formulation.variables[a.index()];
        let vb = &formulation.variables[b.index()];
        let big_m = 1 + (va.upper_bound - vb.lower_bound).max(vb.upper_bound - va.lower_bound);
        let big_m = big_m.max(1) as f64;

        let y = self.columns.len();
        self.columns.push(Column {
            lower: 0.0,
            upper: 1.0,
            variable_type: VariableType::Binary,
        });
        self.rows.push(Row {
            terms: vec![(a.index(), 1.0), (b.index(), -1.0), (y, big_m)],
            lower: 1.0,
        });
        self.rows.push(Row {
            terms: vec![(b.index(), 1.0), (a.index(), -1.0), (y, -big_m)],
            lower: 1.0 - big_m,
        });
    }

    pub fn num_binaries(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.variable_type == VariableType::Binary)
            .count()
    }

    /// Values of the formulation variables, as the backend returned them.
    /// Integrality and constraints are left to the decoder.
    pub fn formulation_values(&self, columns: &[f64]) -> Vec<f64> {
        columns.iter().take(self.num_original).copied().collect()
    }

    pub fn objective_value(&self, columns: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|&(i, coeff)| coeff * columns[i])
            .sum::<f64>()
            + self.objective_constant
    }

    /// Whether the columns returned after a stop on a limit hold an actual
    /// incumbent rather than the backend's placeholder values
    pub fn holds_incumbent(&self, formulation: &Formulation, columns: &[f64]) -> bool {
        let rounded: Vec<i64> = self
            .formulation_values(columns)
            .iter()
            .map(|v| v.round() as i64)
            .collect();
        formulation.is_satisfied_by(&rounded)
    }
}
