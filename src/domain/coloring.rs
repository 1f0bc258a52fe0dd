use std::collections::HashSet;
use std::fmt;

use super::graph::Graph;
use super::models::SolverStatistics;
use super::solver_service::{Result, SolverError};
use super::value_objects::{SolutionStatus, Strategy};

/// Color of every node, indexed by node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorAssignment {
    colors: Vec<usize>,
}

impl ColorAssignment {
    pub fn new(colors: Vec<usize>) -> Self {
        Self { colors }
    }

    pub fn color_of(&self, node: usize) -> usize {
        self.colors[node]
    }

    pub fn colors(&self) -> &[usize] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Number of distinct colors appearing in the assignment
    pub fn colors_used(&self) -> usize {
        self.colors.iter().collect::<HashSet<_>>().len()
    }

    /// First edge whose endpoints share a color
    pub fn conflict(&self, graph: &Graph) -> Option<(usize, usize)> {
        graph
            .edges()
            .iter()
            .copied()
            .find(|&(u, v)| self.colors[u] == self.colors[v])
    }

    pub fn is_proper(&self, graph: &Graph) -> bool {
        self.colors.len() == graph.node_count() && self.conflict(graph).is_none()
    }

    /// Same partition into color classes, relabeled 0, 1, 2, ... by first
    /// appearance in node order
    pub fn normalized(&self) -> Self {
        let mut relabel = std::collections::HashMap::new();
        let colors = self
            .colors
            .iter()
            .map(|c| {
                let next = relabel.len();
                *relabel.entry(*c).or_insert(next)
            })
            .collect();
        Self { colors }
    }
}

impl fmt::Display for ColorAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.colors.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Decoded outcome of one coloring invocation
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolutionStatus,
    /// Present iff `status` is `Optimal` or `Feasible`
    pub assignment: Option<ColorAssignment>,
    /// Distinct colors in `assignment`, 0 when there is none
    pub colors_used: usize,
    pub strategy: Strategy,
    pub statistics: SolverStatistics,
}

impl SolveResult {
    pub fn new(status: SolutionStatus, strategy: Strategy, assignment: Option<ColorAssignment>) -> Self {
        let colors_used = assignment.as_ref().map_or(0, |a| a.colors_used());
        Self {
            status,
            assignment,
            colors_used,
            strategy,
            statistics: SolverStatistics::default(),
        }
    }

    /// Trivial answer for a graph without nodes
    pub fn empty(strategy: Strategy) -> Self {
        Self::new(
            SolutionStatus::Optimal,
            strategy,
            Some(ColorAssignment::default()),
        )
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    /// Render the two-line output format, failing when nothing was found
    pub fn render(&self) -> Result<String> {
        match self.assignment {
            Some(_) => Ok(self.to_string()),
            None => Err(SolverError::ExecutionFailed(format!(
                "no coloring to render (status: {})",
                self.status
            ))),
        }
    }
}

impl fmt::Display for SolveResult {
    /// `<colors_used> <is_optimal>` then the color of every node
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.colors_used, u8::from(self.is_optimal()))?;
        match &self.assignment {
            Some(assignment) => write!(f, "{}", assignment),
            None => Ok(()),
        }
    }
}
