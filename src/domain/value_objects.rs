// Domain value objects representing core coloring concepts

use std::fmt;
use std::str::FromStr;

use super::solver_service::SolverError;

/// Type of a column in a linearised formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Integer number within its bounds (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Which constraints and objective the formulation builder emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One "not-equal" per edge, minimize the sum of color labels.
    ///
    /// The sum of labels is only a proxy: relabeling can lower the sum
    /// without lowering the number of distinct colors, so this strategy does
    /// not reliably minimize the color count.
    Pairwise,
    /// Pairwise edges plus one "all-different" per enumerated maximal clique,
    /// still with the sum-of-labels objective (same caveat as `Pairwise`).
    CliqueCut,
    /// Pairwise edges plus an explicit `k ≥ color_of[i]` usage variable,
    /// minimizing `k`. The only strategy whose objective is the color count.
    BoundedByUsage,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::Pairwise,
        Strategy::CliqueCut,
        Strategy::BoundedByUsage,
    ];

    /// Whether the objective of this strategy measures the number of colors
    pub fn minimizes_color_count(&self) -> bool {
        matches!(self, Strategy::BoundedByUsage)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Pairwise => write!(f, "pairwise"),
            Strategy::CliqueCut => write!(f, "clique-cut"),
            Strategy::BoundedByUsage => write!(f, "bounded-by-usage"),
        }
    }
}

impl FromStr for Strategy {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "pairwise" => Ok(Strategy::Pairwise),
            "clique-cut" | "cliquecut" => Ok(Strategy::CliqueCut),
            "bounded-by-usage" | "boundedbyusage" => Ok(Strategy::BoundedByUsage),
            _ => Err(SolverError::StrategyUnsupported(s.to_string())),
        }
    }
}

/// How clique cuts interact with the per-edge constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CliqueCutMode {
    /// Keep every edge constraint, cliques only add pruning
    #[default]
    Supplement,
    /// Drop the edge constraints already covered by an enumerated clique
    Replace,
}

/// Status of a solve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found and proved an optimal solution
    Optimal,
    /// Found a feasible solution, optimality not proven
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Time budget exhausted without any incumbent
    Timeout,
    /// The backend could not determine anything useful
    Unknown,
}

impl SolutionStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::Feasible)
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Feasible => write!(f, "Feasible"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Timeout => write!(f, "Time Limit Reached"),
            SolutionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverBackend {
    /// Automatically select best solver
    #[default]
    Auto,
    /// Built-in depth-first branch and bound
    BranchAndBound,
    /// COIN-OR CBC solver
    CoinCbc,
    /// HiGHS solver
    Highs,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Auto => write!(f, "Auto"),
            SolverBackend::BranchAndBound => write!(f, "Branch and Bound"),
            SolverBackend::CoinCbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}

impl FromStr for SolverBackend {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "auto" => Ok(SolverBackend::Auto),
            "branch-and-bound" | "bnb" | "bb" => Ok(SolverBackend::BranchAndBound),
            "coin-cbc" | "cbc" => Ok(SolverBackend::CoinCbc),
            "highs" => Ok(SolverBackend::Highs),
            _ => Err(SolverError::SolverNotAvailable(s.to_string())),
        }
    }
}

fn normalize_name(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}
