use std::collections::HashSet;
use std::time::{Duration, Instant};

use bit_set::BitSet;

use super::solver_service::{Result, SolverError};

/// Undirected simple graph, immutable once built
#[derive(Debug, Clone)]
pub struct Graph {
    node_count: usize,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
    neighbor_sets: Vec<BitSet>,
}

impl Graph {
    /// Build a graph, rejecting out-of-range endpoints and self-loops.
    /// Duplicate edges (in either orientation) are kept once.
    pub fn build(node_count: usize, edge_list: &[(usize, usize)]) -> Result<Self> {
        let mut seen = HashSet::with_capacity(edge_list.len());
        let mut edges = Vec::with_capacity(edge_list.len());
        let mut adjacency = vec![Vec::new(); node_count];
        let mut neighbor_sets = vec![BitSet::with_capacity(node_count); node_count];

        for (i, &(u, v)) in edge_list.iter().enumerate() {
            if u >= node_count || v >= node_count {
                return Err(SolverError::MalformedInstance(format!(
                    "edge {} ({}, {}) has an endpoint outside [0, {})",
                    i, u, v, node_count
                )));
            }
            if u == v {
                return Err(SolverError::MalformedInstance(format!(
                    "edge {} is a self-loop on node {}",
                    i, u
                )));
            }
            let edge = (u.min(v), u.max(v));
            if !seen.insert(edge) {
                log::debug!("ignoring duplicate edge ({}, {})", u, v);
                continue;
            }
            edges.push(edge);
            adjacency[u].push(v);
            adjacency[v].push(u);
            neighbor_sets[u].insert(v);
            neighbor_sets[v].insert(u);
        }

        for list in adjacency.iter_mut() {
            list.sort_unstable();
        }

        Ok(Self {
            node_count,
            edges,
            adjacency,
            neighbor_sets,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges as `(min, max)` pairs in input order
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Sorted neighbors of `node`
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    pub fn max_degree(&self) -> usize {
        (0..self.node_count).map(|n| self.degree(n)).max().unwrap_or(0)
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        u < self.node_count && self.neighbor_sets[u].contains(v)
    }

    /// Lazy Bron–Kerbosch enumeration of the maximal cliques with at least
    /// two members. Every call starts over from scratch.
    pub fn enumerate_maximal_cliques(&self) -> MaximalCliques<'_> {
        MaximalCliques::new(self, None)
    }

    /// Enumerate maximal cliques until the budget runs out
    pub fn cliques_within(&self, budget: &CliqueBudget) -> CliqueEnumeration {
        let deadline = budget.time_limit.map(|t| Instant::now() + t);
        let mut iter = MaximalCliques::new(self, deadline);
        let mut cliques = Vec::new();
        let mut complete = true;

        loop {
            if let Some(max) = budget.max_cliques {
                if cliques.len() >= max {
                    // frames left on the stack may hold nothing maximal
                    complete = iter.next().is_none() && !iter.timed_out();
                    break;
                }
            }
            match iter.next() {
                Some(clique) => cliques.push(clique),
                None => {
                    complete = !iter.timed_out();
                    break;
                }
            }
        }

        CliqueEnumeration { cliques, complete }
    }
}

/// Set of pairwise adjacent nodes, members sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clique {
    members: Vec<usize>,
}

impl Clique {
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.members.binary_search(&node).is_ok()
    }

    /// Every unordered pair of members, as `(min, max)`
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.members
            .iter()
            .enumerate()
            .flat_map(move |(i, &u)| self.members[i + 1..].iter().map(move |&v| (u, v)))
    }
}

/// Limits put on clique enumeration, which is exponential in the worst case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliqueBudget {
    pub max_cliques: Option<usize>,
    pub time_limit: Option<Duration>,
}

impl CliqueBudget {
    pub fn unlimited() -> Self {
        Self {
            max_cliques: None,
            time_limit: None,
        }
    }

    pub fn with_max_cliques(mut self, max: usize) -> Self {
        self.max_cliques = Some(max);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Default for CliqueBudget {
    fn default() -> Self {
        Self {
            max_cliques: Some(10_000),
            time_limit: Some(Duration::from_secs(2)),
        }
    }
}

/// Outcome of a budgeted enumeration
#[derive(Debug, Clone)]
pub struct CliqueEnumeration {
    pub cliques: Vec<Clique>,
    /// `false` when the budget cut the enumeration short
    pub complete: bool,
}

struct Frame {
    r: Vec<usize>,
    p: BitSet,
    x: BitSet,
    candidates: Vec<usize>,
    next: usize,
}

/// Iterator over the maximal cliques of a graph (Bron–Kerbosch with pivoting,
/// driven by an explicit stack so cliques are produced one at a time)
pub struct MaximalCliques<'g> {
    graph: &'g Graph,
    stack: Vec<Frame>,
    deadline: Option<Instant>,
    timed_out: bool,
}

impl<'g> MaximalCliques<'g> {
    fn new(graph: &'g Graph, deadline: Option<Instant>) -> Self {
        let mut iter = Self {
            graph,
            stack: Vec::new(),
            deadline,
            timed_out: false,
        };
        if graph.node_count > 0 {
            let p: BitSet = (0..graph.node_count).collect();
            let x = BitSet::with_capacity(graph.node_count);
            iter.push(Vec::new(), p, x);
        }
        iter
    }

    /// Whether the deadline stopped the enumeration
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn push(&mut self, r: Vec<usize>, p: BitSet, x: BitSet) {
        let pivot = p
            .iter()
            .chain(x.iter())
            .max_by_key(|&u| p.intersection(&self.graph.neighbor_sets[u]).count())
            .unwrap_or(0);
        let candidates = p
            .iter()
            .filter(|&v| !self.graph.neighbor_sets[pivot].contains(v))
            .collect();
        self.stack.push(Frame {
            r,
            p,
            x,
            candidates,
            next: 0,
        });
    }
}

impl Iterator for MaximalCliques<'_> {
    type Item = Clique;

    fn next(&mut self) -> Option<Clique> {
        loop {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                    self.stack.clear();
                    return None;
                }
            }

            let frame = self.stack.last_mut()?;
            if frame.next >= frame.candidates.len() {
                self.stack.pop();
                continue;
            }
            let v = frame.candidates[frame.next];
            frame.next += 1;

            let neighbors = &self.graph.neighbor_sets[v];
            let mut p = frame.p.clone();
            p.intersect_with(neighbors);
            let mut x = frame.x.clone();
            x.intersect_with(neighbors);
            let mut r = frame.r.clone();
            r.push(v);

            frame.p.remove(v);
            frame.x.insert(v);

            if p.is_empty() {
                if x.is_empty() && r.len() >= 2 {
                    r.sort_unstable();
                    return Some(Clique { members: r });
                }
                continue;
            }
            self.push(r, p, x);
        }
    }
}
