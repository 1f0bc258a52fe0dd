// Coloring use case: parse → build → solve → decode → render

use crate::application::{FormulationBuilder, SolutionDecoder};
use crate::domain::{
    coloring::SolveResult,
    graph::Graph,
    instance::parse_instance,
    models::ColoringConfig,
    solver_service::{Result, SolverError},
    value_objects::SolutionStatus,
};
use crate::solver::SolverFactory;

/// Runs independent coloring invocations with one configuration.
///
/// Holds no state between calls: every invocation builds its own graph,
/// formulation and solver session and drops them afterwards.
pub struct ColoringService {
    config: ColoringConfig,
}

impl ColoringService {
    pub fn new(config: ColoringConfig) -> Self {
        Self { config }
    }

    /// Parse, solve and render one instance in the two-line output format
    pub fn run(&self, input: &str) -> Result<String> {
        self.solve_instance(input)?.render()
    }

    pub fn solve_instance(&self, input: &str) -> Result<SolveResult> {
        let graph = parse_instance(input).inspect_err(|e| {
            log::error!("{} ({} bytes of input)", e, input.len());
        })?;
        self.solve_graph(&graph)
    }

    pub fn solve_graph(&self, graph: &Graph) -> Result<SolveResult> {
        let strategy = self.config.strategy;
        log::info!(
            "coloring {} nodes / {} edges with strategy {}",
            graph.node_count(),
            graph.edge_count(),
            strategy
        );

        let formulation = match FormulationBuilder::new(graph, &self.config).build() {
            Ok(formulation) => formulation,
            Err(SolverError::EmptyGraph) => {
                log::info!("empty graph, nothing to color");
                return Ok(SolveResult::empty(strategy));
            }
            Err(e) => return Err(self.report(graph, e)),
        };

        let solver = SolverFactory::create_from_backend(self.config.backend)
            .map_err(|e| self.report(graph, e))?;
        log::info!("using solver: {}", solver.name());

        let raw = solver
            .solve(&formulation, self.config.time_budget)
            .map_err(|e| self.report(graph, e))?;
        log::info!("solver status: {} ({})", raw.status, raw.message);

        let mut result =
            SolutionDecoder::decode(&formulation, &raw).map_err(|e| self.report(graph, e))?;

        if result.status == SolutionStatus::Timeout {
            let e = SolverError::TimeoutNoIncumbent {
                node_count: graph.node_count(),
                strategy,
                budget: self.config.time_budget,
            };
            return Err(self.report(graph, e));
        }

        result.assignment = result.assignment.map(|a| a.normalized());
        log::info!(
            "{} colors ({}), {} nodes explored in {:.1} ms",
            result.colors_used,
            result.status,
            result.statistics.nodes_explored,
            result.statistics.solve_time_ms
        );
        Ok(result)
    }

    fn report(&self, graph: &Graph, e: SolverError) -> SolverError {
        log::error!(
            "{} (nodes: {}, edges: {}, strategy: {}, budget: {:?})",
            e,
            graph.node_count(),
            graph.edge_count(),
            self.config.strategy,
            self.config.time_budget
        );
        e
    }
}
