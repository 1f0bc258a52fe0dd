use std::time::Duration;

use letsopt_coloring::{
    CliqueBudget, CliqueCutMode, ColoringConfig, ColoringService, FormulationBuilder, Graph,
    SolutionStatus, SolveResult, SolverError, Strategy,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn solve_with(input: &str, config: ColoringConfig) -> SolveResult {
    init();
    ColoringService::new(config)
        .solve_instance(input)
        .expect("solve failed")
}

fn solve(input: &str, strategy: Strategy) -> SolveResult {
    solve_with(input, ColoringConfig::new(strategy))
}

fn instance(n: usize, edges: &[(usize, usize)]) -> String {
    let mut text = format!("{} {}\n", n, edges.len());
    for (u, v) in edges {
        text.push_str(&format!("{} {}\n", u, v));
    }
    text
}

fn complete(n: usize) -> String {
    let edges: Vec<_> = (0..n).flat_map(|u| (u + 1..n).map(move |v| (u, v))).collect();
    instance(n, &edges)
}

fn cycle(n: usize) -> String {
    let edges: Vec<_> = (0..n).map(|u| (u, (u + 1) % n)).collect();
    instance(n, &edges)
}

fn petersen() -> String {
    let mut edges = Vec::new();
    for i in 0..5 {
        edges.push((i, (i + 1) % 5));
        edges.push((i, i + 5));
        edges.push((5 + i, 5 + (i + 2) % 5));
    }
    instance(10, &edges)
}

/// `1` only where the objective is the color count
fn optimal_flag(strategy: Strategy) -> u8 {
    u8::from(strategy.minimizes_color_count())
}

fn assert_proper(input: &str, result: &SolveResult) {
    let graph: Graph = input.parse().unwrap();
    let assignment = result.assignment.as_ref().expect("no assignment");
    assert!(assignment.is_proper(&graph), "{:?}", assignment);
    assert_eq!(result.colors_used, assignment.colors_used());
}

#[test]
fn path_of_four_nodes() {
    for strategy in Strategy::ALL {
        let result = solve("4 3\n0 1\n1 2\n2 3", strategy);
        assert_eq!(result.colors_used, 2, "{}", strategy);
        assert_eq!(
            result.render().unwrap(),
            format!("2 {}\n0 1 0 1", optimal_flag(strategy))
        );
    }
}

#[test]
fn triangle() {
    for strategy in Strategy::ALL {
        let result = solve("3 3\n0 1\n1 2\n0 2", strategy);
        assert_eq!(result.colors_used, 3, "{}", strategy);
        assert_proper("3 3\n0 1\n1 2\n0 2", &result);
    }
}

#[test]
fn complete_graphs_need_every_color() {
    for n in 1..=6 {
        let input = complete(n);
        let result = solve(&input, Strategy::BoundedByUsage);
        assert_eq!(result.colors_used, n);
        assert!(result.is_optimal());
        assert_proper(&input, &result);
    }
    for strategy in [Strategy::Pairwise, Strategy::CliqueCut] {
        let result = solve(&complete(5), strategy);
        assert_eq!(result.colors_used, 5);
        assert_eq!(result.status, SolutionStatus::Feasible);
    }
}

#[test]
fn edgeless_graph_uses_one_color() {
    for strategy in Strategy::ALL {
        let result = solve("6 0\n", strategy);
        assert_eq!(result.colors_used, 1);
        assert_eq!(
            result.render().unwrap(),
            format!("1 {}\n0 0 0 0 0 0", optimal_flag(strategy))
        );
    }
}

#[test]
fn empty_graph() {
    for strategy in Strategy::ALL {
        let result = solve("0 0\n", strategy);
        assert_eq!(result.colors_used, 0);
        assert!(result.assignment.as_ref().unwrap().is_empty());
        assert_eq!(result.render().unwrap(), "0 1\n");
    }
}

#[test]
fn cycles() {
    assert_eq!(solve(&cycle(6), Strategy::BoundedByUsage).colors_used, 2);
    assert_eq!(solve(&cycle(7), Strategy::BoundedByUsage).colors_used, 3);
    assert_eq!(solve(&cycle(5), Strategy::CliqueCut).colors_used, 3);
}

#[test]
fn petersen_graph() {
    let input = petersen();
    let result = solve(&input, Strategy::BoundedByUsage);
    assert_eq!(result.colors_used, 3);
    assert!(result.is_optimal());
    assert_proper(&input, &result);

    for strategy in [Strategy::Pairwise, Strategy::CliqueCut] {
        let config = ColoringConfig::new(strategy).with_time_budget(Duration::from_secs(2));
        let result = solve_with(&input, config);
        assert!(result.status.has_solution());
        assert!(result.colors_used >= 3);
        assert_proper(&input, &result);
    }
}

#[test]
fn label_sum_strategies_never_claim_a_minimum() {
    // double star: chromatic number 2, least label sum needs 3 colors
    let input = "8 7\n0 1\n0 2\n0 3\n0 4\n1 5\n1 6\n1 7";

    let usage = solve(input, Strategy::BoundedByUsage);
    assert_eq!(usage.render().unwrap().lines().next(), Some("2 1"));

    for strategy in [Strategy::Pairwise, Strategy::CliqueCut] {
        let result = solve(input, strategy);
        assert_proper(input, &result);
        assert_eq!(result.status, SolutionStatus::Feasible, "{}", strategy);
        assert!(result.colors_used >= usage.colors_used);
        assert!(result.render().unwrap().lines().next().unwrap().ends_with(" 0"));
    }
}

#[test]
fn repeated_runs_agree_on_the_count() {
    for strategy in Strategy::ALL {
        let first = solve(&cycle(7), strategy);
        let second = solve(&cycle(7), strategy);
        assert_eq!(first.colors_used, second.colors_used, "{}", strategy);
        assert_eq!(first.status, second.status);
    }
    let first = solve(&petersen(), Strategy::BoundedByUsage);
    let second = solve(&petersen(), Strategy::BoundedByUsage);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn clique_replace_rejects_what_pairwise_rejects() {
    // triangle with a pendant path and a chord-free square
    let edges = [(0, 1), (1, 2), (0, 2), (2, 3), (3, 4), (4, 5), (5, 3)];
    let graph = Graph::build(6, &edges).unwrap();
    let pairwise_config = ColoringConfig::new(Strategy::Pairwise);
    let replace_config = ColoringConfig::new(Strategy::CliqueCut)
        .with_clique_mode(CliqueCutMode::Replace)
        .with_clique_budget(CliqueBudget::unlimited());
    let pairwise = FormulationBuilder::new(&graph, &pairwise_config).build().unwrap();
    let replace = FormulationBuilder::new(&graph, &replace_config).build().unwrap();

    let n = graph.node_count();
    let mut values = vec![0i64; n];
    let total = 3usize.pow(n as u32);
    for code in 0..total {
        let mut c = code;
        for v in values.iter_mut() {
            *v = (c % 3) as i64;
            c /= 3;
        }
        assert_eq!(
            pairwise.is_satisfied_by(&values),
            replace.is_satisfied_by(&values),
            "{:?}",
            values
        );
    }
}

#[test]
fn clique_replace_solves_like_supplement() {
    let input = petersen();
    let supplement = solve(&cycle(7), Strategy::CliqueCut);
    let replace = solve_with(
        &cycle(7),
        ColoringConfig::new(Strategy::CliqueCut).with_clique_mode(CliqueCutMode::Replace),
    );
    assert_eq!(supplement.colors_used, replace.colors_used);

    let config = ColoringConfig::new(Strategy::CliqueCut)
        .with_clique_mode(CliqueCutMode::Replace)
        .with_time_budget(Duration::from_secs(2));
    assert_proper(&input, &solve_with(&input, config));
}

#[test]
fn clique_budget_does_not_break_feasibility() {
    let input = complete(5);
    let config = ColoringConfig::new(Strategy::CliqueCut)
        .with_clique_mode(CliqueCutMode::Replace)
        .with_clique_budget(CliqueBudget::unlimited().with_max_cliques(0));
    let result = solve_with(&input, config);
    assert_eq!(result.colors_used, 5);
}

#[test]
fn index_bounded_domains_are_never_reported_optimal() {
    let config = ColoringConfig::new(Strategy::BoundedByUsage).with_index_bounded_domains(true);
    let result = solve_with(&petersen(), config);
    assert_eq!(result.status, SolutionStatus::Feasible);
    assert_eq!(result.colors_used, 3);
    assert_eq!(result.to_string().lines().next(), Some("3 0"));
}

#[test]
fn malformed_instances_fail() {
    init();
    let service = ColoringService::new(ColoringConfig::default());
    for input in ["", "3 1\n0 3", "2 1\n1 1", "2 2\n0 1", "a b"] {
        assert!(
            matches!(service.run(input), Err(SolverError::MalformedInstance(_))),
            "{:?}",
            input
        );
    }
}

#[test]
fn unsupported_strategy_name() {
    assert!(matches!(
        "dsatur".parse::<Strategy>(),
        Err(SolverError::StrategyUnsupported(_))
    ));
}

#[test]
fn no_time_is_no_incumbent() {
    init();
    let config = ColoringConfig::new(Strategy::BoundedByUsage).with_time_budget(Duration::ZERO);
    let error = ColoringService::new(config).run(&petersen()).unwrap_err();
    assert!(matches!(error, SolverError::TimeoutNoIncumbent { node_count: 10, .. }));
    assert!(error.to_string().contains("bounded-by-usage"));
}
