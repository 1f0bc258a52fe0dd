use clap::Parser;
use letsopt_coloring::{
    CliqueBudget, CliqueCutMode, ColoringConfig, ColoringService, SolverBackend, Strategy,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Minimum graph coloring through a constraint formulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Instance file: `<nodes> <edges>` then one `<u> <v>` line per edge
    file: PathBuf,
    /// pairwise, clique-cut or bounded-by-usage
    #[arg(short, long, default_value = "bounded-by-usage")]
    strategy: Strategy,
    /// Wall-clock budget of the search in seconds (unbounded if absent)
    #[arg(short, long)]
    time_limit: Option<f64>,
    /// Stop clique enumeration after this many cliques
    #[arg(long, default_value_t = 10_000)]
    max_cliques: usize,
    /// Stop clique enumeration after this many seconds
    #[arg(long, default_value_t = 2.0)]
    clique_time_limit: f64,
    /// Drop edge constraints already covered by a clique cut
    #[arg(long)]
    replace_edges: bool,
    /// Restrict node i to colors [0, i] (heuristic)
    #[arg(long)]
    index_bounded_domains: bool,
    /// auto, branch-and-bound, cbc or highs
    #[arg(short, long, default_value = "auto")]
    backend: SolverBackend,
}

impl Args {
    fn config(&self) -> ColoringConfig {
        let mut config = ColoringConfig::new(self.strategy)
            .with_clique_budget(
                CliqueBudget::unlimited()
                    .with_max_cliques(self.max_cliques)
                    .with_time_limit(seconds(self.clique_time_limit)),
            )
            .with_clique_mode(if self.replace_edges {
                CliqueCutMode::Replace
            } else {
                CliqueCutMode::Supplement
            })
            .with_index_bounded_domains(self.index_bounded_domains)
            .with_backend(self.backend);
        if let Some(limit) = self.time_limit {
            config = config.with_time_budget(seconds(limit));
        }
        config
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let input = match std::fs::read_to_string(&args.file) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("cannot read {}: {}", args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let service = ColoringService::new(args.config());
    match service.run(&input) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
