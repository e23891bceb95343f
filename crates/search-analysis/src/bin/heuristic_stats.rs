use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use search_analysis::config::AnalysisConfig;
use search_analysis::stats::compute_statistics;
use search_analysis::{AnalysisOptions, validate_corpus};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Print Kendall's tau and mean heuristic ratio per blend configuration"
)]
struct Cli {
    /// Root directory containing driver logs (optionally .gz)
    #[arg(long, value_name = "DIR")]
    logs: PathBuf,

    /// Analysis settings (TOML); defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reference optimal costs (TOML or JSON) replacing the derived ones
    #[arg(long, value_name = "FILE")]
    reference: Option<PathBuf>,

    /// Blend coefficients to evaluate (repeatable); overrides the config
    #[arg(long = "epsilon", value_name = "EPS")]
    epsilons: Vec<f64>,

    /// Number of worker threads (defaults to Rayon default)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_toml(path)?,
        None => AnalysisConfig::default(),
    };
    if !cli.epsilons.is_empty() {
        config.statistics.epsilons = Some(cli.epsilons.clone());
    }
    let options = AnalysisOptions {
        logs_root: cli.logs,
        config,
        reference: cli.reference,
        max_workers: cli.workers,
    };

    let (datasets, _, truth) = validate_corpus(&options)?;
    let stats = compute_statistics(
        &datasets.results,
        &datasets.heuristics,
        &truth,
        options.config.statistics.epsilons.as_deref(),
    )?;

    println!("=== Heuristic statistics ({} instances) ===", truth.costs.len());
    for s in &stats {
        let tau = s
            .kendall_tau
            .map(|t| format!("{t:.6}"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{}/{} epsilon={:<6} mean_ratio={:.6} kendall_tau={} (n={}, {:?})",
            s.key.heuristic_optimal,
            s.key.heuristic_greedy,
            s.key.epsilon,
            s.mean_ratio,
            tau,
            s.instances,
            s.source
        );
    }
    Ok(())
}
