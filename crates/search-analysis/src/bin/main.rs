use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use search_analysis::config::AnalysisConfig;
use search_analysis::{AnalysisOptions, analyze_corpus, export_report};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Validate heuristic-search experiment logs and export analysis.db + statistics.json"
)]
struct Cli {
    /// Root directory containing driver logs (optionally .gz)
    #[arg(long, value_name = "DIR")]
    logs: PathBuf,

    /// Output directory for analysis.db and statistics.json
    #[arg(long, value_name = "DIR")]
    output: PathBuf,

    /// Analysis settings (TOML); defaults apply when omitted
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reference optimal costs (TOML or JSON) replacing the derived ones
    #[arg(long, value_name = "FILE")]
    reference: Option<PathBuf>,

    /// Number of worker threads (defaults to Rayon default)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Overwrite existing outputs if present
    #[arg(long)]
    overwrite: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_toml(path)?,
        None => AnalysisConfig::default(),
    };
    let options = AnalysisOptions {
        logs_root: cli.logs,
        config,
        reference: cli.reference,
        max_workers: cli.workers,
    };

    let report = analyze_corpus(&options)?;
    export_report(&report, &cli.output, cli.overwrite)?;
    info!(
        "Completed analysis: {} results, {} instances, {} configurations written to {}",
        report.datasets.results.len(),
        report.ground_truth.costs.len(),
        report.statistics.len(),
        cli.output.display()
    );
    Ok(())
}
