//! Reconstruct typed datasets from heuristic-search experiment logs, derive
//! optimal costs, check solution-quality and admissibility invariants, and
//! compute heuristic quality statistics.

use std::path::PathBuf;

use anyhow::{Result, bail};
use log::info;

pub mod accumulator;
pub mod assemble;
pub mod config;
pub mod corpus;
pub mod error;
pub mod export;
pub mod line;
pub mod optimal;
pub mod reference;
pub mod schema;
pub mod stats;
pub mod summary;
pub mod validate;

use crate::assemble::{Datasets, assemble_datasets};
use crate::config::{AnalysisConfig, GroundTruth};
use crate::corpus::{discover_logs, parse_corpus};
use crate::optimal::{OptimalCostTable, derive_optimal_costs};
use crate::reference::{GroundTruthSet, ReferenceCosts, resolve_ground_truth};
use crate::stats::{HeuristicStats, compute_statistics};
use crate::summary::{RunGroupSummary, summarize_runs};
use crate::validate::{verify_admissibility, verify_quality};

pub use crate::error::AnalysisError;
pub use crate::export::export_report;

/// Analysis configuration supplied by the CLI.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    pub logs_root: PathBuf,
    pub config: AnalysisConfig,
    /// Reference costs file; when set it replaces the derived ground truth.
    pub reference: Option<PathBuf>,
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub datasets: Datasets,
    /// Costs proven by the corpus's own baseline runs.
    pub derived_costs: OptimalCostTable,
    /// Costs used for validation and statistics.
    pub ground_truth: GroundTruthSet,
    pub statistics: Vec<HeuristicStats>,
    pub run_groups: Vec<RunGroupSummary>,
}

/// Reconstruct and validate the datasets without computing statistics.
pub fn validate_corpus(opts: &AnalysisOptions) -> Result<(Datasets, OptimalCostTable, GroundTruthSet)> {
    if opts.max_workers == Some(0) {
        bail!("worker count must be > 0 when specified");
    }
    let files = discover_logs(&opts.logs_root, &opts.config.extensions)?;
    if files.is_empty() {
        bail!("no log files found under {}", opts.logs_root.display());
    }
    info!("Discovered {} log files", files.len());

    let parsed = parse_corpus(&files, opts.max_workers)?;
    let datasets = assemble_datasets(&parsed)?;
    let derived = derive_optimal_costs(&datasets.results, &opts.config)?;

    let mut config = opts.config.clone();
    let reference = match &opts.reference {
        Some(path) => {
            config.ground_truth = GroundTruth::Reference;
            Some(ReferenceCosts::load(path)?)
        }
        None => None,
    };
    let truth = resolve_ground_truth(derived.clone(), &config, reference)?;

    verify_quality(&datasets.results, &truth.costs, &config)?;
    verify_admissibility(&datasets.heuristics, &truth.costs)?;
    Ok((datasets, derived, truth))
}

/// Run the whole pipeline: discover, parse, assemble, derive, validate,
/// then compute statistics and run-group summaries.
pub fn analyze_corpus(opts: &AnalysisOptions) -> Result<AnalysisReport> {
    let (datasets, derived_costs, ground_truth) = validate_corpus(opts)?;
    let statistics = compute_statistics(
        &datasets.results,
        &datasets.heuristics,
        &ground_truth,
        opts.config.statistics.epsilons.as_deref(),
    )?;
    let run_groups = summarize_runs(&datasets.results, &ground_truth.costs)?;
    info!(
        "Analysis complete: {} results, {} heuristic rows, {} configurations, {} run groups",
        datasets.results.len(),
        datasets.heuristics.len(),
        statistics.len(),
        run_groups.len()
    );
    Ok(AnalysisReport {
        datasets,
        derived_costs,
        ground_truth,
        statistics,
        run_groups,
    })
}
