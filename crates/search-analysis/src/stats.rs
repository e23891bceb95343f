//! Heuristic quality statistics per experiment configuration.
//!
//! For each (optimal heuristic, greedy heuristic, epsilon) the initial
//! estimates of every instance are lined up by id against the ground truth,
//! giving Kendall's tau-b and the mean estimate-to-optimum ratio.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{info, warn};
use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::optimal::ensure_contiguous;
use crate::reference::GroundTruthSet;
use crate::schema::{HeuristicRow, ResultRow};
use crate::validate::positive_cost;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationKey {
    pub heuristic_optimal: String,
    pub heuristic_greedy: String,
    pub epsilon: f64,
}

/// Where the per-instance estimates of a configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateSource {
    /// Blended from the heuristic dataset's `init-ho` / `init-hg`.
    Blended,
    /// Taken from `init-h` logged on result rows.
    Logged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeuristicStats {
    pub key: ConfigurationKey,
    pub source: EstimateSource,
    pub instances: usize,
    /// Mean of `estimate / optimal` over instances.
    pub mean_ratio: f64,
    /// `None` when fewer than two instances or one side is entirely tied.
    pub kendall_tau: Option<f64>,
}

/// Kendall's tau-b between two equally long sequences.
pub fn kendall_tau_b(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mut concordant = 0i64;
    let mut discordant = 0i64;
    let mut tie_x = 0i64;
    let mut tie_y = 0i64;
    for i in 0..n {
        for j in (i + 1)..n {
            let x_cmp = x[i].partial_cmp(&x[j]).unwrap_or(Ordering::Equal);
            let y_cmp = y[i].partial_cmp(&y[j]).unwrap_or(Ordering::Equal);
            if x_cmp == Ordering::Equal {
                tie_x += 1;
            }
            if y_cmp == Ordering::Equal {
                tie_y += 1;
            }
            match (x_cmp, y_cmp) {
                (Ordering::Greater, Ordering::Greater) | (Ordering::Less, Ordering::Less) => {
                    concordant += 1;
                }
                (Ordering::Greater, Ordering::Less) | (Ordering::Less, Ordering::Greater) => {
                    discordant += 1;
                }
                _ => {}
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as f64;
    let denom = ((pairs - tie_x as f64) * (pairs - tie_y as f64)).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some((concordant - discordant) as f64 / denom)
}

/// Mean of `estimates[i] / costs[i]`.
pub fn mean_ratio(estimates: &[f64], costs: &[f64]) -> f64 {
    let sum: f64 = estimates.iter().zip(costs).map(|(h, c)| h / c).sum();
    sum / estimates.len() as f64
}

fn sort_epsilons(epsilons: &mut Vec<f64>) {
    epsilons.sort_by(f64::total_cmp);
    epsilons.dedup();
}

/// Configurations to evaluate, ordered by heuristic pair then epsilon.
///
/// With explicit `epsilons`, every heuristic pair seen in either dataset is
/// crossed with them; otherwise the combinations present in the result
/// dataset are used.
pub fn configurations(
    results: &[ResultRow],
    heuristics: &[HeuristicRow],
    epsilons: Option<&[f64]>,
) -> Vec<ConfigurationKey> {
    let mut by_pair: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    match epsilons {
        Some(epsilons) => {
            let pairs = results
                .iter()
                .map(|r| (&r.heuristic_optimal, &r.heuristic_greedy))
                .chain(
                    heuristics
                        .iter()
                        .map(|h| (&h.heuristic_optimal, &h.heuristic_greedy)),
                );
            for (ho, hg) in pairs {
                by_pair
                    .entry((ho.clone(), hg.clone()))
                    .or_insert_with(|| epsilons.to_vec());
            }
        }
        None => {
            for row in results {
                by_pair
                    .entry((row.heuristic_optimal.clone(), row.heuristic_greedy.clone()))
                    .or_default()
                    .push(row.epsilon);
            }
        }
    }
    let mut keys = Vec::new();
    for ((ho, hg), mut eps) in by_pair {
        sort_epsilons(&mut eps);
        for epsilon in eps {
            keys.push(ConfigurationKey {
                heuristic_optimal: ho.clone(),
                heuristic_greedy: hg.clone(),
                epsilon,
            });
        }
    }
    keys
}

/// One estimate per instance; duplicates must agree exactly.
fn insert_estimate(
    estimates: &mut BTreeMap<u32, f64>,
    key: &ConfigurationKey,
    id: u32,
    value: f64,
) -> Result<()> {
    if let Some(&first) = estimates.get(&id) {
        if first != value {
            return Err(AnalysisError::InconsistentHeuristic {
                id,
                heuristic_optimal: key.heuristic_optimal.clone(),
                heuristic_greedy: key.heuristic_greedy.clone(),
                first,
                second: value,
            });
        }
        return Ok(());
    }
    estimates.insert(id, value);
    Ok(())
}

fn blended_estimates(
    key: &ConfigurationKey,
    heuristics: &[HeuristicRow],
) -> Result<BTreeMap<u32, f64>> {
    let mut raw: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    let mut estimates = BTreeMap::new();
    for row in heuristics.iter().filter(|h| {
        h.heuristic_optimal == key.heuristic_optimal && h.heuristic_greedy == key.heuristic_greedy
    }) {
        match raw.get(&row.id) {
            Some(&(ho, hg)) if (ho, hg) != (row.init_ho, row.init_hg) => {
                let (first, second) = if ho != row.init_ho {
                    (ho, row.init_ho)
                } else {
                    (hg, row.init_hg)
                };
                return Err(AnalysisError::InconsistentHeuristic {
                    id: row.id,
                    heuristic_optimal: key.heuristic_optimal.clone(),
                    heuristic_greedy: key.heuristic_greedy.clone(),
                    first,
                    second,
                });
            }
            Some(_) => {}
            None => {
                raw.insert(row.id, (row.init_ho, row.init_hg));
                insert_estimate(&mut estimates, key, row.id, row.blended(key.epsilon))?;
            }
        }
    }
    Ok(estimates)
}

fn logged_estimates(key: &ConfigurationKey, results: &[ResultRow]) -> Result<BTreeMap<u32, f64>> {
    let mut estimates = BTreeMap::new();
    for row in results.iter().filter(|r| {
        r.heuristic_optimal == key.heuristic_optimal
            && r.heuristic_greedy == key.heuristic_greedy
            && r.epsilon == key.epsilon
    }) {
        if let Some(h) = row.init_h {
            insert_estimate(&mut estimates, key, row.id, h)?;
        }
    }
    Ok(estimates)
}

/// Line up estimates against the ground truth, which must cover exactly the
/// same dense id range.
fn score(
    key: ConfigurationKey,
    source: EstimateSource,
    estimates: BTreeMap<u32, f64>,
    truth: &GroundTruthSet,
) -> Result<HeuristicStats> {
    ensure_contiguous(estimates.keys().copied(), "heuristic estimate")?;
    let values: Vec<f64> = estimates.into_values().collect();
    let costs = truth.costs.dense_costs()?;
    if costs.len() != values.len() {
        return Err(AnalysisError::Shape(format!(
            "{}/{} epsilon {}: {} estimates but {} optimal costs",
            key.heuristic_optimal,
            key.heuristic_greedy,
            key.epsilon,
            values.len(),
            costs.len()
        )));
    }
    for id in 0..costs.len() as u32 {
        positive_cost(id, &truth.costs)?;
    }
    let targets = truth.rank_targets.as_deref().unwrap_or(&costs);
    if targets.len() != values.len() {
        return Err(AnalysisError::Shape(format!(
            "{} rank targets for {} estimates",
            targets.len(),
            values.len()
        )));
    }
    Ok(HeuristicStats {
        kendall_tau: kendall_tau_b(targets, &values),
        mean_ratio: mean_ratio(&values, &costs),
        instances: values.len(),
        source,
        key,
    })
}

/// Compute statistics for every configuration that has estimates.
/// Configurations with no estimates are skipped.
pub fn compute_statistics(
    results: &[ResultRow],
    heuristics: &[HeuristicRow],
    truth: &GroundTruthSet,
    epsilons: Option<&[f64]>,
) -> Result<Vec<HeuristicStats>> {
    let mut stats = Vec::new();
    for key in configurations(results, heuristics, epsilons) {
        let blended = blended_estimates(&key, heuristics)?;
        let (source, estimates) = if !blended.is_empty() {
            (EstimateSource::Blended, blended)
        } else {
            (EstimateSource::Logged, logged_estimates(&key, results)?)
        };
        if estimates.is_empty() {
            warn!(
                "No heuristic estimates for {}/{} epsilon {}; skipping",
                key.heuristic_optimal, key.heuristic_greedy, key.epsilon
            );
            continue;
        }
        stats.push(score(key, source, estimates, truth)?);
    }
    info!("Computed statistics for {} configurations", stats.len());
    Ok(stats)
}
