//! Injected reference costs, as an alternative to baseline-derived ones.
//!
//! A reference file lists costs densely by instance id:
//!
//! ```toml
//! costs = [461, 389, 418]
//! # optional: rank correlation target used instead of `costs`
//! rank_targets = [57, 55, 59]
//! ```
//!
//! JSON with the same keys is accepted for `.json` paths.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::Deserialize;

use crate::config::{AnalysisConfig, GroundTruth};
use crate::error::AnalysisError;
use crate::optimal::OptimalCostTable;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceCosts {
    pub costs: Vec<f64>,
    #[serde(default)]
    pub rank_targets: Option<Vec<f64>>,
}

impl ReferenceCosts {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let reference: Self = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?
        };
        reference.check_shape()?;
        Ok(reference)
    }

    fn check_shape(&self) -> std::result::Result<(), AnalysisError> {
        if self.costs.is_empty() {
            return Err(AnalysisError::Shape("reference lists no costs".into()));
        }
        if let Some(targets) = &self.rank_targets {
            if targets.len() != self.costs.len() {
                return Err(AnalysisError::Shape(format!(
                    "reference has {} costs but {} rank targets",
                    self.costs.len(),
                    targets.len()
                )));
            }
        }
        Ok(())
    }
}

/// The cost table used for validation and statistics, plus the sequence
/// heuristics are ranked against when it differs from the costs.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundTruthSet {
    pub source: GroundTruth,
    pub costs: OptimalCostTable,
    pub rank_targets: Option<Vec<f64>>,
}

impl GroundTruthSet {
    pub fn derived(costs: OptimalCostTable) -> Self {
        Self {
            source: GroundTruth::Derived,
            costs,
            rank_targets: None,
        }
    }

    pub fn from_reference(reference: ReferenceCosts) -> Self {
        Self {
            source: GroundTruth::Reference,
            costs: OptimalCostTable::from_dense(&reference.costs),
            rank_targets: reference.rank_targets,
        }
    }
}

/// Choose the ground truth named by `config`. With a reference, every id the
/// derived table also covers is compared and disagreements are logged.
pub fn resolve_ground_truth(
    derived: OptimalCostTable,
    config: &AnalysisConfig,
    reference: Option<ReferenceCosts>,
) -> Result<GroundTruthSet> {
    match config.ground_truth {
        GroundTruth::Derived => Ok(GroundTruthSet::derived(derived)),
        GroundTruth::Reference => {
            let reference = match reference {
                Some(reference) => reference,
                None => match &config.reference {
                    Some(path) => ReferenceCosts::load(path)?,
                    None => bail!("ground_truth = \"reference\" requires a reference file"),
                },
            };
            let set = GroundTruthSet::from_reference(reference);
            let mut disagreements = 0usize;
            for (id, cost) in derived.iter() {
                match set.costs.get(id) {
                    Some(expected) if expected != cost => {
                        disagreements += 1;
                        warn!("id {id}: baseline runs report {cost} but reference says {expected}");
                    }
                    None => warn!("id {id} has a baseline cost but no reference entry"),
                    _ => {}
                }
            }
            info!(
                "Using reference costs for {} instances ({} disagree with baselines)",
                set.costs.len(),
                disagreements
            );
            Ok(set)
        }
    }
}
