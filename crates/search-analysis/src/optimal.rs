//! Derive the true optimal cost of each instance from baseline runs.

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::schema::ResultRow;

/// Instance id → optimal solution cost. Ids without a baseline are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimalCostTable {
    costs: BTreeMap<u32, f64>,
}

impl OptimalCostTable {
    /// Build a table from costs indexed by instance id (`costs[i]` is id `i`).
    pub fn from_dense(costs: &[f64]) -> Self {
        Self {
            costs: costs
                .iter()
                .enumerate()
                .map(|(id, &cost)| (id as u32, cost))
                .collect(),
        }
    }

    pub fn get(&self, id: u32) -> Option<f64> {
        self.costs.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.costs.iter().map(|(&id, &cost)| (id, cost))
    }

    /// Costs ordered by id, provided the ids are exactly `0..len`.
    pub fn dense_costs(&self) -> Result<Vec<f64>> {
        ensure_contiguous(self.costs.keys().copied(), "optimal cost table")?;
        Ok(self.costs.values().copied().collect())
    }
}

/// Check that ascending `ids` are exactly `0..n`.
pub(crate) fn ensure_contiguous<I>(ids: I, what: &str) -> Result<()>
where
    I: IntoIterator<Item = u32>,
{
    for (expected, id) in ids.into_iter().enumerate() {
        if id as usize != expected {
            return Err(AnalysisError::Shape(format!(
                "{what} ids are not contiguous from 0: expected {expected}, found {id}"
            )));
        }
    }
    Ok(())
}

/// A row proves optimality when it ran at the baseline weight with an
/// algorithm that has an optimality guarantee.
pub fn is_baseline(row: &ResultRow, config: &AnalysisConfig) -> bool {
    row.weight == config.baseline_weight && !config.is_greedy_only(&row.alg)
}

/// Derive the optimal cost per instance. Every baseline row of an instance
/// must report the same cost; disagreement is never resolved.
pub fn derive_optimal_costs(rows: &[ResultRow], config: &AnalysisConfig) -> Result<OptimalCostTable> {
    let mut groups: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for row in rows.iter().filter(|row| is_baseline(row, config)) {
        let costs = groups.entry(row.id).or_default();
        if !costs.contains(&row.solution) {
            costs.push(row.solution);
        }
    }

    let mut table = OptimalCostTable::default();
    for (id, mut costs) in groups {
        if costs.len() > 1 {
            costs.sort_by(f64::total_cmp);
            return Err(AnalysisError::Inconsistency { id, costs });
        }
        table.costs.insert(id, costs[0]);
    }
    info!("Derived optimal costs for {} instances", table.len());
    Ok(table)
}
