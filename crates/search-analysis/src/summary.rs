//! Per run-group aggregates over the result dataset.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;
use crate::optimal::OptimalCostTable;
use crate::schema::ResultRow;
use crate::validate::quality_ratio;

/// (algorithm, optimal heuristic, greedy heuristic, weight, epsilon)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunGroupKey {
    pub alg: String,
    pub heuristic_optimal: String,
    pub heuristic_greedy: String,
    pub weight: f64,
    pub epsilon: f64,
}

impl Eq for RunGroupKey {}

impl Ord for RunGroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.alg
            .cmp(&other.alg)
            .then_with(|| self.heuristic_optimal.cmp(&other.heuristic_optimal))
            .then_with(|| self.heuristic_greedy.cmp(&other.heuristic_greedy))
            .then_with(|| self.weight.total_cmp(&other.weight))
            .then_with(|| self.epsilon.total_cmp(&other.epsilon))
    }
}

impl PartialOrd for RunGroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&ResultRow> for RunGroupKey {
    fn from(row: &ResultRow) -> Self {
        Self {
            alg: row.alg.clone(),
            heuristic_optimal: row.heuristic_optimal.clone(),
            heuristic_greedy: row.heuristic_greedy.clone(),
            weight: row.weight,
            epsilon: row.epsilon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunGroupSummary {
    pub key: RunGroupKey,
    pub runs: usize,
    pub mean_expanded: f64,
    pub mean_quality: f64,
    pub mean_time: f64,
}

#[derive(Default)]
struct Totals {
    runs: usize,
    expanded: f64,
    quality: f64,
    time: f64,
}

pub fn summarize_runs(rows: &[ResultRow], costs: &OptimalCostTable) -> Result<Vec<RunGroupSummary>> {
    let mut groups: BTreeMap<RunGroupKey, Totals> = BTreeMap::new();
    for row in rows {
        let quality = quality_ratio(row, costs)?;
        let totals = groups.entry(RunGroupKey::from(row)).or_default();
        totals.runs += 1;
        totals.expanded += row.expanded as f64;
        totals.quality += quality;
        totals.time += row.time;
    }
    Ok(groups
        .into_iter()
        .map(|(key, t)| {
            let n = t.runs as f64;
            RunGroupSummary {
                key,
                runs: t.runs,
                mean_expanded: t.expanded / n,
                mean_quality: t.quality / n,
                mean_time: t.time / n,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn run(id: u32, alg: &str, weight: f64, solution: f64, expanded: u64) -> ResultRow {
        ResultRow {
            id,
            domain: None,
            alg: alg.into(),
            heuristic_optimal: "md".into(),
            heuristic_greedy: "md".into(),
            weight,
            epsilon: 0.5,
            solution,
            expanded,
            time: 0.5,
            init_h: None,
        }
    }

    #[test]
    fn groups_are_averaged_and_ordered() {
        let costs = OptimalCostTable::from_dense(&[10.0, 20.0]);
        let rows = vec![
            run(0, "wa", 2.0, 15.0, 100),
            run(1, "wa", 2.0, 20.0, 300),
            run(0, "wa", 1.0, 10.0, 1000),
            run(0, "gbfs", 1.0, 40.0, 5),
        ];
        let groups = summarize_runs(&rows, &costs).unwrap();
        let keys: Vec<(&str, f64)> = groups
            .iter()
            .map(|g| (g.key.alg.as_str(), g.key.weight))
            .collect();
        assert_eq!(keys, vec![("gbfs", 1.0), ("wa", 1.0), ("wa", 2.0)]);

        let wa2 = &groups[2];
        assert_eq!(wa2.runs, 2);
        assert_eq!(wa2.mean_expanded, 200.0);
        assert_eq!(wa2.mean_quality, 1.25);
        assert_eq!(wa2.mean_time, 0.5);
    }

    #[test]
    fn zero_optimal_cost_is_not_averaged() {
        let costs = OptimalCostTable::from_dense(&[0.0]);
        assert!(matches!(
            summarize_runs(&[run(0, "wa", 2.0, 0.0, 1)], &costs),
            Err(AnalysisError::BoundViolation { id: 0, .. })
        ));
    }

    #[test]
    fn rows_need_optimal_costs() {
        let costs = OptimalCostTable::from_dense(&[10.0]);
        assert!(matches!(
            summarize_runs(&[run(3, "wa", 1.0, 10.0, 1)], &costs),
            Err(AnalysisError::MissingOptimalCost { id: 3 })
        ));
    }
}
