//! Whole-dataset invariant checks against the optimal cost table.
//!
//! Both checks stop at the first violation. Success means every row satisfied
//! the invariant.

use log::info;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::optimal::OptimalCostTable;
use crate::schema::{HeuristicRow, ResultRow};

/// Optimal cost of `id`, which must be a positive divisor.
pub(crate) fn positive_cost(id: u32, costs: &OptimalCostTable) -> Result<f64> {
    let optimal = costs
        .get(id)
        .ok_or(AnalysisError::MissingOptimalCost { id })?;
    if !(optimal > 0.0) {
        return Err(AnalysisError::BoundViolation {
            id,
            details: format!("optimal cost {optimal} is not positive"),
        });
    }
    Ok(optimal)
}

/// `solution / optimal` for the row's instance.
pub fn quality_ratio(row: &ResultRow, costs: &OptimalCostTable) -> Result<f64> {
    Ok(row.solution / positive_cost(row.id, costs)?)
}

/// Every row must satisfy `1 <= quality`, and rows from bounded algorithms
/// also `quality <= weight`.
pub fn verify_quality(
    rows: &[ResultRow],
    costs: &OptimalCostTable,
    config: &AnalysisConfig,
) -> Result<()> {
    for row in rows {
        let quality = quality_ratio(row, costs)?;
        // NaN fails both bounds.
        if !(quality >= 1.0) {
            return Err(AnalysisError::BoundViolation {
                id: row.id,
                details: format!(
                    "{} at weight {} reports cost {} below the optimum (quality {quality})",
                    row.alg, row.weight, row.solution
                ),
            });
        }
        if !(quality <= row.weight) && !config.is_unbounded(&row.alg) {
            return Err(AnalysisError::BoundViolation {
                id: row.id,
                details: format!(
                    "{} quality {quality} exceeds its bound {} (cost {})",
                    row.alg, row.weight, row.solution
                ),
            });
        }
    }
    info!("Quality bounds hold for {} result rows", rows.len());
    Ok(())
}

/// Both initial estimates of every row must not exceed the instance optimum.
pub fn verify_admissibility(rows: &[HeuristicRow], costs: &OptimalCostTable) -> Result<()> {
    for row in rows {
        let optimal = costs
            .get(row.id)
            .ok_or(AnalysisError::MissingOptimalCost { id: row.id })?;
        for (name, estimate) in [
            (&row.heuristic_optimal, row.init_ho),
            (&row.heuristic_greedy, row.init_hg),
        ] {
            if !(estimate <= optimal) {
                return Err(AnalysisError::BoundViolation {
                    id: row.id,
                    details: format!(
                        "heuristic {name} estimates {estimate} above optimal cost {optimal}"
                    ),
                });
            }
        }
    }
    info!("Admissibility holds for {} heuristic rows", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(alg: &str, weight: f64, solution: f64) -> ResultRow {
        ResultRow {
            id: 0,
            domain: None,
            alg: alg.into(),
            heuristic_optimal: "md".into(),
            heuristic_greedy: "md".into(),
            weight,
            epsilon: 1.0,
            solution,
            expanded: 10,
            time: 0.0,
            init_h: None,
        }
    }

    fn estimates(init_ho: f64, init_hg: f64) -> HeuristicRow {
        HeuristicRow {
            id: 0,
            domain: None,
            heuristic_optimal: "wmd".into(),
            heuristic_greedy: "md".into(),
            init_ho,
            init_hg,
        }
    }

    fn costs() -> OptimalCostTable {
        OptimalCostTable::from_dense(&[1000.0])
    }

    fn check(row: ResultRow) -> Result<()> {
        verify_quality(&[row], &costs(), &AnalysisConfig::default())
    }

    #[test]
    fn quality_bounds_are_inclusive() {
        assert!(check(run("wa", 2.0, 1000.0)).is_ok());
        assert!(check(run("wa", 2.0, 2000.0)).is_ok());
    }

    #[test]
    fn quality_below_one_fails() {
        assert!(matches!(
            check(run("wa", 2.0, 999.0)),
            Err(AnalysisError::BoundViolation { id: 0, .. })
        ));
    }

    #[test]
    fn quality_above_weight_fails() {
        assert!(matches!(
            check(run("wa", 2.0, 2001.0)),
            Err(AnalysisError::BoundViolation { .. })
        ));
    }

    #[test]
    fn unbounded_algorithms_keep_the_lower_bound() {
        assert!(check(run("gbfs", 1.0, 5000.0)).is_ok());
        assert!(check(run("gbfs", 1.0, 900.0)).is_err());
    }

    #[test]
    fn first_violation_stops_the_scan() {
        let rows = vec![run("wa", 1.5, 1200.0), run("wa", 1.5, 1600.0)];
        match verify_quality(&rows, &costs(), &AnalysisConfig::default()) {
            Err(AnalysisError::BoundViolation { details, .. }) => {
                assert!(details.contains("1600"), "{details}")
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }

    #[test]
    fn quality_needs_an_optimal_cost() {
        let mut row = run("wa", 1.0, 10.0);
        row.id = 4;
        assert!(matches!(
            quality_ratio(&row, &costs()),
            Err(AnalysisError::MissingOptimalCost { id: 4 })
        ));
    }

    #[test]
    fn zero_optimal_cost_is_rejected() {
        let zero = OptimalCostTable::from_dense(&[0.0]);
        let row = run("wa", 2.0, 0.0);
        assert!(matches!(
            quality_ratio(&row, &zero),
            Err(AnalysisError::BoundViolation { id: 0, .. })
        ));
        assert!(verify_quality(&[row], &zero, &AnalysisConfig::default()).is_err());
        assert!(verify_quality(&[run("gbfs", 1.0, 0.0)], &zero, &AnalysisConfig::default()).is_err());
    }

    #[test]
    fn estimate_equal_to_optimum_is_admissible() {
        assert!(verify_admissibility(&[estimates(1000.0, 1000.0)], &costs()).is_ok());
    }

    #[test]
    fn any_excess_is_inadmissible() {
        assert!(verify_admissibility(&[estimates(1000.5, 900.0)], &costs()).is_err());
        match verify_admissibility(&[estimates(900.0, 1000.001)], &costs()) {
            Err(AnalysisError::BoundViolation { details, .. }) => {
                assert!(details.contains("md"), "{details}")
            }
            other => panic!("expected violation, got {other:?}"),
        }
    }
}
