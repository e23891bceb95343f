//! Field names, the declared field-to-type table, and typed dataset rows.
//!
//! Snapshot values are untyped text. They are coerced exactly once, at
//! assembly, by consulting [`FIELD_TYPES`]; everything downstream works on
//! [`ResultRow`] and [`HeuristicRow`].

use serde::Serialize;

use crate::error::{AnalysisError, Result};

pub const ID: &str = "id";
pub const INSTANCE: &str = "instance";
pub const DOMAIN: &str = "domain";
pub const ALG: &str = "alg";
pub const HEURISTIC_OPTIMAL: &str = "heuristic-optimal";
pub const HEURISTIC_GREEDY: &str = "heuristic-greedy";
pub const WEIGHT: &str = "weight";
pub const EPSILON: &str = "epsilon";
pub const SOLUTION: &str = "solution";
pub const EXPANDED: &str = "expanded";
pub const TIME: &str = "time";
pub const INIT_H: &str = "init-h";
pub const INIT_HO: &str = "init-ho";
pub const INIT_HG: &str = "init-hg";

/// Presence of this field routes a snapshot to the heuristic dataset.
pub const HEURISTIC_MARKER: &str = INIT_HO;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "finite float",
            FieldKind::Text => "text",
        }
    }
}

/// One entry of the coercion table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Unit suffix stripped before numeric parsing, when present.
    pub unit: Option<&'static str>,
}

const fn spec(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        unit: None,
    }
}

pub const FIELD_TYPES: &[FieldSpec] = &[
    spec(ID, FieldKind::Integer),
    spec(EXPANDED, FieldKind::Integer),
    spec(SOLUTION, FieldKind::Float),
    spec(WEIGHT, FieldKind::Float),
    spec(EPSILON, FieldKind::Float),
    FieldSpec {
        name: TIME,
        kind: FieldKind::Float,
        unit: Some("s"),
    },
    spec(INIT_H, FieldKind::Float),
    spec(INIT_HO, FieldKind::Float),
    spec(INIT_HG, FieldKind::Float),
    spec(DOMAIN, FieldKind::Text),
    spec(ALG, FieldKind::Text),
    spec(HEURISTIC_OPTIMAL, FieldKind::Text),
    spec(HEURISTIC_GREEDY, FieldKind::Text),
    spec(INSTANCE, FieldKind::Text),
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELD_TYPES.iter().find(|spec| spec.name == name)
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(u64),
    Float(f64),
    Text(String),
}

/// Coerce `raw` according to the declared kind of `name`. Fields absent from
/// the table stay textual.
pub fn coerce_field(name: &str, raw: &str) -> Result<FieldValue> {
    let Some(spec) = field_spec(name) else {
        return Ok(FieldValue::Text(raw.to_string()));
    };
    let trimmed = raw.trim();
    let numeric = match spec.unit {
        Some(unit) => trimmed.strip_suffix(unit).unwrap_or(trimmed),
        None => trimmed,
    };
    let fail = || AnalysisError::Coercion {
        field: name.to_string(),
        value: raw.to_string(),
        expected: spec.kind.describe(),
    };
    match spec.kind {
        FieldKind::Integer => numeric
            .parse::<u64>()
            .map(FieldValue::Integer)
            .map_err(|_| fail()),
        FieldKind::Float => match numeric.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(FieldValue::Float(v)),
            _ => Err(fail()),
        },
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

/// One search run on one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub id: u32,
    pub domain: Option<String>,
    pub alg: String,
    pub heuristic_optimal: String,
    pub heuristic_greedy: String,
    pub weight: f64,
    pub epsilon: f64,
    pub solution: f64,
    pub expanded: u64,
    /// Elapsed seconds, unit suffix removed.
    pub time: f64,
    /// Blended initial heuristic, when the driver logs it.
    pub init_h: Option<f64>,
}

/// Initial heuristic estimates for one instance, logged without searching.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeuristicRow {
    pub id: u32,
    pub domain: Option<String>,
    pub heuristic_optimal: String,
    pub heuristic_greedy: String,
    pub init_ho: f64,
    pub init_hg: f64,
}

impl HeuristicRow {
    /// `epsilon * init_ho + (1 - epsilon) * init_hg`.
    pub fn blended(&self, epsilon: f64) -> f64 {
        epsilon * self.init_ho + (1.0 - epsilon) * self.init_hg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_unit_is_stripped() {
        assert_eq!(
            coerce_field(TIME, "0.250000s").unwrap(),
            FieldValue::Float(0.25)
        );
        assert_eq!(coerce_field(TIME, "3").unwrap(), FieldValue::Float(3.0));
    }

    #[test]
    fn unit_only_applies_to_declared_fields() {
        assert!(matches!(
            coerce_field(SOLUTION, "57s"),
            Err(AnalysisError::Coercion { .. })
        ));
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(
            coerce_field(EXPANDED, "1200").unwrap(),
            FieldValue::Integer(1200)
        );
        match coerce_field(EXPANDED, "12.5") {
            Err(AnalysisError::Coercion { field, value, .. }) => {
                assert_eq!(field, EXPANDED);
                assert_eq!(value, "12.5");
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        assert!(coerce_field(WEIGHT, "nan").is_err());
        assert!(coerce_field(WEIGHT, "inf").is_err());
    }

    #[test]
    fn undeclared_fields_stay_textual() {
        assert_eq!(
            coerce_field("pdb", "7-8").unwrap(),
            FieldValue::Text("7-8".into())
        );
        assert_eq!(
            coerce_field(ALG, "wa").unwrap(),
            FieldValue::Text("wa".into())
        );
    }

    #[test]
    fn blend_interpolates_between_estimates() {
        let row = HeuristicRow {
            id: 0,
            domain: None,
            heuristic_optimal: "wmd".into(),
            heuristic_greedy: "md".into(),
            init_ho: 40.0,
            init_hg: 20.0,
        };
        assert_eq!(row.blended(1.0), 40.0);
        assert_eq!(row.blended(0.0), 20.0);
        assert_eq!(row.blended(0.25), 25.0);
    }
}
