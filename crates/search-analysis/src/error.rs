//! Error taxonomy for the reconstruction, derivation, and validation stages.
//!
//! Every variant is fatal: these are correctness assertions about
//! experimental data, so callers propagate them instead of recovering.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed tagged line in {}:{line_number}: {reason} (line: '{content}')", file.display())]
    Parse {
        file: PathBuf,
        line_number: usize,
        content: String,
        reason: String,
    },
    #[error("field '{field}' has value '{value}' which is not a valid {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: &'static str,
    },
    #[error("required field '{field}' missing from {schema} record")]
    MissingField {
        field: &'static str,
        schema: &'static str,
    },
    #[error("inconsistent baseline solutions for id {id}: {costs:?}")]
    Inconsistency { id: u32, costs: Vec<f64> },
    #[error(
        "inconsistent initial heuristic for id {id} under {heuristic_optimal}/{heuristic_greedy}: {first} vs {second}"
    )]
    InconsistentHeuristic {
        id: u32,
        heuristic_optimal: String,
        heuristic_greedy: String,
        first: f64,
        second: f64,
    },
    #[error("bound violation for id {id}: {details}")]
    BoundViolation { id: u32, details: String },
    #[error("no optimal cost available for id {id}")]
    MissingOptimalCost { id: u32 },
    #[error("unexpected shape: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
