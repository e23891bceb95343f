//! Fold tagged lines into per-file record snapshots.
//!
//! Drivers print run-wide declarations once and per-instance info once per
//! instance, then one `[R]` line per algorithm. Each `[R]` closes a record made
//! of everything seen so far in the file, so fields are carried forward and
//! never cleared between records.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::AnalysisError;
use crate::line::{TaggedLine, classify_line};

/// Immutable copy of the accumulated fields at an `[R]` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSnapshot {
    fields: BTreeMap<String, String>,
}

impl RecordSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RecordSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Field state for the file currently being scanned.
#[derive(Debug, Clone, Default)]
pub struct RecordAccumulator {
    fields: BTreeMap<String, String>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `line` into the state. Returns the next state and, for `[R]`
    /// lines, a snapshot taken after the merge.
    pub fn fold(mut self, line: TaggedLine) -> (Self, Option<RecordSnapshot>) {
        let terminates = line.terminates_record();
        for (key, value) in line.fields {
            self.fields.insert(key, value);
        }
        let snapshot = terminates.then(|| RecordSnapshot {
            fields: self.fields.clone(),
        });
        (self, snapshot)
    }
}

/// Scan one log stream and return its snapshots in emission order.
///
/// `source` only labels errors. Trailing fields after the last `[R]` are
/// discarded.
pub fn accumulate_reader<R: BufRead>(source: &Path, reader: R) -> Result<Vec<RecordSnapshot>> {
    let mut state = RecordAccumulator::new();
    let mut snapshots = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| {
            format!("failed to read line {} of {}", idx + 1, source.display())
        })?;
        let tagged = classify_line(&line).map_err(|err| AnalysisError::Parse {
            file: source.to_path_buf(),
            line_number: idx + 1,
            content: line.trim_end().to_string(),
            reason: err.0,
        })?;
        let Some(tagged) = tagged else {
            continue;
        };
        let (next, snapshot) = state.fold(tagged);
        state = next;
        snapshots.extend(snapshot);
    }
    Ok(snapshots)
}

/// Convenience wrapper over [`accumulate_reader`] for in-memory text.
pub fn accumulate_str(source: &Path, text: &str) -> Result<Vec<RecordSnapshot>> {
    accumulate_reader(source, text.as_bytes())
}
