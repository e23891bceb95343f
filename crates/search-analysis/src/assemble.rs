//! Merge per-file snapshots into the typed result and heuristic datasets.

use std::collections::BTreeMap;

use log::info;

use crate::accumulator::RecordSnapshot;
use crate::corpus::FileRecords;
use crate::error::{AnalysisError, Result};
use crate::schema::{
    ALG, DOMAIN, EPSILON, EXPANDED, FieldValue, HEURISTIC_GREEDY, HEURISTIC_MARKER,
    HEURISTIC_OPTIMAL, HeuristicRow, ID, INIT_H, INIT_HG, INIT_HO, INSTANCE, ResultRow, SOLUTION,
    TIME, WEIGHT, coerce_field,
};

/// Both datasets, each in corpus encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    pub results: Vec<ResultRow>,
    pub heuristics: Vec<HeuristicRow>,
}

/// Typed accessors over one snapshot, labelled with the schema it feeds.
struct RecordView<'a> {
    snapshot: &'a RecordSnapshot,
    schema: &'static str,
}

impl<'a> RecordView<'a> {
    fn raw(&self, field: &'static str) -> Result<&'a str> {
        self.snapshot
            .get(field)
            .ok_or(AnalysisError::MissingField {
                field,
                schema: self.schema,
            })
    }

    fn text(&self, field: &'static str) -> Result<String> {
        self.raw(field).map(str::to_string)
    }

    fn optional_text(&self, field: &'static str) -> Option<String> {
        self.snapshot.get(field).map(str::to_string)
    }

    fn float(&self, field: &'static str) -> Result<f64> {
        let raw = self.raw(field)?;
        match coerce_field(field, raw)? {
            FieldValue::Float(v) => Ok(v),
            FieldValue::Integer(v) => Ok(v as f64),
            FieldValue::Text(_) => Err(self.kind_mismatch(field, raw)),
        }
    }

    fn optional_float(&self, field: &'static str) -> Result<Option<f64>> {
        if self.snapshot.contains(field) {
            self.float(field).map(Some)
        } else {
            Ok(None)
        }
    }

    fn integer(&self, field: &'static str) -> Result<u64> {
        let raw = self.raw(field)?;
        match coerce_field(field, raw)? {
            FieldValue::Integer(v) => Ok(v),
            _ => Err(self.kind_mismatch(field, raw)),
        }
    }

    fn id(&self) -> Result<u32> {
        let id = self.integer(ID)?;
        u32::try_from(id).map_err(|_| AnalysisError::Coercion {
            field: ID.to_string(),
            value: id.to_string(),
            expected: "32-bit instance id",
        })
    }

    fn kind_mismatch(&self, field: &'static str, raw: &str) -> AnalysisError {
        AnalysisError::Coercion {
            field: field.to_string(),
            value: raw.to_string(),
            expected: "numeric field",
        }
    }
}

fn result_row(snapshot: &RecordSnapshot) -> Result<ResultRow> {
    let view = RecordView {
        snapshot,
        schema: "result",
    };
    Ok(ResultRow {
        id: view.id()?,
        domain: view.optional_text(DOMAIN),
        alg: view.text(ALG)?,
        heuristic_optimal: view.text(HEURISTIC_OPTIMAL)?,
        heuristic_greedy: view.text(HEURISTIC_GREEDY)?,
        weight: view.float(WEIGHT)?,
        epsilon: view.float(EPSILON)?,
        solution: view.float(SOLUTION)?,
        expanded: view.integer(EXPANDED)?,
        time: view.float(TIME)?,
        init_h: view.optional_float(INIT_H)?,
    })
}

fn heuristic_row(snapshot: &RecordSnapshot) -> Result<HeuristicRow> {
    let view = RecordView {
        snapshot,
        schema: "heuristic",
    };
    Ok(HeuristicRow {
        id: view.id()?,
        domain: view.optional_text(DOMAIN),
        heuristic_optimal: view.text(HEURISTIC_OPTIMAL)?,
        heuristic_greedy: view.text(HEURISTIC_GREEDY)?,
        init_ho: view.float(INIT_HO)?,
        init_hg: view.float(INIT_HG)?,
    })
}

/// Every `instance` label seen for an id must be the same, so the id alone
/// identifies the problem once the label is dropped.
fn check_instance_label(
    labels: &mut BTreeMap<u32, String>,
    id: u32,
    snapshot: &RecordSnapshot,
) -> Result<()> {
    let Some(label) = snapshot.get(INSTANCE) else {
        return Ok(());
    };
    match labels.get(&id) {
        Some(first) if first != label => Err(AnalysisError::Shape(format!(
            "id {id} names two instances: '{first}' and '{label}'"
        ))),
        Some(_) => Ok(()),
        None => {
            labels.insert(id, label.to_string());
            Ok(())
        }
    }
}

/// Route each snapshot by [`HEURISTIC_MARKER`] and coerce it into a typed row.
///
/// Only the fields a row declares are kept; the raw `instance` label and the
/// run context of heuristic records fall away here.
pub fn assemble_snapshots<'a, I>(snapshots: I) -> Result<Datasets>
where
    I: IntoIterator<Item = &'a RecordSnapshot>,
{
    let mut datasets = Datasets::default();
    let mut labels = BTreeMap::new();
    for snapshot in snapshots {
        if snapshot.contains(HEURISTIC_MARKER) {
            let row = heuristic_row(snapshot)?;
            check_instance_label(&mut labels, row.id, snapshot)?;
            datasets.heuristics.push(row);
        } else {
            let row = result_row(snapshot)?;
            check_instance_label(&mut labels, row.id, snapshot)?;
            datasets.results.push(row);
        }
    }
    Ok(datasets)
}

/// Concatenate all files in corpus order and assemble both datasets.
pub fn assemble_datasets(files: &[FileRecords]) -> Result<Datasets> {
    let datasets = assemble_snapshots(files.iter().flat_map(|f| f.snapshots.iter()))?;
    info!(
        "Assembled {} result rows and {} heuristic rows",
        datasets.results.len(),
        datasets.heuristics.len()
    );
    Ok(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::accumulate_str;
    use std::path::{Path, PathBuf};

    const HEADER: &str = "[D] domain: STP; heuristic-optimal: md; heuristic-greedy: md; weight: 2; epsilon: 0.5\n";

    fn files(texts: &[&str]) -> Vec<FileRecords> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let path = PathBuf::from(format!("{i}.out"));
                FileRecords {
                    snapshots: accumulate_str(&path, text).unwrap(),
                    path,
                }
            })
            .collect()
    }

    #[test]
    fn result_rows_are_typed() {
        let text = format!(
            "{HEADER}[I] id: 3; instance: 1 0 2 3\n[R] alg: wa; solution: 57; expanded: 1200; time: 0.013000s\n"
        );
        let ds = assemble_datasets(&files(&[&text])).unwrap();
        assert!(ds.heuristics.is_empty());
        assert_eq!(
            ds.results,
            vec![ResultRow {
                id: 3,
                domain: Some("STP".into()),
                alg: "wa".into(),
                heuristic_optimal: "md".into(),
                heuristic_greedy: "md".into(),
                weight: 2.0,
                epsilon: 0.5,
                solution: 57.0,
                expanded: 1200,
                time: 0.013,
                init_h: None,
            }]
        );
    }

    #[test]
    fn heuristic_records_are_partitioned() {
        let text = format!(
            "{HEADER}[I] id: 0; instance: x\n[R] alg: heuristic; init-ho: 40; init-hg: 36\n[I] id: 1; instance: y\n[R] alg: heuristic; init-ho: 41; init-hg: 30\n"
        );
        let results = format!(
            "{HEADER}[I] id: 0; instance: x\n[R] alg: wa; solution: 57; expanded: 10; time: 1s\n"
        );
        let ds = assemble_datasets(&files(&[&results, &text])).unwrap();
        assert_eq!(ds.results.len(), 1);
        assert_eq!(ds.heuristics.len(), 2);
        assert_eq!(ds.heuristics[1].id, 1);
        assert_eq!(ds.heuristics[1].init_ho, 41.0);
        assert_eq!(ds.heuristics[1].init_hg, 30.0);
    }

    #[test]
    fn one_id_with_two_instance_labels_is_rejected() {
        let a = format!(
            "{HEADER}[I] id: 4; instance: 1 0 2 3\n[R] alg: wa; solution: 5; expanded: 3; time: 1s\n"
        );
        let b = format!(
            "{HEADER}[I] id: 4; instance: 3 2 1 0\n[R] alg: wa; solution: 9; expanded: 3; time: 1s\n"
        );
        match assemble_datasets(&files(&[&a, &b])) {
            Err(AnalysisError::Shape(msg)) => assert!(msg.contains("id 4"), "{msg}"),
            other => panic!("expected shape error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_instance_label_is_accepted() {
        let a = format!(
            "{HEADER}[I] id: 4; instance: 1 0 2 3\n[R] alg: wa; solution: 5; expanded: 3; time: 1s\n"
        );
        let h = format!(
            "{HEADER}[I] id: 4; instance: 1 0 2 3\n[R] alg: heuristic; init-ho: 4; init-hg: 3\n"
        );
        let ds = assemble_datasets(&files(&[&a, &h, &a])).unwrap();
        assert_eq!(ds.results.len(), 2);
        assert_eq!(ds.heuristics.len(), 1);
    }

    #[test]
    fn rows_keep_file_then_emission_order() {
        let a = format!(
            "{HEADER}[I] id: 5\n[R] alg: wa; solution: 1; expanded: 1; time: 1s\n[R] alg: gbfs; solution: 2; expanded: 1; time: 1s\n"
        );
        let b = format!("{HEADER}[I] id: 2\n[R] alg: wa; solution: 3; expanded: 1; time: 1s\n");
        let ds = assemble_datasets(&files(&[&a, &b])).unwrap();
        let order: Vec<_> = ds
            .results
            .iter()
            .map(|r| (r.id, r.alg.as_str()))
            .collect();
        assert_eq!(order, vec![(5, "wa"), (5, "gbfs"), (2, "wa")]);
    }

    #[test]
    fn logged_blend_is_optional_float() {
        let text = format!(
            "{HEADER}[I] id: 0\n[R] alg: wa; solution: 57; init-h: 41.500; expanded: 3; time: 0.5s\n"
        );
        let ds = assemble_datasets(&files(&[&text])).unwrap();
        assert_eq!(ds.results[0].init_h, Some(41.5));
    }

    #[test]
    fn bad_numeric_value_is_fatal() {
        let text =
            format!("{HEADER}[I] id: 0\n[R] alg: wa; solution: many; expanded: 3; time: 0.5s\n");
        match assemble_datasets(&files(&[&text])) {
            Err(AnalysisError::Coercion { field, value, .. }) => {
                assert_eq!(field, SOLUTION);
                assert_eq!(value, "many");
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_fatal() {
        let snaps = accumulate_str(
            Path::new("x.out"),
            "[I] id: 0\n[R] alg: wa; solution: 5; expanded: 3; time: 1s\n",
        )
        .unwrap();
        match assemble_snapshots(&snaps) {
            Err(AnalysisError::MissingField { field, schema }) => {
                assert_eq!(field, HEURISTIC_OPTIMAL);
                assert_eq!(schema, "result");
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn oversized_id_is_rejected() {
        let text = format!(
            "{HEADER}[I] id: 99999999999\n[R] alg: wa; solution: 5; expanded: 3; time: 1s\n"
        );
        assert!(matches!(
            assemble_datasets(&files(&[&text])),
            Err(AnalysisError::Coercion { .. })
        ));
    }
}
