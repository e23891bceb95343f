//! Discover driver logs under a directory tree and parse them in parallel.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::accumulator::{RecordSnapshot, accumulate_reader};

/// Snapshots parsed from one log file.
#[derive(Debug, Clone)]
pub struct FileRecords {
    pub path: PathBuf,
    pub snapshots: Vec<RecordSnapshot>,
}

pub(crate) fn default_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}

/// Recursively collect log files whose extension is in `extensions`,
/// optionally gzipped. Paths are sorted so row order is reproducible.
pub fn discover_logs(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("log directory '{}' does not exist", root.display());
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if has_log_extension(path, extensions) {
            files.push(path.to_path_buf());
        } else {
            debug!("Skipping {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

fn has_log_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    let name = name.strip_suffix(".gz").unwrap_or(name);
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    extensions.iter().any(|want| want.eq_ignore_ascii_case(ext))
}

fn open_log(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let gz = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Parse a single log file into its record snapshots.
pub fn parse_log_file(path: &Path) -> Result<FileRecords> {
    let reader = open_log(path)?;
    let snapshots = accumulate_reader(path, reader)?;
    if snapshots.is_empty() {
        warn!("{} contains no [R] records", path.display());
    }
    Ok(FileRecords {
        path: path.to_path_buf(),
        snapshots,
    })
}

/// Parse every file on a rayon pool. Each file owns its accumulator; the
/// returned vector follows the order of `files`.
pub fn parse_corpus(files: &[PathBuf], max_workers: Option<usize>) -> Result<Vec<FileRecords>> {
    info!("Parsing {} log files", files.len());
    let pb = default_progress_bar(files.len() as u64);

    let process = || -> Result<Vec<FileRecords>> {
        files
            .par_iter()
            .map(|path| {
                let out = parse_log_file(path);
                pb.inc(1);
                out
            })
            .collect()
    };

    let parsed = if let Some(n) = max_workers {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .context("failed to build rayon thread pool")?
            .install(process)?
    } else {
        process()?
    };

    pb.finish_with_message("logs parsed");
    let records: usize = parsed.iter().map(|f| f.snapshots.len()).sum();
    info!("Parsed {} records from {} files", records, parsed.len());
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        ["out", "txt", "log"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn discovery_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("w2");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.out"), "").unwrap();
        fs::write(dir.path().join("a.log"), "").unwrap();
        fs::write(dir.path().join("c.txt.gz"), "").unwrap();
        fs::write(dir.path().join("notes.md"), "").unwrap();
        fs::write(dir.path().join("README"), "").unwrap();

        let files = discover_logs(dir.path(), &exts()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.log"),
                PathBuf::from("c.txt.gz"),
                PathBuf::from("w2/b.out"),
            ]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(discover_logs(&dir.path().join("nope"), &exts()).is_err());
    }

    #[test]
    fn gzipped_logs_are_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.out.gz");
        let mut enc = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"[D] weight: 1\n[I] id: 0\n[R] alg: wa; solution: 4\n")
            .unwrap();
        enc.finish().unwrap();

        let parsed = parse_log_file(&path).unwrap();
        assert_eq!(parsed.snapshots.len(), 1);
        assert_eq!(parsed.snapshots[0].get("solution"), Some("4"));
    }

    #[test]
    fn corpus_order_follows_input_order() {
        let dir = tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..6 {
            let path = dir.path().join(format!("{i}.log"));
            fs::write(&path, format!("[I] id: {i}\n[R] alg: wa\n")).unwrap();
            files.push(path);
        }
        let parsed = parse_corpus(&files, Some(3)).unwrap();
        let ids: Vec<_> = parsed
            .iter()
            .map(|f| f.snapshots[0].get("id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5"]);
    }

    #[test]
    fn malformed_file_fails_the_corpus() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.log");
        let bad = dir.path().join("bad.log");
        fs::write(&good, "[R] alg: wa\n").unwrap();
        fs::write(&bad, "[R] alg wa\n").unwrap();
        let err = parse_corpus(&[good, bad.clone()], None).unwrap_err();
        match err.downcast_ref::<AnalysisError>() {
            Some(AnalysisError::Parse { file, .. }) => assert_eq!(file, &bad),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
