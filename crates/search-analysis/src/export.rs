//! Persist an analysis report: tables to SQLite, statistics to JSON.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use rusqlite::{Connection, params};
use serde::Serialize;

use crate::AnalysisReport;
use crate::config::GroundTruth;
use crate::stats::{EstimateSource, HeuristicStats};
use crate::summary::RunGroupSummary;

pub const DATABASE_FILE: &str = "analysis.db";
pub const STATISTICS_FILE: &str = "statistics.json";

/// Write `analysis.db` and `statistics.json` into `out_dir`. Existing outputs
/// are only replaced with `overwrite`.
pub fn export_report(report: &AnalysisReport, out_dir: &Path, overwrite: bool) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let db_path = out_dir.join(DATABASE_FILE);
    let json_path = out_dir.join(STATISTICS_FILE);
    clear_output(&db_path, overwrite)?;
    clear_output(&json_path, overwrite)?;
    write_database(&db_path, report)?;
    write_statistics(&json_path, report)?;
    Ok(())
}

fn clear_output(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() {
        if overwrite {
            fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))?;
        } else {
            bail!("{} already exists (use --overwrite)", path.display());
        }
    }
    Ok(())
}

fn source_name(source: EstimateSource) -> &'static str {
    match source {
        EstimateSource::Blended => "blended",
        EstimateSource::Logged => "logged",
    }
}

fn write_database(path: &Path, report: &AnalysisReport) -> Result<()> {
    let mut conn =
        Connection::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    conn.pragma_update(None, "journal_mode", &"WAL")?;
    conn.pragma_update(None, "synchronous", &"NORMAL")?;
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS results (
            id INTEGER NOT NULL,
            domain TEXT,
            alg TEXT NOT NULL,
            heuristic_optimal TEXT NOT NULL,
            heuristic_greedy TEXT NOT NULL,
            weight REAL NOT NULL,
            epsilon REAL NOT NULL,
            solution REAL NOT NULL,
            expanded BIGINT NOT NULL,
            time REAL NOT NULL,
            init_h REAL
        );
        CREATE TABLE IF NOT EXISTS heuristics (
            id INTEGER NOT NULL,
            domain TEXT,
            heuristic_optimal TEXT NOT NULL,
            heuristic_greedy TEXT NOT NULL,
            init_ho REAL NOT NULL,
            init_hg REAL NOT NULL
        );
        CREATE TABLE IF NOT EXISTS optimal_costs (
            id INTEGER PRIMARY KEY,
            cost REAL NOT NULL
        );
        CREATE TABLE IF NOT EXISTS heuristic_stats (
            heuristic_optimal TEXT NOT NULL,
            heuristic_greedy TEXT NOT NULL,
            epsilon REAL NOT NULL,
            source TEXT NOT NULL,
            instances INT NOT NULL,
            mean_ratio REAL NOT NULL,
            kendall_tau REAL
        );
        CREATE TABLE IF NOT EXISTS run_groups (
            alg TEXT NOT NULL,
            heuristic_optimal TEXT NOT NULL,
            heuristic_greedy TEXT NOT NULL,
            weight REAL NOT NULL,
            epsilon REAL NOT NULL,
            runs INT NOT NULL,
            mean_expanded REAL NOT NULL,
            mean_quality REAL NOT NULL,
            mean_time REAL NOT NULL
        );
        ",
    )?;
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO results (id, domain, alg, heuristic_optimal, heuristic_greedy, weight, \
             epsilon, solution, expanded, time, init_h) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        for row in &report.datasets.results {
            stmt.execute(params![
                row.id as i64,
                row.domain,
                row.alg,
                row.heuristic_optimal,
                row.heuristic_greedy,
                row.weight,
                row.epsilon,
                row.solution,
                row.expanded as i64,
                row.time,
                row.init_h
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO heuristics (id, domain, heuristic_optimal, heuristic_greedy, init_ho, init_hg) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for row in &report.datasets.heuristics {
            stmt.execute(params![
                row.id as i64,
                row.domain,
                row.heuristic_optimal,
                row.heuristic_greedy,
                row.init_ho,
                row.init_hg
            ])?;
        }

        let mut stmt = tx.prepare("INSERT INTO optimal_costs (id, cost) VALUES (?1, ?2)")?;
        for (id, cost) in report.ground_truth.costs.iter() {
            stmt.execute(params![id as i64, cost])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO heuristic_stats (heuristic_optimal, heuristic_greedy, epsilon, source, \
             instances, mean_ratio, kendall_tau) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for s in &report.statistics {
            stmt.execute(params![
                s.key.heuristic_optimal,
                s.key.heuristic_greedy,
                s.key.epsilon,
                source_name(s.source),
                s.instances as i64,
                s.mean_ratio,
                s.kendall_tau
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO run_groups (alg, heuristic_optimal, heuristic_greedy, weight, epsilon, \
             runs, mean_expanded, mean_quality, mean_time) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for g in &report.run_groups {
            stmt.execute(params![
                g.key.alg,
                g.key.heuristic_optimal,
                g.key.heuristic_greedy,
                g.key.weight,
                g.key.epsilon,
                g.runs as i64,
                g.mean_expanded,
                g.mean_quality,
                g.mean_time
            ])?;
        }
    }
    tx.commit()?;
    info!(
        "Wrote {} with {} results and {} heuristic rows",
        DATABASE_FILE,
        report.datasets.results.len(),
        report.datasets.heuristics.len()
    );
    Ok(())
}

#[derive(Serialize)]
struct StatisticsDocument<'a> {
    ground_truth: GroundTruth,
    instances: usize,
    statistics: &'a [HeuristicStats],
    run_groups: &'a [RunGroupSummary],
}

fn write_statistics(path: &Path, report: &AnalysisReport) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let doc = StatisticsDocument {
        ground_truth: report.ground_truth.source,
        instances: report.ground_truth.costs.len(),
        statistics: &report.statistics,
        run_groups: &report.run_groups,
    };
    let json = serde_json::to_string_pretty(&doc)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;
    info!(
        "Wrote {} with {} configurations",
        STATISTICS_FILE,
        report.statistics.len()
    );
    Ok(())
}
