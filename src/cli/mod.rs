//! Kolosal Drift CLI Module
//!
//! Command-line interface for building baselines, checking drift and
//! summarizing data quality.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::anomaly::Severity;
use crate::baseline::{BaselineBuilder, BaselineStatistics};
use crate::config::MonitorConfig;
use crate::data::loader::load_data;
use crate::data::Dataset;
use crate::monitoring::{DriftMonitor, DriftReport, JsonLinesPublisher, MetricsPublisher, TracingPublisher};
use crate::quality::{validate_schema, DataQualityChecker};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn warn(s: &str) -> ColoredString   { s.truecolor(230, 190, 90) }
fn bad(s: &str) -> ColoredString    { s.truecolor(235, 100, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(&format!("{:<20}", key)), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => bad("HIGH"),
        Severity::Medium => warn("MEDIUM"),
        Severity::Low => muted("LOW"),
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "kolosal-drift")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Feature drift and data quality monitoring for ML pipelines")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute baseline statistics from training data
    Baseline {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Version label stored with the baseline
        #[arg(long)]
        dataset_version: String,

        /// Comma-separated features to include (default: all columns)
        #[arg(short, long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Output baseline file (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compare data against a baseline
    Check {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Baseline file produced by `baseline`
        #[arg(short, long)]
        baseline: PathBuf,

        /// Monitor configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Drift threshold, overrides the configuration
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append report metrics to a JSON lines file
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Summarize missing values and duplicates
    Quality {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Comma-separated columns that must be present
        #[arg(short, long, value_delimiter = ',')]
        expected_columns: Option<Vec<String>>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

fn load_step(path: &PathBuf) -> anyhow::Result<Dataset> {
    step_run("Loading data");
    let start = Instant::now();
    let data = load_data(path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        data.row_count(),
        data.n_columns(),
        start.elapsed()
    ));
    Ok(data)
}

pub fn cmd_baseline(
    data_path: &PathBuf,
    dataset_version: &str,
    features: Option<Vec<String>>,
    output: &Path,
) -> anyhow::Result<()> {
    section("Baseline");

    let data = load_step(data_path)?;

    let mut builder = BaselineBuilder::new(dataset_version);
    if let Some(features) = features {
        builder = builder.with_features(features);
    }

    step_run("Computing statistics");
    let start = Instant::now();
    let baseline = builder.build(&data)?;
    step_done(&format!("{} features in {:?}", baseline.n_features(), start.elapsed()));

    baseline.save(output)?;
    step_ok(&format!("Saved → {}", output.display()));

    println!();
    println!("  {:<20} {:>8} {:>12} {:>12} {:>8}",
        muted("Feature"), muted("Type"), muted("Mean"), muted("Std"), muted("Missing"));
    println!("  {}", dim(&"─".repeat(64)));
    for stats in baseline.feature_statistics.values() {
        let fmt_opt = |v: Option<f64>| v.map(|x| format!("{:.4}", x)).unwrap_or_else(|| "-".to_string());
        println!("  {:<20} {:>8} {:>12} {:>12} {:>8}",
            stats.feature_name,
            stats.data_type.to_string(),
            fmt_opt(stats.mean),
            fmt_opt(stats.std),
            stats.missing_count);
    }
    println!();

    Ok(())
}

pub fn cmd_check(
    data_path: &PathBuf,
    baseline_path: &Path,
    config_path: Option<&Path>,
    threshold: Option<f64>,
    output: Option<&Path>,
    metrics_out: Option<&Path>,
) -> anyhow::Result<()> {
    section("Drift Check");

    let mut config = match config_path {
        Some(path) => MonitorConfig::from_json_file(path)?,
        None => MonitorConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(t) = threshold {
        config = config.with_threshold(t);
    }
    let monitor = DriftMonitor::new(config)?;

    let baseline = BaselineStatistics::load(baseline_path)?;
    step_ok(&format!(
        "Baseline {} ({} features)",
        baseline.dataset_version.cyan(),
        baseline.n_features()
    ));

    let data = load_step(data_path)?;

    step_run("Detecting drift");
    let start = Instant::now();
    let report = monitor.detect(Some(&baseline), &data);
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&report, monitor.config().drift_threshold);

    if let Some(path) = output {
        std::fs::write(path, report.to_json()?)?;
        step_ok(&format!("Report → {}", path.display()));
    }

    let metrics = report.metrics();
    match metrics_out {
        Some(path) => {
            JsonLinesPublisher::new(path).publish(&metrics)?;
            step_ok(&format!("Metrics → {}", path.display()));
        }
        None => TracingPublisher::default().publish(&metrics)?,
    }

    println!();
    Ok(())
}

fn print_report(report: &DriftReport, threshold: f64) {
    let status = if report.has_drift() { bad("DRIFT") } else { ok("STABLE") };

    println!();
    line_box_top();
    line_box(&kv("Status", &status.to_string()));
    line_box(&kv("Overall score", &format!("{:.4}", report.drift_score)));
    line_box(&kv("Threshold", &format!("{:.4}", threshold)));
    line_box(&kv("Features compared", &report.statistics_comparison.len().to_string()));
    line_box(&kv("Drifted features", &report.features_with_drift.len().to_string()));
    line_box(&kv("Anomalies", &report.anomalies.len().to_string()));
    if !report.skipped_features.is_empty() {
        line_box(&kv("Skipped", &report.skipped_features.join(", ")));
    }
    if !report.failed_features.is_empty() {
        line_box(&kv("Failed", &report.failed_features.join(", ")));
    }
    line_box_sep();
    for (name, cmp) in &report.statistics_comparison {
        let mut score = format!("{:.4} {}", cmp.drift_score, dim(&cmp.score_method.to_string()));
        if cmp.is_degraded() {
            score.push_str(&format!(" {}", warn("degraded")));
        }
        let marker = if cmp.drift_score > threshold { bad("●") } else { ok("●") };
        line_box(&format!("{} {}", marker, kv(name, &score)));
    }
    line_box_bottom();

    if !report.anomalies.is_empty() {
        section("Anomalies");
        for a in &report.anomalies {
            println!("  {:<8} {:<20} {}", severity_label(a.severity), a.feature_name, muted(&a.description));
        }
    }
}

pub fn cmd_quality(data_path: &PathBuf, expected_columns: Option<Vec<String>>) -> anyhow::Result<()> {
    section("Data Quality");

    let data = load_step(data_path)?;

    if let Some(expected) = expected_columns {
        let check = validate_schema(&data, &expected)?;
        step_ok("Schema valid");
        if !check.extra_columns.is_empty() {
            println!("  {} extra columns: {}", warn("!"), check.extra_columns.join(", "));
        }
    }

    let report = DataQualityChecker::default().check(&data);

    println!();
    println!("  {:<20} {:>8} {:>10}", muted("Column"), muted("Missing"), muted("Percent"));
    println!("  {}", dim(&"─".repeat(40)));
    for (name, stats) in &report.missing_values {
        println!("  {:<20} {:>8} {:>9.1}%", name, stats.count, stats.percentage);
    }

    println!();
    println!("  {}", kv("Rows", &report.total_rows.to_string()));
    println!("  {}", kv("Duplicate rows", &report.duplicate_rows.to_string()));

    if report.is_clean() {
        step_ok("No quality warnings");
    } else {
        for w in &report.warnings {
            println!("  {} {}", warn("!"), w);
        }
    }
    println!();

    Ok(())
}
