//! Drift metrics and publishers
//!
//! [`DriftMetrics`] is a pure projection of a [`DriftReport`]. A
//! [`MetricsPublisher`] forwards it to an external monitoring system.

use super::report::DriftReport;
use crate::anomaly::Severity;
use crate::error::{KolosalError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Numeric summary of a drift report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMetrics {
    pub baseline_version: String,
    pub overall_drift_score: f64,
    pub features_with_drift_count: usize,
    pub anomaly_count: usize,
    pub high_severity_anomalies: usize,
    pub degraded_feature_count: usize,
    pub skipped_feature_count: usize,
}

impl From<&DriftReport> for DriftMetrics {
    fn from(report: &DriftReport) -> Self {
        Self {
            baseline_version: report.baseline_version.clone(),
            overall_drift_score: report.drift_score,
            features_with_drift_count: report.features_with_drift.len(),
            anomaly_count: report.anomalies.len(),
            high_severity_anomalies: report
                .anomalies
                .iter()
                .filter(|a| a.severity == Severity::High)
                .count(),
            degraded_feature_count: report.degraded_features().len(),
            skipped_feature_count: report.skipped_features.len(),
        }
    }
}

/// Sink for drift metrics
pub trait MetricsPublisher: Send + Sync {
    fn publish(&self, metrics: &DriftMetrics) -> Result<()>;
}

/// Emits metrics as structured log events
#[derive(Debug, Clone)]
pub struct TracingPublisher {
    namespace: String,
}

impl TracingPublisher {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for TracingPublisher {
    fn default() -> Self {
        Self::new("MLOps/DataDrift")
    }
}

impl MetricsPublisher for TracingPublisher {
    fn publish(&self, metrics: &DriftMetrics) -> Result<()> {
        info!(
            namespace = %self.namespace,
            baseline_version = %metrics.baseline_version,
            overall_drift_score = metrics.overall_drift_score,
            features_with_drift_count = metrics.features_with_drift_count,
            anomaly_count = metrics.anomaly_count,
            high_severity_anomalies = metrics.high_severity_anomalies,
            degraded_feature_count = metrics.degraded_feature_count,
            skipped_feature_count = metrics.skipped_feature_count,
            "Drift metrics"
        );
        Ok(())
    }
}

/// Keeps published metrics in memory
#[derive(Debug, Default)]
pub struct InMemoryPublisher {
    published: Mutex<Vec<DriftMetrics>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub fn published(&self) -> Vec<DriftMetrics> {
        self.published.lock().clone()
    }
}

impl MetricsPublisher for InMemoryPublisher {
    fn publish(&self, metrics: &DriftMetrics) -> Result<()> {
        self.published.lock().push(metrics.clone());
        Ok(())
    }
}

#[derive(Serialize)]
struct MetricsRecord<'a> {
    published_at: DateTime<Utc>,
    #[serde(flatten)]
    metrics: &'a DriftMetrics,
}

/// Appends one JSON object per publish to a file
#[derive(Debug)]
pub struct JsonLinesPublisher {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

impl MetricsPublisher for JsonLinesPublisher {
    fn publish(&self, metrics: &DriftMetrics) -> Result<()> {
        let record = MetricsRecord {
            published_at: Utc::now(),
            metrics,
        };
        let line = serde_json::to_string(&record)?;

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| KolosalError::PublishError(format!("{}: {}", self.path.display(), e)))?;
        writeln!(file, "{}", line)
            .map_err(|e| KolosalError::PublishError(format!("{}: {}", self.path.display(), e)))?;
        Ok(())
    }
}
