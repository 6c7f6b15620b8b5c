//! Drift report produced by a monitoring run

use super::metrics::DriftMetrics;
use crate::anomaly::{Anomaly, Severity};
use crate::drift::{ScoreMethod, ScoreStatus};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Baseline version reported when no baseline was available
pub const NO_BASELINE_VERSION: &str = "none";

/// Baseline and current statistics of one scored feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsComparison {
    pub feature_name: String,
    pub baseline_mean: Option<f64>,
    pub current_mean: Option<f64>,
    pub baseline_std: Option<f64>,
    pub current_std: Option<f64>,
    pub drift_score: f64,
    pub score_method: ScoreMethod,
    pub score_status: ScoreStatus,
}

impl StatisticsComparison {
    pub fn is_degraded(&self) -> bool {
        matches!(self.score_status, ScoreStatus::Degraded { .. })
    }
}

/// Result of comparing a dataset against a baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub timestamp: DateTime<Utc>,
    pub baseline_version: String,
    /// Mean of the per-feature scores in `statistics_comparison`
    pub drift_score: f64,
    /// Sorted names of features whose score exceeded the threshold
    pub features_with_drift: Vec<String>,
    /// Triggered anomalies in evaluation order
    pub anomalies: Vec<Anomaly>,
    pub statistics_comparison: BTreeMap<String, StatisticsComparison>,
    /// Sorted names of features present on only one side
    #[serde(default)]
    pub skipped_features: Vec<String>,
    /// Sorted names of features whose score could not be computed
    #[serde(default)]
    pub failed_features: Vec<String>,
}

impl DriftReport {
    /// Report for a run without a usable baseline
    pub fn neutral(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            baseline_version: NO_BASELINE_VERSION.to_string(),
            drift_score: 0.0,
            features_with_drift: Vec::new(),
            anomalies: Vec::new(),
            statistics_comparison: BTreeMap::new(),
            skipped_features: Vec::new(),
            failed_features: Vec::new(),
        }
    }

    /// False when drift could not be measured for lack of a baseline
    pub fn has_baseline(&self) -> bool {
        self.baseline_version != NO_BASELINE_VERSION
    }

    pub fn has_drift(&self) -> bool {
        !self.features_with_drift.is_empty()
    }

    pub fn high_severity_anomalies(&self) -> usize {
        self.anomalies
            .iter()
            .filter(|a| a.severity == Severity::High)
            .count()
    }

    /// Features scored by a fallback algorithm
    pub fn degraded_features(&self) -> Vec<&str> {
        self.statistics_comparison
            .values()
            .filter(|c| c.is_degraded())
            .map(|c| c.feature_name.as_str())
            .collect()
    }

    pub fn anomalies_for<'a>(&'a self, feature: &'a str) -> impl Iterator<Item = &'a Anomaly> + 'a {
        self.anomalies.iter().filter(move |a| a.feature_name == feature)
    }

    /// Numeric projection for a metrics publisher
    pub fn metrics(&self) -> DriftMetrics {
        DriftMetrics::from(self)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Generate summary string
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str("Drift Report\n");
        s.push_str("============\n");
        s.push_str(&format!("Baseline version: {}\n", self.baseline_version));
        s.push_str(&format!("Timestamp: {}\n", self.timestamp.to_rfc3339()));
        s.push_str(&format!("Overall drift score: {:.4}\n", self.drift_score));
        s.push_str(&format!("Features compared: {}\n", self.statistics_comparison.len()));
        s.push_str(&format!("Drifted features: {}\n", self.features_with_drift.len()));
        s.push_str(&format!("Anomalies: {}\n", self.anomalies.len()));

        if !self.skipped_features.is_empty() {
            s.push_str(&format!("Skipped features: {}\n", self.skipped_features.join(", ")));
        }
        if !self.failed_features.is_empty() {
            s.push_str(&format!("Failed features: {}\n", self.failed_features.join(", ")));
        }

        if self.has_drift() {
            s.push_str("\nDrifted Features:\n");
            for name in &self.features_with_drift {
                let score = self
                    .statistics_comparison
                    .get(name)
                    .map(|c| c.drift_score)
                    .unwrap_or(0.0);
                s.push_str(&format!("  - {} ({:.4})\n", name, score));
            }
        }

        if !self.anomalies.is_empty() {
            s.push_str("\nAnomalies:\n");
            for a in &self.anomalies {
                let severity_str = match a.severity {
                    Severity::High => "HIGH",
                    Severity::Medium => "MEDIUM",
                    Severity::Low => "LOW",
                };
                s.push_str(&format!(
                    "  - {} [{}] {}: {}\n",
                    a.feature_name, severity_str, a.anomaly_type, a.description
                ));
            }
        }

        s
    }
}
