//! Built-in anomaly rules

use super::{Anomaly, AnomalyRule, AnomalyThresholds, AnomalyType, Severity};
use crate::baseline::FeatureStatistics;
use crate::data::Column;

/// Missing values jumped well above the baseline share
#[derive(Debug, Clone)]
pub struct MissingSpikeRule {
    ratio: f64,
    min_pct: f64,
    high_pct: f64,
}

impl MissingSpikeRule {
    pub fn from_thresholds(thresholds: &AnomalyThresholds) -> Self {
        Self {
            ratio: thresholds.missing_spike_ratio,
            min_pct: thresholds.missing_min_pct,
            high_pct: thresholds.missing_high_pct,
        }
    }
}

impl Default for MissingSpikeRule {
    fn default() -> Self {
        Self::from_thresholds(&AnomalyThresholds::default())
    }
}

impl AnomalyRule for MissingSpikeRule {
    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::MissingSpike
    }

    fn evaluate(&self, baseline: &FeatureStatistics, current: &Column) -> Option<Anomaly> {
        if current.is_empty() {
            return None;
        }

        let current_pct = 100.0 * current.null_count() as f64 / current.len() as f64;
        let baseline_pct = baseline.missing_pct();

        if current_pct > self.ratio * baseline_pct && current_pct > self.min_pct {
            let severity = if current_pct > self.high_pct {
                Severity::High
            } else {
                Severity::Medium
            };
            Some(Anomaly::new(
                &baseline.feature_name,
                AnomalyType::MissingSpike,
                severity,
                format!(
                    "Missing values increased from {:.1}% to {:.1}%",
                    baseline_pct, current_pct
                ),
            ))
        } else {
            None
        }
    }
}

/// Current mean moved several baseline standard deviations
#[derive(Debug, Clone)]
pub struct DistributionShiftRule {
    z_threshold: f64,
}

impl DistributionShiftRule {
    pub fn from_thresholds(thresholds: &AnomalyThresholds) -> Self {
        Self {
            z_threshold: thresholds.shift_z_score,
        }
    }
}

impl Default for DistributionShiftRule {
    fn default() -> Self {
        Self::from_thresholds(&AnomalyThresholds::default())
    }
}

impl AnomalyRule for DistributionShiftRule {
    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::DistributionShift
    }

    fn evaluate(&self, baseline: &FeatureStatistics, current: &Column) -> Option<Anomaly> {
        let mean = baseline.mean?;
        let std = baseline.positive_std()?;
        let summary = current.coerced_summary()?;

        let z_score = (summary.mean - mean).abs() / std;
        if z_score > self.z_threshold {
            Some(Anomaly::new(
                &baseline.feature_name,
                AnomalyType::DistributionShift,
                Severity::High,
                format!("Mean shifted by {:.2} standard deviations", z_score),
            ))
        } else {
            None
        }
    }
}

/// Too many values far outside the baseline range
#[derive(Debug, Clone)]
pub struct OutlierRateRule {
    upper_factor: f64,
    lower_factor: f64,
    max_pct: f64,
}

impl OutlierRateRule {
    pub fn from_thresholds(thresholds: &AnomalyThresholds) -> Self {
        Self {
            upper_factor: thresholds.outlier_upper_factor,
            lower_factor: thresholds.outlier_lower_factor,
            max_pct: thresholds.outlier_max_pct,
        }
    }

    /// Number of values above `max * upper_factor` or below `min * lower_factor`
    pub fn count_outliers(&self, values: &[f64], min: f64, max: f64) -> usize {
        let upper = max * self.upper_factor;
        let lower = min * self.lower_factor;
        values.iter().filter(|&&v| v > upper || v < lower).count()
    }
}

impl Default for OutlierRateRule {
    fn default() -> Self {
        Self::from_thresholds(&AnomalyThresholds::default())
    }
}

impl AnomalyRule for OutlierRateRule {
    fn anomaly_type(&self) -> AnomalyType {
        AnomalyType::Outliers
    }

    fn evaluate(&self, baseline: &FeatureStatistics, current: &Column) -> Option<Anomaly> {
        let (min, max) = (baseline.min?, baseline.max?);
        let values = current.coerce_numeric().values;
        if current.is_empty() {
            return None;
        }

        let outliers = self.count_outliers(&values, min, max);
        let outlier_pct = 100.0 * outliers as f64 / current.len() as f64;

        if outlier_pct > self.max_pct {
            Some(Anomaly::new(
                &baseline.feature_name,
                AnomalyType::Outliers,
                Severity::Medium,
                format!("{:.1}% of values are outliers", outlier_pct),
            ))
        } else {
            None
        }
    }
}
