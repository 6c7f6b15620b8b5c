//! Data-quality anomaly rules
//!
//! Anomalies are discrete findings, separate from the continuous drift score.
//! Each rule is stateless and looks at one feature at a time; rules never
//! suppress each other, so a feature may raise several anomalies.

mod rules;

pub use rules::{DistributionShiftRule, MissingSpikeRule, OutlierRateRule};

use crate::baseline::FeatureStatistics;
use crate::data::Column;
use crate::error::{KolosalError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    /// Share of missing values jumped relative to the baseline
    MissingSpike,
    /// Mean moved several baseline standard deviations
    DistributionShift,
    /// Too many values far outside the baseline range
    Outliers,
}

impl std::fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AnomalyType::MissingSpike => "missing_spike",
            AnomalyType::DistributionShift => "distribution_shift",
            AnomalyType::Outliers => "outliers",
        };
        write!(f, "{}", name)
    }
}

/// Severity of an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A triggered anomaly rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub feature_name: String,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub description: String,
}

impl Anomaly {
    pub fn new(
        feature_name: impl Into<String>,
        anomaly_type: AnomalyType,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            feature_name: feature_name.into(),
            anomaly_type,
            severity,
            description: description.into(),
        }
    }
}

/// A per-feature anomaly check
pub trait AnomalyRule: Send + Sync {
    fn anomaly_type(&self) -> AnomalyType;

    /// Evaluate the current column against its baseline
    fn evaluate(&self, baseline: &FeatureStatistics, current: &Column) -> Option<Anomaly>;
}

/// Trigger points of the built-in rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyThresholds {
    /// Current missing % must exceed this multiple of the baseline missing %
    pub missing_spike_ratio: f64,
    /// Current missing % must also exceed this absolute percentage
    pub missing_min_pct: f64,
    /// Missing % above which a spike is high severity
    pub missing_high_pct: f64,
    /// Mean shift, in baseline standard deviations, that counts as a shift
    pub shift_z_score: f64,
    /// Values above `max * outlier_upper_factor` are outliers
    pub outlier_upper_factor: f64,
    /// Values below `min * outlier_lower_factor` are outliers
    pub outlier_lower_factor: f64,
    /// Outlier percentage that triggers the rule
    pub outlier_max_pct: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            missing_spike_ratio: 2.0,
            missing_min_pct: 10.0,
            missing_high_pct: 50.0,
            shift_z_score: 3.0,
            outlier_upper_factor: 1.5,
            outlier_lower_factor: 0.5,
            outlier_max_pct: 5.0,
        }
    }
}

impl AnomalyThresholds {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("anomaly.missing_spike_ratio", self.missing_spike_ratio),
            ("anomaly.shift_z_score", self.shift_z_score),
            ("anomaly.outlier_upper_factor", self.outlier_upper_factor),
            ("anomaly.outlier_lower_factor", self.outlier_lower_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(KolosalError::invalid_parameter(name, value, "must be positive"));
            }
        }

        let percentages = [
            ("anomaly.missing_min_pct", self.missing_min_pct),
            ("anomaly.missing_high_pct", self.missing_high_pct),
            ("anomaly.outlier_max_pct", self.outlier_max_pct),
        ];
        for (name, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(KolosalError::invalid_parameter(name, value, "must be within [0, 100]"));
            }
        }

        Ok(())
    }
}

/// Ordered collection of anomaly rules
#[derive(Clone, Default)]
pub struct AnomalyRuleSet {
    rules: Vec<Arc<dyn AnomalyRule>>,
}

impl AnomalyRuleSet {
    /// A rule set with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Missing-spike, distribution-shift and outlier-rate rules, in that order
    pub fn from_thresholds(thresholds: &AnomalyThresholds) -> Self {
        Self::empty()
            .with_rule(MissingSpikeRule::from_thresholds(thresholds))
            .with_rule(DistributionShiftRule::from_thresholds(thresholds))
            .with_rule(OutlierRateRule::from_thresholds(thresholds))
    }

    /// Append a rule, evaluated after the existing ones
    pub fn with_rule(mut self, rule: impl AnomalyRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule, keeping rule order
    pub fn evaluate(&self, baseline: &FeatureStatistics, current: &Column) -> Vec<Anomaly> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(baseline, current))
            .collect()
    }
}

impl std::fmt::Debug for AnomalyRuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.anomaly_type()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_order() {
        let rules = AnomalyRuleSet::from_thresholds(&AnomalyThresholds::default());
        assert_eq!(rules.len(), 3);
        assert_eq!(
            format!("{:?}", rules),
            "[MissingSpike, DistributionShift, Outliers]"
        );
    }

    #[test]
    fn test_all_rules_fire_independently() {
        let baseline = FeatureStatistics::numeric("x", 10.0, 1.0, 5.0, 15.0, 0, 10, 100);
        // 60% missing, the rest far above max: every rule triggers
        let mut values = vec![None; 60];
        values.extend(std::iter::repeat(Some(100.0)).take(40));
        let column = Column::numeric("x", values);

        let anomalies = AnomalyRuleSet::from_thresholds(&AnomalyThresholds::default())
            .evaluate(&baseline, &column);
        let types: Vec<AnomalyType> = anomalies.iter().map(|a| a.anomaly_type).collect();
        assert_eq!(
            types,
            vec![
                AnomalyType::MissingSpike,
                AnomalyType::DistributionShift,
                AnomalyType::Outliers
            ]
        );
        assert_eq!(anomalies[0].severity, Severity::High);
    }

    #[test]
    fn test_severity_order_and_serde() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");
        assert_eq!(
            serde_json::to_string(&AnomalyType::DistributionShift).unwrap(),
            "\"distribution_shift\""
        );
    }

    #[test]
    fn test_threshold_validation() {
        assert!(AnomalyThresholds::default().validate().is_ok());

        let bad_ratio = AnomalyThresholds {
            missing_spike_ratio: -1.0,
            ..Default::default()
        };
        assert!(bad_ratio.validate().is_err());

        let bad_pct = AnomalyThresholds {
            outlier_max_pct: 150.0,
            ..Default::default()
        };
        assert!(bad_pct.validate().is_err());
    }
}
