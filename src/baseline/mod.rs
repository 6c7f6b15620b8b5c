//! Training-time baseline statistics
//!
//! A baseline summarizes the training distribution of every feature. It is
//! computed once by [`BaselineBuilder`], stored by a [`BaselineRepository`]
//! and never mutated afterwards.

mod builder;
pub mod repository;

pub use builder::BaselineBuilder;
pub use repository::{BaselineRepository, FileBaselineRepository, InMemoryBaselineRepository};

pub use crate::data::FeatureKind;

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Baseline summary of a single feature
///
/// `mean`, `std`, `min` and `max` are set for numeric features only. They are
/// serialized as explicit `null` for categorical features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    pub feature_name: String,
    pub data_type: FeatureKind,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub missing_count: usize,
    pub unique_count: usize,
    pub baseline_row_count: usize,
}

impl FeatureStatistics {
    /// Statistics for a numeric feature
    #[allow(clippy::too_many_arguments)]
    pub fn numeric(
        feature_name: impl Into<String>,
        mean: f64,
        std: f64,
        min: f64,
        max: f64,
        missing_count: usize,
        unique_count: usize,
        baseline_row_count: usize,
    ) -> Self {
        Self {
            feature_name: feature_name.into(),
            data_type: FeatureKind::Numeric,
            mean: Some(mean),
            std: Some(std),
            min: Some(min),
            max: Some(max),
            missing_count,
            unique_count,
            baseline_row_count,
        }
    }

    /// Statistics for a categorical feature
    pub fn categorical(
        feature_name: impl Into<String>,
        missing_count: usize,
        unique_count: usize,
        baseline_row_count: usize,
    ) -> Self {
        Self {
            feature_name: feature_name.into(),
            data_type: FeatureKind::Categorical,
            mean: None,
            std: None,
            min: None,
            max: None,
            missing_count,
            unique_count,
            baseline_row_count,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.data_type == FeatureKind::Numeric
    }

    /// Baseline standard deviation when it is usable as a scale (defined and > 0)
    pub fn positive_std(&self) -> Option<f64> {
        self.std.filter(|s| s.is_finite() && *s > 0.0)
    }

    /// Percentage of missing values in the baseline sample
    pub fn missing_pct(&self) -> f64 {
        if self.baseline_row_count == 0 {
            0.0
        } else {
            100.0 * self.missing_count as f64 / self.baseline_row_count as f64
        }
    }
}

/// Baseline of a training dataset, keyed by dataset version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStatistics {
    pub dataset_version: String,
    pub created_at: DateTime<Utc>,
    pub feature_statistics: BTreeMap<String, FeatureStatistics>,
}

impl BaselineStatistics {
    /// Assemble a baseline from per-feature statistics
    pub fn new(
        dataset_version: impl Into<String>,
        created_at: DateTime<Utc>,
        features: impl IntoIterator<Item = FeatureStatistics>,
    ) -> Self {
        Self {
            dataset_version: dataset_version.into(),
            created_at,
            feature_statistics: features
                .into_iter()
                .map(|f| (f.feature_name.clone(), f))
                .collect(),
        }
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureStatistics> {
        self.feature_statistics.get(name)
    }

    pub fn n_features(&self) -> usize {
        self.feature_statistics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_statistics.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save the baseline to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load a baseline from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_fields_serialize_as_null() {
        let stats = FeatureStatistics::categorical("gender", 3, 2, 100);
        let value = serde_json::to_value(&stats).unwrap();
        let obj = value.as_object().unwrap();

        for field in ["mean", "std", "min", "max"] {
            assert!(obj.contains_key(field), "{} omitted", field);
            assert!(obj[field].is_null());
        }
        assert_eq!(obj["data_type"], "categorical");
        assert_eq!(obj["baseline_row_count"], 100);
    }

    #[test]
    fn test_missing_pct() {
        let stats = FeatureStatistics::numeric("age", 45.5, 12.3, 18.0, 90.0, 50, 60, 1000);
        assert!((stats.missing_pct() - 5.0).abs() < 1e-12);

        let empty = FeatureStatistics::categorical("c", 0, 1, 0);
        assert_eq!(empty.missing_pct(), 0.0);
    }

    #[test]
    fn test_positive_std() {
        let mut stats = FeatureStatistics::numeric("x", 0.0, 0.0, 0.0, 0.0, 0, 1, 10);
        assert_eq!(stats.positive_std(), None);
        stats.std = Some(2.0);
        assert_eq!(stats.positive_std(), Some(2.0));
        assert_eq!(FeatureStatistics::categorical("c", 0, 1, 1).positive_std(), None);
    }

    #[test]
    fn test_baseline_keys_by_feature_name() {
        let baseline = BaselineStatistics::new(
            "v1.0",
            Utc::now(),
            vec![
                FeatureStatistics::numeric("age", 45.5, 12.3, 18.0, 90.0, 5, 50, 500),
                FeatureStatistics::categorical("gender", 0, 2, 500),
            ],
        );

        assert_eq!(baseline.n_features(), 2);
        assert!(baseline.feature("age").unwrap().is_numeric());
        assert!(baseline.feature("height").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let baseline = BaselineStatistics::new(
            "v2",
            Utc::now(),
            vec![FeatureStatistics::categorical("brand", 1, 4, 20)],
        );
        let file = tempfile::NamedTempFile::new().unwrap();
        baseline.save(file.path()).unwrap();

        let loaded = BaselineStatistics::load(file.path()).unwrap();
        assert_eq!(loaded, baseline);
    }
}
