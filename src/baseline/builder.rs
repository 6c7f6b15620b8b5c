//! Baseline computation from a training dataset

use super::{BaselineStatistics, FeatureStatistics};
use crate::data::{Column, ColumnValues, Dataset};
use crate::error::{KolosalError, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{info, warn};

/// Computes [`BaselineStatistics`] from training data
#[derive(Debug, Clone)]
pub struct BaselineBuilder {
    dataset_version: String,
    created_at: Option<DateTime<Utc>>,
    features: Option<Vec<String>>,
}

impl BaselineBuilder {
    pub fn new(dataset_version: impl Into<String>) -> Self {
        Self {
            dataset_version: dataset_version.into(),
            created_at: None,
            features: None,
        }
    }

    /// Only summarize these columns
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }

    /// Pin the creation timestamp (defaults to now)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Summarize every selected column of the dataset
    pub fn build(&self, data: &Dataset) -> Result<BaselineStatistics> {
        if data.row_count() == 0 {
            return Err(KolosalError::ValidationError(
                "Cannot build a baseline from an empty dataset".to_string(),
            ));
        }

        let columns: Vec<&Column> = match &self.features {
            Some(names) => names
                .iter()
                .map(|name| {
                    data.column(name)
                        .ok_or_else(|| KolosalError::FeatureNotFound(name.clone()))
                })
                .collect::<Result<_>>()?,
            None => data.columns().iter().collect(),
        };

        let row_count = data.row_count();
        let stats: Vec<FeatureStatistics> = columns
            .par_iter()
            .filter_map(|column| {
                let stats = summarize(column, row_count);
                if stats.is_none() {
                    warn!(feature = %column.name(), "Column has no values, left out of baseline");
                }
                stats
            })
            .collect();

        info!(
            dataset_version = %self.dataset_version,
            features = stats.len(),
            rows = row_count,
            "Built baseline statistics"
        );

        Ok(BaselineStatistics::new(
            self.dataset_version.clone(),
            self.created_at.unwrap_or_else(Utc::now),
            stats,
        ))
    }
}

/// Summary of one column, `None` when every value is missing
fn summarize(column: &Column, row_count: usize) -> Option<FeatureStatistics> {
    if column.non_null_count() == 0 {
        return None;
    }

    let missing_count = column.null_count();
    let unique_count = column.unique_count();

    match column.values() {
        ColumnValues::Numeric(_) => {
            let summary = column.summary()?;
            Some(FeatureStatistics {
                feature_name: column.name().to_string(),
                data_type: column.kind(),
                mean: Some(summary.mean),
                std: summary.std,
                min: Some(summary.min),
                max: Some(summary.max),
                missing_count,
                unique_count,
                baseline_row_count: row_count,
            })
        }
        ColumnValues::Categorical(_) => Some(FeatureStatistics::categorical(
            column.name(),
            missing_count,
            unique_count,
            row_count,
        )),
    }
}
