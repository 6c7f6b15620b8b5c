//! Data quality checks run before drift detection
//!
//! Schema validation against an expected column list, and a per-dataset
//! summary of missing values and duplicate rows.

use crate::data::{ColumnValues, Dataset};
use crate::error::{KolosalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use tracing::{info, warn};

/// Outcome of a successful schema validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCheck {
    /// Columns present in the dataset but not expected, sorted
    pub extra_columns: Vec<String>,
}

/// Check that every expected column is present.
///
/// Missing columns fail with [`KolosalError::ValidationError`]. Unexpected
/// columns are tolerated and reported.
pub fn validate_schema(dataset: &Dataset, expected_columns: &[String]) -> Result<SchemaCheck> {
    let expected: BTreeSet<&str> = expected_columns.iter().map(String::as_str).collect();

    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !dataset.has_column(name))
        .collect();
    if !missing.is_empty() {
        return Err(KolosalError::ValidationError(format!(
            "Missing columns: {}",
            missing.join(", ")
        )));
    }

    let extra: BTreeSet<&str> = dataset
        .column_names()
        .filter(|name| !expected.contains(name))
        .collect();
    if !extra.is_empty() {
        warn!(columns = ?extra, "Unexpected columns in dataset");
    }

    Ok(SchemaCheck {
        extra_columns: extra.into_iter().map(str::to_string).collect(),
    })
}

/// Missing values of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingStats {
    pub count: usize,
    pub percentage: f64,
}

/// Quality warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QualityWarning {
    /// Column has high proportion of missing values
    HighMissingness { column: String, percentage: f64 },
    /// Duplicate rows detected
    DuplicateRows { count: usize, total: usize },
}

impl fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityWarning::HighMissingness { column, percentage } => {
                write!(f, "{} is {:.1}% missing", column, percentage)
            }
            QualityWarning::DuplicateRows { count, total } => {
                write!(f, "{} of {} rows are duplicates", count, total)
            }
        }
    }
}

/// Quality summary of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub total_rows: usize,
    pub missing_values: BTreeMap<String, MissingStats>,
    /// Rows equal to an earlier row
    pub duplicate_rows: usize,
    pub warnings: Vec<QualityWarning>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Computes [`DataQualityReport`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityChecker {
    /// Warn when a column's missing percentage exceeds this value
    pub missing_warn_pct: f64,
}

impl Default for DataQualityChecker {
    fn default() -> Self {
        Self {
            missing_warn_pct: 20.0,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
enum Cell<'a> {
    Null,
    Number(u64),
    Text(&'a str),
}

impl DataQualityChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_warn_pct(mut self, pct: f64) -> Self {
        self.missing_warn_pct = pct;
        self
    }

    pub fn check(&self, dataset: &Dataset) -> DataQualityReport {
        let total_rows = dataset.row_count();
        let mut warnings = Vec::new();

        let missing_values: BTreeMap<String, MissingStats> = dataset
            .columns()
            .iter()
            .map(|column| {
                let count = column.null_count();
                let percentage = if total_rows == 0 {
                    0.0
                } else {
                    100.0 * count as f64 / total_rows as f64
                };
                (column.name().to_string(), MissingStats { count, percentage })
            })
            .collect();

        for (column, stats) in &missing_values {
            if stats.percentage > self.missing_warn_pct {
                warnings.push(QualityWarning::HighMissingness {
                    column: column.clone(),
                    percentage: stats.percentage,
                });
            }
        }

        let duplicate_rows = count_duplicate_rows(dataset);
        if duplicate_rows > 0 {
            warnings.push(QualityWarning::DuplicateRows {
                count: duplicate_rows,
                total: total_rows,
            });
        }

        for warning in &warnings {
            warn!(warning = %warning, "Data quality warning");
        }
        info!(
            rows = total_rows,
            columns = dataset.n_columns(),
            duplicate_rows,
            warnings = warnings.len(),
            "Data quality check complete"
        );

        DataQualityReport {
            total_rows,
            missing_values,
            duplicate_rows,
            warnings,
        }
    }
}

fn count_duplicate_rows(dataset: &Dataset) -> usize {
    let mut seen: HashSet<Vec<Cell<'_>>> = HashSet::with_capacity(dataset.row_count());
    let mut duplicates = 0;

    for row in 0..dataset.row_count() {
        let key: Vec<Cell<'_>> = dataset
            .columns()
            .iter()
            .map(|column| match column.values() {
                ColumnValues::Numeric(values) => match values[row] {
                    Some(v) if v == 0.0 => Cell::Number(0.0f64.to_bits()),
                    Some(v) => Cell::Number(v.to_bits()),
                    None => Cell::Null,
                },
                ColumnValues::Categorical(values) => match &values[row] {
                    Some(s) => Cell::Text(s.as_str()),
                    None => Cell::Null,
                },
            })
            .collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    duplicates
}
