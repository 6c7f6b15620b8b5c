//! In-memory tabular data
//!
//! The monitoring engine never performs I/O. It works on a [`Dataset`]: a set of
//! named, typed columns sharing one row count, with missing values marked
//! explicitly as `None`. The [`loader`] module builds datasets from files.

pub mod loader;

pub use loader::DataLoader;

use crate::error::{KolosalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Statistical type of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKind::Numeric => write!(f, "numeric"),
            FeatureKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Typed values of a column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "lowercase")]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

/// Result of coercing a column to numbers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericCoercion {
    /// Successfully coerced non-null values
    pub values: Vec<f64>,
    /// Non-null values that could not be parsed as numbers
    pub failed: usize,
}

impl NumericCoercion {
    /// Whether every non-null value coerced
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// A named column of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: ColumnValues,
}

impl Column {
    /// Create a numeric column. Non-finite values (`NaN`, `±inf`) are stored as missing.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    /// Create a numeric column without missing markers (non-finite values still count as missing)
    pub fn numeric_dense(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::numeric(name, values.into_iter().map(Some).collect())
    }

    /// Create a categorical column
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(
                values.into_iter().map(|v| v.map(Into::into)).collect(),
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ColumnValues {
        &self.values
    }

    /// Statistical type of the stored values
    pub fn kind(&self) -> FeatureKind {
        match self.values {
            ColumnValues::Numeric(_) => FeatureKind::Numeric,
            ColumnValues::Categorical(_) => FeatureKind::Categorical,
        }
    }

    /// Number of rows, missing included
    pub fn len(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing values
    pub fn null_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnValues::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Non-null values of a numeric column, `None` for categorical columns
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v.iter().flatten().copied().collect()),
            ColumnValues::Categorical(_) => None,
        }
    }

    /// Coerce non-null values to numbers, parsing categorical labels.
    /// Labels that parse to a non-finite number count as failed.
    pub fn coerce_numeric(&self) -> NumericCoercion {
        match &self.values {
            ColumnValues::Numeric(v) => NumericCoercion {
                values: v.iter().flatten().copied().collect(),
                failed: 0,
            },
            ColumnValues::Categorical(v) => {
                let mut coercion = NumericCoercion::default();
                for label in v.iter().flatten() {
                    match label.trim().parse::<f64>() {
                        Ok(x) if x.is_finite() => coercion.values.push(x),
                        _ => coercion.failed += 1,
                    }
                }
                coercion
            }
        }
    }

    /// Count of each distinct non-null value. Numbers are keyed by their display form.
    pub fn value_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        match &self.values {
            ColumnValues::Numeric(v) => {
                for x in v.iter().flatten() {
                    *counts.entry(x.to_string()).or_insert(0) += 1;
                }
            }
            ColumnValues::Categorical(v) => {
                for label in v.iter().flatten() {
                    *counts.entry(label.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Number of distinct non-null values
    pub fn unique_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(v) => v
                .iter()
                .flatten()
                .map(|x| normalize_zero(*x).to_bits())
                .collect::<HashSet<_>>()
                .len(),
            ColumnValues::Categorical(v) => v.iter().flatten().collect::<HashSet<_>>().len(),
        }
    }

    /// Summary of the non-null values of a numeric column
    pub fn summary(&self) -> Option<NumericSummary> {
        self.numeric_values()
            .and_then(|values| NumericSummary::from_values(&values))
    }

    /// Summary of the values that coerce to numbers, for either column type
    pub fn coerced_summary(&self) -> Option<NumericSummary> {
        NumericSummary::from_values(&self.coerce_numeric().values)
    }
}

fn normalize_zero(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

/// Summary statistics of a set of numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1), undefined for fewer than two values
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarize a slice of values, `None` when it is empty
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let std = if count > 1 {
            let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>()
                / (count - 1) as f64;
            Some(variance.sqrt())
        } else {
            None
        };

        Some(Self {
            count,
            mean,
            std,
            min,
            max,
        })
    }
}

/// Named-column tabular data with a known row count
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.n_rows == other.n_rows && self.columns == other.columns
    }
}

impl Dataset {
    /// Create an empty dataset with a fixed row count
    pub fn new(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            index: HashMap::new(),
            n_rows,
        }
    }

    /// Build a dataset from columns; the row count is taken from the first column
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut dataset = Self::new(n_rows);
        for column in columns {
            dataset.add_column(column)?;
        }
        Ok(dataset)
    }

    /// Builder-style [`Dataset::add_column`]
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        self.add_column(column)?;
        Ok(self)
    }

    /// Append a column, checking its length and name
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.n_rows {
            return Err(KolosalError::ShapeError {
                expected: format!("{} rows", self.n_rows),
                actual: format!("{} rows in column '{}'", column.len(), column.name()),
            });
        }
        if self.index.contains_key(column.name()) {
            return Err(KolosalError::ValidationError(format!(
                "Duplicate column name: {}",
                column.name()
            )));
        }
        self.index.insert(column.name().to_string(), self.columns.len());
        self.columns.push(column);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in insertion order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }
}
