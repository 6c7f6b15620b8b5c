//! Data loading utilities
//!
//! Reads CSV, TSV, Parquet and line-delimited JSON files with polars and
//! converts the resulting frame into a [`Dataset`].

use crate::data::{Column, Dataset, FeatureKind};
use crate::error::{KolosalError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Data loader for the supported file formats
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used for schema inference in text formats
    infer_schema_length: usize,
    /// Columns to keep; all columns when empty
    columns: Vec<String>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
            columns: Vec::new(),
        }
    }

    /// Set the number of rows used to infer column types
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n.max(1);
        self
    }

    /// Restrict loading to the given columns
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Load a delimited text file
    pub fn load_csv(&self, path: impl AsRef<Path>, delimiter: u8) -> Result<Dataset> {
        let file = File::open(path.as_ref())?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        self.finish(df)
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let file = File::open(path.as_ref())?;
        let df = ParquetReader::new(file).finish()?;
        self.finish(df)
    }

    /// Load a line-delimited JSON file
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let file = File::open(path.as_ref())?;
        let df = JsonReader::new(file)
            .with_json_format(JsonFormat::JsonLines)
            .finish()?;
        self.finish(df)
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let dataset = match ext.as_str() {
            "csv" => self.load_csv(path, b',')?,
            "tsv" => self.load_csv(path, b'\t')?,
            "parquet" | "pq" => self.load_parquet(path)?,
            "json" | "jsonl" | "ndjson" => self.load_json(path)?,
            other => {
                return Err(KolosalError::DataError(format!(
                    "Unsupported file format '{}': {}",
                    other,
                    path.display()
                )))
            }
        };

        info!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.n_columns(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(dataset)
    }

    fn finish(&self, df: DataFrame) -> Result<Dataset> {
        let df = if self.columns.is_empty() {
            df
        } else {
            df.select(self.columns.iter().map(String::as_str))?
        };
        Dataset::from_dataframe(&df)
    }
}

/// Infer the feature kind of a polars dtype
pub fn feature_kind(dtype: &DataType) -> FeatureKind {
    match dtype {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 |
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 |
        DataType::Float32 | DataType::Float64 => FeatureKind::Numeric,
        _ => FeatureKind::Categorical,
    }
}

impl Dataset {
    /// Convert a polars frame, typing each column from its dtype
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let mut dataset = Dataset::new(df.height());

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let name = series.name().to_string();

            let converted = match feature_kind(series.dtype()) {
                FeatureKind::Numeric => {
                    let casted = series.cast(&DataType::Float64)?;
                    let values: Vec<Option<f64>> = casted.f64()?.into_iter().collect();
                    Column::numeric(name, values)
                }
                FeatureKind::Categorical => {
                    let casted = series.cast(&DataType::String)?;
                    let values: Vec<Option<String>> = casted
                        .str()?
                        .into_iter()
                        .map(|v| v.map(str::to_string))
                        .collect();
                    Column::categorical(name, values)
                }
            };

            debug!(column = %converted.name(), kind = %converted.kind(), "Converted column");
            dataset.add_column(converted)?;
        }

        Ok(dataset)
    }
}

/// Load a dataset from a path, picking the reader by extension
pub fn load_data(path: &PathBuf) -> Result<Dataset> {
    DataLoader::new().load_auto(path)
}
