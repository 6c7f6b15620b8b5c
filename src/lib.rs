//! Kolosal Drift - Feature drift and data quality monitoring
//!
//! Compares production data with statistics captured from training data and
//! reports which features drifted and which anomalies appeared.
//!
//! # Modules
//!
//! ## Data
//! - [`data`] - Columnar datasets and file loading
//! - [`baseline`] - Training-time feature statistics and their storage
//! - [`quality`] - Schema validation and missing value / duplicate summaries
//!
//! ## Detection
//! - [`drift`] - Per-feature drift scoring (PSI, chi-square)
//! - [`anomaly`] - Missing-spike, distribution-shift and outlier rules
//! - [`monitoring`] - Drift reports, the monitor and metrics publishing
//!
//! ## Services
//! - [`config`] - Monitor configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use kolosal_drift::prelude::*;
//!
//! # fn main() -> kolosal_drift::Result<()> {
//! let loader = DataLoader::new();
//! let train = loader.load_auto("train.csv")?;
//! let baseline = BaselineBuilder::new("v1").build(&train)?;
//!
//! let monitor = DriftMonitor::new(MonitorConfig::default())?;
//! let report = monitor.detect(Some(&baseline), &loader.load_auto("today.csv")?);
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;
pub mod config;

// Data
pub mod data;
pub mod baseline;
pub mod quality;

// Detection
pub mod drift;
pub mod anomaly;
pub mod monitoring;

// Services
pub mod cli;

pub use error::{KolosalError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{KolosalError, Result};

    // Configuration
    pub use crate::config::MonitorConfig;

    // Data
    pub use crate::data::{Column, ColumnValues, DataLoader, Dataset, FeatureKind};

    // Baselines
    pub use crate::baseline::{
        BaselineBuilder, BaselineRepository, BaselineStatistics, FeatureStatistics,
        FileBaselineRepository, InMemoryBaselineRepository,
    };

    // Drift scoring
    pub use crate::drift::{
        ChiSquareScorer, DriftScore, DriftScorer, EmptyBinPolicy, PsiConfig, PsiScorer,
        ScoreMethod, ScoreStatus, Scorers,
    };

    // Anomaly rules
    pub use crate::anomaly::{Anomaly, AnomalyRule, AnomalyRuleSet, AnomalyThresholds, AnomalyType, Severity};

    // Monitoring
    pub use crate::monitoring::{
        DriftMetrics, DriftMonitor, DriftReport, MetricsPublisher, MonitoringService,
        StatisticsComparison,
    };

    // Data quality
    pub use crate::quality::{validate_schema, DataQualityChecker, DataQualityReport};
}
