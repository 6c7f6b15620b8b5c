//! Monitoring Module
//!
//! Drift detection against a baseline, the resulting report, and publication
//! of report metrics.

pub mod metrics;
mod monitor;
pub mod report;
pub mod service;

pub use metrics::{DriftMetrics, InMemoryPublisher, JsonLinesPublisher, MetricsPublisher, TracingPublisher};
pub use monitor::DriftMonitor;
pub use report::{DriftReport, StatisticsComparison, NO_BASELINE_VERSION};
pub use service::MonitoringService;
