//! Baseline lookup, drift detection and metrics publication in one call

use super::metrics::MetricsPublisher;
use super::monitor::DriftMonitor;
use super::report::DriftReport;
use crate::baseline::BaselineRepository;
use crate::data::Dataset;
use crate::error::Result;
use tracing::{info, warn};

/// Runs drift checks against stored baselines and publishes their metrics
pub struct MonitoringService<R, P> {
    monitor: DriftMonitor,
    baselines: R,
    publisher: P,
}

impl<R: BaselineRepository, P: MetricsPublisher> MonitoringService<R, P> {
    pub fn new(monitor: DriftMonitor, baselines: R, publisher: P) -> Self {
        Self {
            monitor,
            baselines,
            publisher,
        }
    }

    pub fn monitor(&self) -> &DriftMonitor {
        &self.monitor
    }

    pub fn baselines(&self) -> &R {
        &self.baselines
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Check `data` against the named baseline, or the most recent one when
    /// `version` is `None`.
    ///
    /// Repository failures are returned. An unknown version produces the
    /// neutral report. A failed publish is logged and the report is still
    /// returned.
    pub fn run(&self, data: &Dataset, version: Option<&str>) -> Result<DriftReport> {
        let baseline = match version {
            Some(v) => self.baselines.get(v)?,
            None => self.baselines.latest()?,
        };

        if baseline.is_none() {
            info!(requested = ?version, "Baseline not found");
        }

        let report = self.monitor.detect(baseline.as_deref(), data);

        if let Err(e) = self.publisher.publish(&report.metrics()) {
            warn!(error = %e, baseline_version = %report.baseline_version, "Failed to publish drift metrics");
        }

        Ok(report)
    }
}
