//! Drift monitoring configuration

use crate::anomaly::AnomalyThresholds;
use crate::drift::{EmptyBinPolicy, PsiConfig};
use crate::error::{KolosalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`MonitorConfig::drift_threshold`]
pub const ENV_DRIFT_THRESHOLD: &str = "KOLOSAL_DRIFT_THRESHOLD";
/// Environment variable overriding [`MonitorConfig::parallel`]
pub const ENV_DRIFT_PARALLEL: &str = "KOLOSAL_DRIFT_PARALLEL";

/// Configuration for drift detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// A feature drifts when its score exceeds this value
    pub drift_threshold: f64,

    /// PSI settings for numeric features
    pub psi: PsiConfig,

    /// Trigger points of the anomaly rules
    pub anomaly: AnomalyThresholds,

    /// Score features in parallel
    pub parallel: bool,

    /// Size of a dedicated thread pool; the global rayon pool when unset
    pub n_jobs: Option<usize>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            drift_threshold: 0.1,
            psi: PsiConfig::default(),
            anomaly: AnomalyThresholds::default(),
            parallel: true,
            n_jobs: None,
        }
    }
}

impl MonitorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the drift threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = threshold;
        self
    }

    /// Builder method to set anomaly thresholds
    pub fn with_anomaly_thresholds(mut self, thresholds: AnomalyThresholds) -> Self {
        self.anomaly = thresholds;
        self
    }

    /// Builder method to set PSI empty-bin handling
    pub fn with_empty_bin_policy(mut self, policy: EmptyBinPolicy) -> Self {
        self.psi.empty_bin_policy = policy;
        self
    }

    /// Builder method to enable or disable parallel scoring
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Builder method to set number of threads
    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = Some(n_jobs);
        self
    }

    /// Reject out-of-range values before any computation runs
    pub fn validate(&self) -> Result<()> {
        if !(self.drift_threshold.is_finite() && self.drift_threshold >= 0.0) {
            return Err(KolosalError::invalid_parameter(
                "drift_threshold",
                self.drift_threshold,
                "must be a finite, non-negative number",
            ));
        }
        if self.n_jobs == Some(0) {
            return Err(KolosalError::invalid_parameter("n_jobs", 0, "must be at least 1"));
        }
        self.psi.validate()?;
        self.anomaly.validate()?;
        Ok(())
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            KolosalError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `KOLOSAL_DRIFT_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_DRIFT_THRESHOLD) {
            self.drift_threshold = raw.trim().parse().map_err(|_| {
                KolosalError::ConfigError(format!("{} is not a number: {}", ENV_DRIFT_THRESHOLD, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_DRIFT_PARALLEL) {
            self.parallel = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(KolosalError::ConfigError(format!(
                        "{} is not a boolean: {}",
                        ENV_DRIFT_PARALLEL, raw
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }
}
