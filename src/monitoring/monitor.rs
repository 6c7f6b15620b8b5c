//! Drift report assembly
//!
//! [`DriftMonitor`] compares a dataset with a baseline feature by feature and
//! folds the results into one [`DriftReport`]. It holds no state between runs.

use super::report::{DriftReport, StatisticsComparison};
use crate::anomaly::{Anomaly, AnomalyRuleSet};
use crate::baseline::{BaselineStatistics, FeatureStatistics};
use crate::config::MonitorConfig;
use crate::data::{Column, Dataset, FeatureKind};
use crate::drift::{DriftScore, Scorers};
use crate::error::{KolosalError, Result};
use chrono::Utc;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of evaluating one feature
#[derive(Debug, Clone)]
struct FeatureOutcome {
    name: String,
    score: DriftScore,
    comparison: Option<StatisticsComparison>,
    anomalies: Vec<Anomaly>,
}

/// Feature drift monitor for production ML systems
#[derive(Debug, Clone)]
pub struct DriftMonitor {
    config: MonitorConfig,
    scorers: Scorers,
    rules: AnomalyRuleSet,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl DriftMonitor {
    /// Create a monitor, rejecting invalid configuration
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate()?;

        let pool = match config.n_jobs {
            Some(n) if config.parallel => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| KolosalError::ThreadPoolError(e.to_string()))?,
            )),
            _ => None,
        };

        Ok(Self {
            scorers: Scorers::from_config(&config.psi),
            rules: AnomalyRuleSet::from_thresholds(&config.anomaly),
            config,
            pool,
        })
    }

    /// Replace the drift scorers
    pub fn with_scorers(mut self, scorers: Scorers) -> Self {
        self.scorers = scorers;
        self
    }

    /// Replace the anomaly rules
    pub fn with_rules(mut self, rules: AnomalyRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Compare a dataset with a baseline. A missing or empty baseline yields a
    /// neutral report with baseline version `"none"`.
    pub fn detect(&self, baseline: Option<&BaselineStatistics>, current: &Dataset) -> DriftReport {
        let baseline = match baseline.filter(|b| !b.is_empty()) {
            Some(b) => b,
            None => return self.neutral(),
        };

        let outcomes = self.evaluate_features(baseline, current, None);
        self.assemble(baseline, current, outcomes.into_iter().flatten().collect())
    }

    /// Like [`DriftMonitor::detect`], checking `cancel` before each feature.
    /// A cancelled run returns [`KolosalError::Cancelled`], never a partial report.
    pub fn detect_cancellable(
        &self,
        baseline: Option<&BaselineStatistics>,
        current: &Dataset,
        cancel: &AtomicBool,
    ) -> Result<DriftReport> {
        let baseline = match baseline.filter(|b| !b.is_empty()) {
            Some(b) => b,
            None => return Ok(self.neutral()),
        };

        let outcomes = self.evaluate_features(baseline, current, Some(cancel));
        let total = outcomes.len();
        let completed: Vec<FeatureOutcome> = outcomes.into_iter().flatten().collect();
        if completed.len() < total || cancel.load(Ordering::Relaxed) {
            return Err(KolosalError::Cancelled {
                completed: completed.len(),
                total,
            });
        }

        Ok(self.assemble(baseline, current, completed))
    }

    fn neutral(&self) -> DriftReport {
        info!("No baseline available, drift not measured");
        DriftReport::neutral(Utc::now())
    }

    /// Evaluate every feature present on both sides, in feature-name order.
    /// `None` marks a feature skipped because of cancellation.
    fn evaluate_features(
        &self,
        baseline: &BaselineStatistics,
        current: &Dataset,
        cancel: Option<&AtomicBool>,
    ) -> Vec<Option<FeatureOutcome>> {
        let pairs: Vec<(&str, &FeatureStatistics, &Column)> = baseline
            .feature_statistics
            .iter()
            .filter_map(|(name, stats)| {
                current
                    .column(name)
                    .map(|column| (name.as_str(), stats, column))
            })
            .collect();

        let run = |&(name, stats, column): &(&str, &FeatureStatistics, &Column)| {
            if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                return None;
            }
            Some(self.evaluate_feature(name, stats, column))
        };

        if !self.config.parallel {
            return pairs.iter().map(run).collect();
        }
        match &self.pool {
            Some(pool) => pool.install(|| pairs.par_iter().map(run).collect()),
            None => pairs.par_iter().map(run).collect(),
        }
    }

    fn evaluate_feature(&self, name: &str, stats: &FeatureStatistics, column: &Column) -> FeatureOutcome {
        let score = self.scorers.score(stats, column);

        let comparison = if score.is_failed() {
            None
        } else {
            let current = match stats.data_type {
                FeatureKind::Numeric => column.coerced_summary(),
                FeatureKind::Categorical => column.summary(),
            };
            Some(StatisticsComparison {
                feature_name: name.to_string(),
                baseline_mean: stats.mean,
                current_mean: current.map(|s| s.mean),
                baseline_std: stats.std,
                current_std: current.and_then(|s| s.std),
                drift_score: score.value,
                score_method: score.method,
                score_status: score.status.clone(),
            })
        };

        let anomalies = self.rules.evaluate(stats, column);

        debug!(
            feature = %name,
            kind = %stats.data_type,
            score = score.value,
            method = ?score.method,
            anomalies = anomalies.len(),
            "Evaluated feature"
        );

        FeatureOutcome {
            name: name.to_string(),
            score,
            comparison,
            anomalies,
        }
    }

    fn assemble(
        &self,
        baseline: &BaselineStatistics,
        current: &Dataset,
        outcomes: Vec<FeatureOutcome>,
    ) -> DriftReport {
        let mut report = DriftReport::neutral(Utc::now());
        report.baseline_version = baseline.dataset_version.clone();

        let mut scores = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            report.anomalies.extend(outcome.anomalies);

            match outcome.comparison {
                Some(comparison) => {
                    scores.push(outcome.score.value);
                    if outcome.score.value > self.config.drift_threshold {
                        report.features_with_drift.push(outcome.name.clone());
                    }
                    report.statistics_comparison.insert(outcome.name, comparison);
                }
                None => report.failed_features.push(outcome.name),
            }
        }

        report.drift_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        let baseline_only = baseline
            .feature_statistics
            .keys()
            .map(String::as_str)
            .filter(|name| !current.has_column(name));
        let current_only = current
            .column_names()
            .filter(|name| baseline.feature(name).is_none());
        let skipped: BTreeSet<&str> = baseline_only.chain(current_only).collect();
        report.skipped_features = skipped.into_iter().map(str::to_string).collect();

        report.features_with_drift.sort();
        report.failed_features.sort();

        info!(
            baseline_version = %report.baseline_version,
            drift_score = report.drift_score,
            compared = report.statistics_comparison.len(),
            drifted = report.features_with_drift.len(),
            anomalies = report.anomalies.len(),
            skipped = report.skipped_features.len(),
            failed = report.failed_features.len(),
            "Drift detection complete"
        );

        report
    }
}
