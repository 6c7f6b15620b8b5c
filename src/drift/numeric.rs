//! Population Stability Index for numeric features

use super::{DriftScore, DriftScorer, ScoreMethod};
use crate::baseline::FeatureStatistics;
use crate::data::{Column, NumericSummary};
use crate::error::{KolosalError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Normal-distribution mass of the five bins cut at mean ± σ and mean ± 2σ
pub const PSI_EXPECTED_PROPORTIONS: [f64; 5] = [0.025, 0.135, 0.68, 0.135, 0.025];

/// Treatment of bins in which no current value falls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBinPolicy {
    /// Empty bins contribute nothing. Under-counts drift when a bin that should
    /// hold mass is empty.
    Skip,
    /// Floor actual proportions at `epsilon` so empty bins are penalized
    Smooth { epsilon: f64 },
}

impl Default for EmptyBinPolicy {
    fn default() -> Self {
        EmptyBinPolicy::Skip
    }
}

/// PSI scorer settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PsiConfig {
    #[serde(default)]
    pub empty_bin_policy: EmptyBinPolicy,
}

impl PsiConfig {
    pub fn validate(&self) -> Result<()> {
        if let EmptyBinPolicy::Smooth { epsilon } = self.empty_bin_policy {
            if !(epsilon.is_finite() && epsilon > 0.0 && epsilon < 1.0) {
                return Err(KolosalError::invalid_parameter(
                    "psi.empty_bin_policy.epsilon",
                    epsilon,
                    "must be in (0, 1)",
                ));
            }
        }
        Ok(())
    }
}

/// Population Stability Index against a normal baseline
#[derive(Debug, Clone, Default)]
pub struct PsiScorer {
    empty_bin_policy: EmptyBinPolicy,
}

impl PsiScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PsiConfig) -> Self {
        Self {
            empty_bin_policy: config.empty_bin_policy,
        }
    }

    pub fn with_empty_bin_policy(mut self, policy: EmptyBinPolicy) -> Self {
        self.empty_bin_policy = policy;
        self
    }

    /// Cut points of the five bins
    pub fn bin_edges(mean: f64, std: f64) -> [f64; 4] {
        [mean - 2.0 * std, mean - std, mean + std, mean + 2.0 * std]
    }

    /// Share of values per right-closed bin, outer bins unbounded
    pub fn bin_proportions(values: &[f64], edges: &[f64; 4]) -> Option<[f64; 5]> {
        if values.is_empty() {
            return None;
        }

        let mut counts = [0usize; 5];
        for &value in values {
            let bin = edges.iter().position(|&edge| value <= edge).unwrap_or(4);
            counts[bin] += 1;
        }

        let n = values.len() as f64;
        Some(counts.map(|c| c as f64 / n))
    }

    /// PSI of actual bin proportions against [`PSI_EXPECTED_PROPORTIONS`]
    pub fn psi(&self, actual: &[f64; 5]) -> f64 {
        let psi: f64 = actual
            .iter()
            .zip(PSI_EXPECTED_PROPORTIONS.iter())
            .map(|(&a, &e)| {
                let a = match self.empty_bin_policy {
                    EmptyBinPolicy::Skip => a,
                    EmptyBinPolicy::Smooth { epsilon } => a.max(epsilon),
                };
                if a > 0.0 && e > 0.0 {
                    (a - e) * (a / e).ln()
                } else {
                    0.0
                }
            })
            .sum();

        psi.abs()
    }
}

impl DriftScorer for PsiScorer {
    fn score(&self, baseline: &FeatureStatistics, current: &Column) -> DriftScore {
        let (mean, std) = match (baseline.mean, baseline.positive_std()) {
            (Some(mean), Some(std)) => (mean, std),
            _ => return DriftScore::ok(0.0, ScoreMethod::None),
        };

        let coercion = current.coerce_numeric();
        if coercion.is_complete() {
            let edges = Self::bin_edges(mean, std);
            match Self::bin_proportions(&coercion.values, &edges) {
                Some(actual) => return DriftScore::ok(self.psi(&actual), ScoreMethod::Psi),
                None => {
                    return DriftScore::failed(ScoreMethod::Psi, "no non-null values to bin")
                }
            }
        }

        let reason = format!(
            "{} of {} values are not numeric",
            coercion.failed,
            current.non_null_count()
        );

        match NumericSummary::from_values(&coercion.values) {
            Some(summary) => {
                let shift = (summary.mean - mean).abs() / std;
                warn!(
                    feature = %baseline.feature_name,
                    reason = %reason,
                    score = shift,
                    "PSI unavailable, using mean-shift fallback"
                );
                DriftScore::degraded(shift, ScoreMethod::MeanShift, reason)
            }
            None => {
                warn!(feature = %baseline.feature_name, reason = %reason, "Numeric drift score failed");
                DriftScore::failed(ScoreMethod::MeanShift, reason)
            }
        }
    }

    fn name(&self) -> &'static str {
        "psi"
    }
}
