//! Per-feature drift scoring
//!
//! Numeric features are scored with a Population Stability Index over bins
//! derived from the baseline mean and standard deviation. Categorical features
//! are scored with a chi-square statistic against a uniform baseline.
//!
//! Every score carries the method that produced it and a [`ScoreStatus`], so a
//! fallback result is never mistaken for a full-confidence one.

mod categorical;
mod numeric;

pub use categorical::ChiSquareScorer;
pub use numeric::{EmptyBinPolicy, PsiConfig, PsiScorer, PSI_EXPECTED_PROPORTIONS};

use crate::baseline::{FeatureKind, FeatureStatistics};
use crate::data::Column;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Algorithm that produced a drift score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    /// Population Stability Index
    Psi,
    /// Normalized mean shift, the numeric fallback
    MeanShift,
    /// Normalized chi-square statistic
    ChiSquare,
    /// No comparison was possible
    None,
}

impl std::fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScoreMethod::Psi => "psi",
            ScoreMethod::MeanShift => "mean_shift",
            ScoreMethod::ChiSquare => "chi_square",
            ScoreMethod::None => "none",
        };
        f.write_str(name)
    }
}

/// Confidence of a drift score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatus {
    Ok,
    /// Computed by a documented fallback algorithm
    Degraded { reason: String },
    /// Could not be computed; the value is 0 and must not be aggregated
    Failed { reason: String },
}

/// Drift score of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftScore {
    /// Non-negative score
    pub value: f64,
    pub method: ScoreMethod,
    pub status: ScoreStatus,
}

impl DriftScore {
    /// A full-confidence score
    pub fn ok(value: f64, method: ScoreMethod) -> Self {
        if !value.is_finite() {
            return Self::failed(method, format!("non-finite score {}", value));
        }
        Self {
            value: value.abs(),
            method,
            status: ScoreStatus::Ok,
        }
    }

    /// A score produced by a fallback
    pub fn degraded(value: f64, method: ScoreMethod, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if !value.is_finite() {
            return Self::failed(method, format!("{}; non-finite fallback score", reason));
        }
        Self {
            value: value.abs(),
            method,
            status: ScoreStatus::Degraded { reason },
        }
    }

    /// No score could be computed
    pub fn failed(method: ScoreMethod, reason: impl Into<String>) -> Self {
        Self {
            value: 0.0,
            method,
            status: ScoreStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, ScoreStatus::Ok)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, ScoreStatus::Degraded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ScoreStatus::Failed { .. })
    }
}

/// Scores the drift of one feature against its baseline
pub trait DriftScorer: Send + Sync {
    /// Compare the current column with the baseline summary
    fn score(&self, baseline: &FeatureStatistics, current: &Column) -> DriftScore;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Numeric and categorical scorers, selected by feature kind
#[derive(Clone)]
pub struct Scorers {
    numeric: Arc<dyn DriftScorer>,
    categorical: Arc<dyn DriftScorer>,
}

impl Scorers {
    pub fn new(numeric: Arc<dyn DriftScorer>, categorical: Arc<dyn DriftScorer>) -> Self {
        Self {
            numeric,
            categorical,
        }
    }

    /// PSI and chi-square scorers
    pub fn from_config(psi: &PsiConfig) -> Self {
        Self::new(
            Arc::new(PsiScorer::from_config(psi)),
            Arc::new(ChiSquareScorer::default()),
        )
    }

    pub fn for_kind(&self, kind: FeatureKind) -> &dyn DriftScorer {
        match kind {
            FeatureKind::Numeric => self.numeric.as_ref(),
            FeatureKind::Categorical => self.categorical.as_ref(),
        }
    }

    /// Score a feature with the scorer matching its baseline type
    pub fn score(&self, baseline: &FeatureStatistics, current: &Column) -> DriftScore {
        self.for_kind(baseline.data_type).score(baseline, current)
    }
}

impl Default for Scorers {
    fn default() -> Self {
        Self::from_config(&PsiConfig::default())
    }
}

impl std::fmt::Debug for Scorers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorers")
            .field("numeric", &self.numeric.name())
            .field("categorical", &self.categorical.name())
            .finish()
    }
}
