//! Chi-square drift score for categorical features

use super::{DriftScore, DriftScorer, ScoreMethod};
use crate::baseline::FeatureStatistics;
use crate::data::Column;

/// Divisor mapping the chi-square statistic onto [0, 1]
const DEFAULT_NORMALIZER: f64 = 100.0;

/// Chi-square statistic against a uniform baseline over `unique_count` categories
///
/// The baseline keeps only the number of distinct categories, not their
/// frequencies, so every observed category is expected to hold an equal share.
#[derive(Debug, Clone)]
pub struct ChiSquareScorer {
    normalizer: f64,
}

impl Default for ChiSquareScorer {
    fn default() -> Self {
        Self {
            normalizer: DEFAULT_NORMALIZER,
        }
    }
}

impl ChiSquareScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chi-square statistic of observed counts, `None` without categories or observations
    pub fn statistic(observed: &[usize], unique_count: usize) -> Option<f64> {
        let total: usize = observed.iter().sum();
        if unique_count == 0 || total == 0 {
            return None;
        }

        let expected = total as f64 / unique_count as f64;
        Some(
            observed
                .iter()
                .map(|&o| (o as f64 - expected).powi(2) / expected)
                .sum(),
        )
    }
}

impl DriftScorer for ChiSquareScorer {
    fn score(&self, baseline: &FeatureStatistics, current: &Column) -> DriftScore {
        if baseline.unique_count == 0 {
            return DriftScore::failed(ScoreMethod::ChiSquare, "baseline has no categories");
        }

        let observed: Vec<usize> = current.value_counts().into_values().collect();
        match Self::statistic(&observed, baseline.unique_count) {
            Some(chi2) => {
                DriftScore::ok((chi2 / self.normalizer).clamp(0.0, 1.0), ScoreMethod::ChiSquare)
            }
            None => DriftScore::failed(ScoreMethod::ChiSquare, "no non-null values"),
        }
    }

    fn name(&self) -> &'static str {
        "chi_square"
    }
}
