//! Regression models
//!
//! Tree ensembles and the feature scaler used by the ensemble predictor.

pub mod boosting;
pub mod forest;
pub mod scaler;
pub mod tree;

pub use boosting::GradientBoostedTrees;
pub use forest::RandomForest;
pub use scaler::StandardScaler;
pub use tree::{RegressionTree, TreeParams};

use serde::{Deserialize, Serialize};

/// A fitted model mapping a feature row to a real value
pub trait Regressor {
    fn predict(&self, row: &[f64]) -> f64;

    /// Per-feature importances, summing to 1 (all zero if the model never split)
    fn feature_importances(&self) -> &[f64];
}

/// Scale importances to sum to 1
pub(crate) fn normalize_importances(mut values: Vec<f64>) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    if total > 0.0 && total.is_finite() {
        for v in &mut values {
            *v /= total;
        }
    }
    values
}

/// A feature and its importance within one regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pair importances with feature names, most important first
pub fn rank_importances(names: &[&str], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| FeatureImportance {
            feature: name.to_string(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_importances() {
        assert_eq!(normalize_importances(vec![1.0, 3.0]), vec![0.25, 0.75]);
        assert_eq!(normalize_importances(vec![0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_rank_importances() {
        let ranked = rank_importances(&["month", "home_win_rate", "weekday"], &[0.2, 0.7, 0.1]);
        let order: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["home_win_rate", "month", "weekday"]);
    }
}
