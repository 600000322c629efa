//! Gradient boosted regression trees (squared error)

use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{normalize_importances, Regressor};
use crate::{BoostingConfig, FootballError, Result};

/// Additive ensemble: `init + learning_rate * sum(tree_k(x))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl GradientBoostedTrees {
    /// Fit on all rows, each stage on the residuals of the previous ones
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], config: &BoostingConfig) -> Result<Self> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(FootballError::Ingest(format!(
                "cannot fit booster on {} rows / {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let n = rows.len();
        let width = rows[0].len();
        let init = targets.iter().sum::<f64>() / n as f64;
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let samples: Vec<usize> = (0..n).collect();

        let mut current = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut gains = vec![0.0; width];

        for _ in 0..config.n_estimators {
            for ((r, y), f) in residuals.iter_mut().zip(targets).zip(&current) {
                *r = y - f;
            }

            let fitted = RegressionTree::fit(rows, &residuals, &samples, params);
            for (total, g) in gains.iter_mut().zip(&fitted.gains) {
                *total += g;
            }
            for (f, row) in current.iter_mut().zip(rows) {
                *f += config.learning_rate * fitted.tree.predict(row);
            }
            trees.push(fitted.tree);
        }

        Ok(GradientBoostedTrees {
            init,
            learning_rate: config.learning_rate,
            trees,
            importances: normalize_importances(gains),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoostedTrees {
    fn predict(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}
