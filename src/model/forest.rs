//! Bootstrap-aggregated regression trees

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{RegressionTree, TreeParams};
use super::{normalize_importances, Regressor};
use crate::{FootballError, ForestConfig, Result};

/// Mean of independently grown trees, each on its own bootstrap sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl RandomForest {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], config: &ForestConfig, seed: u64) -> Result<Self> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(FootballError::Ingest(format!(
                "cannot fit forest on {} rows / {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let n = rows.len();
        let width = rows[0].len();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };
        let mut rng = StdRng::seed_from_u64(seed);

        let n_trees = config.n_estimators.max(1);
        let mut trees = Vec::with_capacity(n_trees);
        let mut importances = vec![0.0; width];

        for _ in 0..n_trees {
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let fitted = RegressionTree::fit(rows, targets, &sample, params);

            // Each tree contributes equally regardless of its total gain
            for (total, g) in importances
                .iter_mut()
                .zip(normalize_importances(fitted.gains))
            {
                *total += g;
            }
            trees.push(fitted.tree);
        }

        Ok(RandomForest {
            trees,
            importances: normalize_importances(importances),
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    fn feature_importances(&self) -> &[f64] {
        &self.importances
    }
}
