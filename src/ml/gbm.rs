// ============================================================
// Layer 5 — Gradient-Boosted Trees
// ============================================================
// Squared-error gradient boosting:
//
//   F₀(x)   = mean(y)
//   r_m     = y − F_{m−1}(x)                 (negative gradient)
//   h_m     = RegressionTree fitted to r_m   (leaf-wise, ≤ 31 leaves)
//   F_m(x)  = F_{m−1}(x) + η · h_m(x)
//
// Defaults: 600 rounds, η = 0.05, 31 leaves, unlimited depth,
// 20 samples per leaf, no minimum split gain, 255 bins.
//
// The feature matrix is binned once before the first round;
// every tree reuses the same bins, only the residuals change.
//
// Why boosting by default?
//   Salaries depend on interactions (title × experience, company
//   × job type) that a single linear model cannot express, while
//   shallow trees pick them up from a few hundred rows.

use anyhow::{ensure, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::ml::model::Regressor;
use crate::ml::tree::{BinnedMatrix, RegressionTree, TreeParams};

/// Boosting hyper-parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators:  usize,
    pub learning_rate: f64,
    /// Histogram bins per feature, capped at 256.
    pub max_bins:      usize,
    pub tree:          TreeParams,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators:  600,
            learning_rate: 0.05,
            max_bins:      255,
            tree:          TreeParams::default(),
        }
    }
}

/// The default estimator: a sum of shrunken regression trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params:     GradientBoostingParams,
    base_score: f64,
    n_features: usize,
    trees:      Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    pub fn new(params: GradientBoostingParams) -> Self {
        Self { params, base_score: 0.0, n_features: 0, trees: Vec::new() }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let boost: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        self.base_score + self.params.learning_rate * boost
    }
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingParams::default())
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, target: ArrayView1<'_, f64>) -> Result<()> {
        let n = features.nrows();
        ensure!(n > 0, "cannot fit on an empty feature matrix");
        ensure!(
            target.len() == n,
            "feature matrix has {} rows but target has {}",
            n,
            target.len()
        );

        self.n_features = features.ncols();
        self.base_score = target.sum() / n as f64;
        self.trees.clear();

        let binned = BinnedMatrix::new(features, self.params.max_bins);
        let mut prediction = Array1::from_elem(n, self.base_score);
        let rows: Vec<usize> = (0..n).collect();

        for round in 0..self.params.n_estimators {
            let residual = &target - &prediction;
            let tree = RegressionTree::fit(&binned, residual.view(), rows.clone(), &self.params.tree);

            for (i, row) in features.axis_iter(Axis(0)).enumerate() {
                prediction[i] += self.params.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);

            if (round + 1) % 100 == 0 {
                let mse = residual.mapv(|r| r * r).mean().unwrap_or(0.0);
                tracing::debug!("Boosting round {}: train MSE before round {:.4}", round + 1, mse);
            }
        }

        tracing::info!(
            "Fitted gradient boosting: {} trees on {} rows x {} features",
            self.n_trees(),
            n,
            self.n_features
        );
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        ensure!(
            features.ncols() == self.n_features,
            "model expects {} features, got {}",
            self.n_features,
            features.ncols()
        );
        Ok(features.axis_iter(Axis(0)).map(|row| self.predict_row(row)).collect())
    }
}
