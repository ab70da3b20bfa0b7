// ============================================================
// Layer 5 — Ridge Regression
// ============================================================
// Standardise every feature, then minimise
//
//   ‖y − Zw − b‖² + α‖w‖²
//
// with linfa's elastic net at an L1 ratio of zero. linfa scales
// the squared error by 1/(2n), so the penalty handed to it is
// α / n. Features with zero variance keep a scale of 1.
//
// With no L1 term the duality gap rarely falls under the
// tolerance, so a fit usually runs the full iteration budget.
//
// Only the fitted coefficients are kept; the model serialises as
// plain arrays and predicts without linfa.
//
// Why keep a linear model next to boosting?
//   It trains in a fraction of the time and gives a floor that
//   the boosted trees have to beat in the evaluation log.

use anyhow::{ensure, Context, Result};
use linfa::prelude::*;
use linfa_elasticnet::ElasticNet;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::ml::model::Regressor;

/// Linear baseline fitted on standardised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegressor {
    alpha:     f64,
    mean:      Array1<f64>,
    scale:     Array1<f64>,
    coef:      Array1<f64>,
    intercept: f64,
}

impl RidgeRegressor {
    /// An unfitted model with L2 penalty `alpha`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            mean:      Array1::zeros(0),
            scale:     Array1::zeros(0),
            coef:      Array1::zeros(0),
            intercept: 0.0,
        }
    }

    fn standardise(&self, features: ArrayView2<'_, f64>) -> Array2<f64> {
        (&features - &self.mean) / &self.scale
    }
}

impl Default for RidgeRegressor {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, target: ArrayView1<'_, f64>) -> Result<()> {
        let n = features.nrows();
        ensure!(n > 0, "cannot fit on an empty feature matrix");
        ensure!(
            target.len() == n,
            "feature matrix has {} rows but target has {}",
            n,
            target.len()
        );

        self.mean  = features.mean_axis(Axis(0)).context("empty feature matrix")?;
        self.scale = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        let z       = self.standardise(features);
        let width   = z.ncols();
        let dataset = Dataset::new(z, target.to_owned());
        let fitted  = ElasticNet::params()
            .penalty(self.alpha / n as f64)
            .l1_ratio(0.0)
            .with_intercept(true)
            .max_iterations(1_000)
            .tolerance(1e-6)
            .fit(&dataset)
            .context("ridge coordinate descent failed")?;

        self.coef      = fitted.hyperplane().to_owned();
        self.intercept = fitted.intercept();
        tracing::info!(
            "Fitted ridge regression (alpha {}) on {} rows x {} features",
            self.alpha,
            n,
            width
        );
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        ensure!(
            features.ncols() == self.coef.len(),
            "model expects {} features, got {}",
            self.coef.len(),
            features.ncols()
        );
        Ok(self.standardise(features).dot(&self.coef) + self.intercept)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_alpha_recovers_linear_fit() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 7) as f64 });
        let y = x.column(0).mapv(|v| 3.0 * v) + x.column(1).mapv(|v| -2.0 * v) + 10.0;

        let mut model = RidgeRegressor::new(1e-9);
        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(x.view()).unwrap();
        let max_err = (&pred - &y).mapv(f64::abs).fold(0.0_f64, |m, &e| m.max(e));
        assert!(max_err < 1e-2, "max error {max_err}");
    }

    #[test]
    fn test_constant_feature_is_harmless() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| if j == 0 { i as f64 } else { 1.0 });
        let y = x.column(0).to_owned();
        let mut model = RidgeRegressor::default();
        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(x.view()).unwrap();
        assert!(pred.iter().all(|p| p.is_finite()));
        assert!(pred[9] > pred[0]);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 5.0 * v);

        let mut loose = RidgeRegressor::new(1e-6);
        let mut tight = RidgeRegressor::new(1000.0);
        loose.fit(x.view(), y.view()).unwrap();
        tight.fit(x.view(), y.view()).unwrap();

        assert!(tight.coef[0].abs() < loose.coef[0].abs());
        // the intercept is the target mean either way
        assert!((tight.intercept - y.mean().unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let x = Array2::from_shape_fn((6, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_shape_fn(6, |i| i as f64);
        let mut model = RidgeRegressor::default();
        model.fit(x.view(), y.view()).unwrap();
        assert!(model.predict(Array2::<f64>::zeros((1, 3)).view()).is_err());
    }
}
