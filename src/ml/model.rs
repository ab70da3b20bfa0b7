// ============================================================
// Layer 5 — Salary Model
// ============================================================
// A fitted estimator bundled with the ordered feature names it
// was trained on. The names are the model's input contract:
// `predict_frame` refuses any frame whose columns differ from
// them, in name or in order.
//
//   SalaryModel
//   ├── feature_names : Vec<String>   (frozen schema at fit time)
//   └── estimator     : Estimator
//                        ├── GradientBoosting (default)
//                        └── Ridge
//
// The whole bundle is serde-serialisable and is what the model
// registry persists.
//
// Why an enum rather than Box<dyn Regressor>?
//   The set of estimators is closed, and an enum derives serde
//   with a `kind` tag for free. A trait object would need a
//   hand-written registry of deserialisers.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::data::frame::{column_names, to_matrix};
use crate::ml::gbm::GradientBoostingRegressor;
use crate::ml::ridge::RidgeRegressor;

/// Anything that can be fit on a dense feature matrix and then
/// predict one value per row.
pub trait Regressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, target: ArrayView1<'_, f64>) -> Result<()>;
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>>;
}

/// Which estimator family to train. Parsed from the `--model` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    #[default]
    GradientBoosting,
    Ridge,
}

impl EstimatorKind {
    /// Stable identifier used in logs and in the evaluation log.
    pub fn name(self) -> &'static str {
        match self {
            EstimatorKind::GradientBoosting => "gradient_boosting",
            EstimatorKind::Ridge            => "ridge",
        }
    }

    /// A fresh, unfitted estimator with default hyper-parameters.
    pub fn build(self) -> Estimator {
        match self {
            EstimatorKind::GradientBoosting => Estimator::GradientBoosting(GradientBoostingRegressor::default()),
            EstimatorKind::Ridge            => Estimator::Ridge(RidgeRegressor::default()),
        }
    }
}

impl FromStr for EstimatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gradient_boosting" | "gradient-boosting" | "gbm" => Ok(EstimatorKind::GradientBoosting),
            "ridge"                                           => Ok(EstimatorKind::Ridge),
            other => Err(format!("unknown estimator '{other}' (expected gradient_boosting or ridge)")),
        }
    }
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete estimator, fitted or not, tagged by kind when serialised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    GradientBoosting(GradientBoostingRegressor),
    Ridge(RidgeRegressor),
}

impl Estimator {
    pub fn kind(&self) -> EstimatorKind {
        match self {
            Estimator::GradientBoosting(_) => EstimatorKind::GradientBoosting,
            Estimator::Ridge(_)            => EstimatorKind::Ridge,
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, features: ArrayView2<'_, f64>, target: ArrayView1<'_, f64>) -> Result<()> {
        match self {
            Estimator::GradientBoosting(m) => m.fit(features, target),
            Estimator::Ridge(m)            => m.fit(features, target),
        }
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::GradientBoosting(m) => m.predict(features),
            Estimator::Ridge(m)            => m.predict(features),
        }
    }
}

/// The persisted model: an estimator plus its ordered input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryModel {
    pub feature_names: Vec<String>,
    pub estimator:     Estimator,
}

impl SalaryModel {
    pub fn new(feature_names: Vec<String>, estimator: Estimator) -> Self {
        Self { feature_names, estimator }
    }

    /// Predict one salary per row of an aligned feature frame.
    pub fn predict_frame(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let columns = column_names(features);
        if columns != self.feature_names {
            bail!(
                "feature columns do not match the model: expected {:?}, got {:?}",
                self.feature_names,
                columns
            );
        }
        let matrix = to_matrix(features).context("Feature frame is not numeric and complete")?;
        self.estimator.predict(matrix.view())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use polars::df;

    fn fitted_ridge() -> SalaryModel {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 4) as f64 });
        let y = x.column(0).mapv(|v| 100.0 + 10.0 * v);
        let mut estimator = EstimatorKind::Ridge.build();
        estimator.fit(x.view(), y.view()).unwrap();
        SalaryModel::new(vec!["a".into(), "b".into()], estimator)
    }

    #[test]
    fn test_estimator_kind_parsing() {
        assert_eq!("ridge".parse::<EstimatorKind>().unwrap(), EstimatorKind::Ridge);
        assert_eq!("gbm".parse::<EstimatorKind>().unwrap(), EstimatorKind::GradientBoosting);
        assert!("forest".parse::<EstimatorKind>().is_err());
        assert_eq!(EstimatorKind::default().to_string(), "gradient_boosting");
    }

    #[test]
    fn test_predict_frame_checks_columns() {
        let model = fitted_ridge();

        let good = df!["a" => &[3.0], "b" => &[1.0]].unwrap();
        assert_eq!(model.predict_frame(&good).unwrap().len(), 1);

        let swapped = df!["b" => &[1.0], "a" => &[3.0]].unwrap();
        assert!(model.predict_frame(&swapped).is_err());

        let incomplete = df!["a" => &[Some(3.0)], "b" => &[None::<f64>]].unwrap();
        assert!(model.predict_frame(&incomplete).is_err());
    }

    #[test]
    fn test_serde_roundtrip_keeps_predictions() {
        let model = fitted_ridge();
        let json  = serde_json::to_string(&model).unwrap();
        assert!(json.contains("\"kind\":\"ridge\""));

        let back: SalaryModel = serde_json::from_str(&json).unwrap();
        let x = array![[4.0, 2.0], [11.0, 3.0]];
        assert_eq!(model.estimator.predict(x.view()).unwrap(), back.estimator.predict(x.view()).unwrap());
    }
}
