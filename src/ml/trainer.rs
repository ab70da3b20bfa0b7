// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Turns an aligned feature frame plus a target vector into a
// fitted SalaryModel, and scores an estimator kind with shuffled
// k-fold cross-validation.
//
//   fit_model            — one fit on every row given
//   cross_validated_rmse — per-fold RMSE on held-out folds

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use polars::prelude::DataFrame;

use crate::data::frame::{column_names, to_matrix};
use crate::data::splitter::k_fold;
use crate::infra::metrics::rmse;
use crate::ml::model::{EstimatorKind, Regressor, SalaryModel};

/// Fit a fresh estimator of `kind` on `features` / `target`.
///
/// The model remembers the frame's column names as its feature
/// contract.
pub fn fit_model(kind: EstimatorKind, features: &DataFrame, target: &[f64]) -> Result<SalaryModel> {
    let matrix = to_matrix(features).context("Feature frame is not numeric and complete")?;
    let target = ArrayView1::from(target);

    tracing::info!(
        "Fitting {} on {} rows x {} features",
        kind,
        matrix.nrows(),
        matrix.ncols()
    );

    let mut estimator = kind.build();
    estimator.fit(matrix.view(), target)?;

    Ok(SalaryModel::new(column_names(features), estimator))
}

/// RMSE of `kind` on each of `folds` shuffled validation folds.
pub fn cross_validated_rmse(
    kind:     EstimatorKind,
    features: &DataFrame,
    target:   &[f64],
    folds:    usize,
    seed:     u64,
) -> Result<Vec<f64>> {
    ensure!(folds >= 2, "cross-validation needs at least 2 folds, got {}", folds);
    ensure!(
        features.height() >= folds,
        "cannot split {} rows into {} folds",
        features.height(),
        folds
    );

    let matrix = to_matrix(features).context("Feature frame is not numeric and complete")?;
    let target = ArrayView1::from(target);

    let mut scores = Vec::with_capacity(folds);
    for (fold, (train_rows, valid_rows)) in k_fold(matrix.nrows(), folds, seed).into_iter().enumerate() {
        let x_train = rows_of(&matrix, &train_rows);
        let y_train = target.select(Axis(0), &train_rows);
        let x_valid = rows_of(&matrix, &valid_rows);
        let y_valid = target.select(Axis(0), &valid_rows);

        let mut estimator = kind.build();
        estimator.fit(x_train.view(), y_train.view())?;
        let predicted: Array1<f64> = estimator.predict(x_valid.view())?;

        let score = rmse(&y_valid.to_vec(), &predicted.to_vec());
        tracing::info!("Fold {}/{}: RMSE {:.2}", fold + 1, folds, score);
        scores.push(score);
    }
    Ok(scores)
}

fn rows_of(matrix: &Array2<f64>, rows: &[usize]) -> Array2<f64> {
    matrix.select(Axis(0), rows)
}
