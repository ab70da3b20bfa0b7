// ============================================================
// Layer 6 — Metrics
// ============================================================
// Closed-form regression metrics over paired true / predicted
// values, plus a CSV logger that records one row per evaluation.
//
//   RMSE  = √( Σ (y − ŷ)² / n )
//   MAE   = Σ |y − ŷ| / n
//   R²    = 1 − Σ (y − ŷ)² / Σ (y − ȳ)²
//   MAPE  = 100 · Σ |(y − ŷ) / y| / n
//   SMAPE = 100 · Σ 2|y − ŷ| / (|y| + |ŷ|) / n
//   WAPE  = 100 · Σ |y − ŷ| / Σ |y|
//
// Divisions are not guarded: a zero denominator surfaces as
// inf or NaN. Slices are paired up to the shorter length.
//
// Output file: <model_dir>/evaluations.csv
//
// Why go through csv::Writer?
//   The model name comes from the command line. A name holding a
//   comma or a quote must still land in one field, so every row is
//   quoted by the csv crate rather than joined by hand.
//
// Example CSV output:
//   model,estimator,rows,rmse,mae,r2,mape,smape,wape,cv_rmse
//   model,gradient_boosting,412,9120.4,6801.2,0.41,14.2,13.6,12.9,9344.0
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

fn pairs<'a>(y_true: &'a [f64], y_pred: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
    y_true.iter().copied().zip(y_pred.iter().copied())
}

fn paired_len(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true.len().min(y_pred.len()) as f64
}

/// Root mean squared error.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let sse: f64 = pairs(y_true, y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    (sse / paired_len(y_true, y_pred)).sqrt()
}

/// Mean absolute error.
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let sae: f64 = pairs(y_true, y_pred).map(|(t, p)| (t - p).abs()).sum();
    sae / paired_len(y_true, y_pred)
}

/// Coefficient of determination.
pub fn r2(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n    = paired_len(y_true, y_pred);
    let mean = pairs(y_true, y_pred).map(|(t, _)| t).sum::<f64>() / n;
    let ss_res: f64 = pairs(y_true, y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = pairs(y_true, y_pred).map(|(t, _)| (t - mean).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

/// Mean absolute percentage error, in percent.
pub fn mape(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let total: f64 = pairs(y_true, y_pred).map(|(t, p)| ((t - p) / t).abs()).sum();
    100.0 * total / paired_len(y_true, y_pred)
}

/// Symmetric MAPE, in percent (0 to 200).
pub fn smape(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let total: f64 = pairs(y_true, y_pred)
        .map(|(t, p)| 2.0 * (t - p).abs() / (t.abs() + p.abs()))
        .sum();
    100.0 * total / paired_len(y_true, y_pred)
}

/// Weighted absolute percentage error, in percent.
pub fn wape(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let errors: f64 = pairs(y_true, y_pred).map(|(t, p)| (t - p).abs()).sum();
    let scale:  f64 = pairs(y_true, y_pred).map(|(t, _)| t.abs()).sum();
    100.0 * errors / scale
}

/// Every hold-out metric for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows:  usize,
    pub rmse:  f64,
    pub mae:   f64,
    pub r2:    f64,
    pub mape:  f64,
    pub smape: f64,
    pub wape:  f64,
}

impl EvaluationReport {
    /// Every metric over the paired values.
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Self {
        Self {
            rows:  y_true.len().min(y_pred.len()),
            rmse:  rmse(y_true, y_pred),
            mae:   mae(y_true, y_pred),
            r2:    r2(y_true, y_pred),
            mape:  mape(y_true, y_pred),
            smape: smape(y_true, y_pred),
            wape:  wape(y_true, y_pred),
        }
    }
}

/// Appends evaluation results to a CSV file.
pub struct EvaluationLogger {
    csv_path: PathBuf,
}

impl EvaluationLogger {
    const HEADER: [&'static str; 10] = [
        "model", "estimator", "rows", "rmse", "mae", "r2", "mape", "smape", "wape", "cv_rmse",
    ];

    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("evaluations.csv");
        if !csv_path.exists() {
            let mut w = csv::Writer::from_path(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            w.write_record(Self::HEADER)?;
            w.flush()?;
            tracing::debug!("Created evaluation CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row. A missing CV score is written as an empty field.
    pub fn log(
        &self,
        model:     &str,
        estimator: &str,
        report:    &EvaluationReport,
        cv_rmse:   Option<f64>,
    ) -> Result<()> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        let fixed = |v: f64| format!("{v:.6}");
        w.write_record([
            model.to_string(),
            estimator.to_string(),
            report.rows.to_string(),
            fixed(report.rmse),
            fixed(report.mae),
            fixed(report.r2),
            fixed(report.mape),
            fixed(report.smape),
            fixed(report.wape),
            cv_rmse.map(fixed).unwrap_or_default(),
        ])?;
        w.flush()?;

        tracing::debug!("Logged evaluation of '{}' to '{}'", model, self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
