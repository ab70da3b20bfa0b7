// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores an estimator on the job-market data without persisting
// anything but the score itself:
//
//   Step 1: Prepare the dataset            (same as training)
//   Step 2: k-fold CV RMSE on every row    (optional)
//   Step 3: Fit on the train split         (same as training)
//   Step 4: Hold-out metrics on the test split
//   Step 5: Append a row to evaluations.csv (optional)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::{TrainConfig, TrainUseCase};
use crate::data::loader::CsvLoader;
use crate::domain::traits::DatasetSource;
use crate::infra::metrics::{EvaluationLogger, EvaluationReport};
use crate::ml::model::EstimatorKind;
use crate::ml::trainer::cross_validated_rmse;

/// A training config plus the evaluation-only knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateConfig {
    pub train:    TrainConfig,
    /// Number of CV folds; 0 skips cross-validation.
    pub cv_folds: usize,
    pub cv_seed:  u64,
    /// Append the result to `<model_dir>/evaluations.csv`.
    pub log:      bool,
}

impl Default for EvaluateConfig {
    fn default() -> Self {
        Self {
            train:    TrainConfig::default(),
            cv_folds: 5,
            cv_seed:  42,
            log:      true,
        }
    }
}

/// Hold-out metrics and, when requested, per-fold CV scores.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub estimator: EstimatorKind,
    pub report:    EvaluationReport,
    /// Per-fold RMSE, empty when CV was skipped.
    pub cv_rmse:   Vec<f64>,
}

impl EvaluationSummary {
    /// Mean of the CV fold scores, if cross-validation ran.
    pub fn cv_mean(&self) -> Option<f64> {
        if self.cv_rmse.is_empty() {
            return None;
        }
        Some(self.cv_rmse.iter().sum::<f64>() / self.cv_rmse.len() as f64)
    }
}

/// Trains on the train split and scores the hold-out split.
pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    /// Evaluate on the CSV at the configured path and log the result.
    pub fn execute(&self) -> Result<EvaluationSummary> {
        let train  = &self.config.train;
        let loader = CsvLoader::new(&train.data_path, train.dataset);
        let summary = self.execute_with(&loader)?;

        if self.config.log {
            let logger = EvaluationLogger::new(&train.model_dir)?;
            logger.log(&train.model_name, train.estimator.name(), &summary.report, summary.cv_mean())?;
            tracing::info!("Evaluation appended to '{}'", logger.csv_path().display());
        }
        Ok(summary)
    }

    /// Evaluate on any dataset source. Nothing is written to disk.
    pub fn execute_with<S: DatasetSource>(&self, source: &S) -> Result<EvaluationSummary> {
        let cfg = &self.config;
        ensure!(cfg.train.use_split, "Evaluation needs a held-out test split");

        let trainer = TrainUseCase::new(cfg.train.clone());

        // ── Step 1: Prepare ───────────────────────────────────────────────────
        let prepared = trainer.prepare(source)?;

        // ── Step 2: Cross-validation ──────────────────────────────────────────
        let cv_rmse = if cfg.cv_folds > 0 {
            let scores = cross_validated_rmse(
                cfg.train.estimator,
                &prepared.features,
                &prepared.target,
                cfg.cv_folds,
                cfg.cv_seed,
            )?;
            tracing::info!("CV RMSE folds: {:?}", scores);
            scores
        } else {
            Vec::new()
        };

        // ── Step 3: Fit on the train split ────────────────────────────────────
        let outcome = trainer.fit_prepared(prepared)?;

        // ── Step 4: Hold-out metrics ──────────────────────────────────────────
        let test_features = outcome.test_features.as_ref().context("No test split was produced")?;
        let test_target   = outcome.test_target.as_ref().context("No test split was produced")?;
        ensure!(!test_target.is_empty(), "The test split is empty");

        let predicted = outcome.model.predict_frame(test_features)?;
        let report    = EvaluationReport::compute(test_target, &predicted.to_vec());
        tracing::info!(
            "Hold-out ({} rows): RMSE {:.2}, MAE {:.2}, R2 {:.4}",
            report.rows,
            report.rmse,
            report.mae,
            report.r2
        );

        Ok(EvaluationSummary { estimator: cfg.train.estimator, report, cv_rmse })
    }
}
