// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the raw CSV              (Layer 4 - data)
//   Step 2: Preprocess in train mode      (Layer 4 - data)
//   Step 3: Engineer features             (Layer 4 - data)
//   Step 4: Separate the target           (Layer 4 - data)
//   Step 5: Align to the feature schema   (Layer 4 - data)
//   Step 6: Split train/test              (Layer 4 - data)
//   Step 7: Fit the estimator             (Layer 5 - ml)
//
// Persisting the result is a separate, explicit step:
// `TrainingOutcome::persist` (Layer 6 - infra).
//
// Why is `prepare` public on its own?
//   Evaluation runs cross-validation on the prepared rows before
//   any split, and tests compare prepared rows against what the
//   prediction service builds for the same posting.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{ensure, Context, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::data::{
    encoding::EncodingTable,
    features::build_features,
    frame::{column_names, drop_if_present, numbers, take_rows},
    loader::CsvLoader,
    preprocessor::{preprocess, Mode},
    schema::align_to_model_schema,
    splitter::split_train_test,
};
use crate::domain::dataset::DatasetId;
use crate::domain::traits::DatasetSource;
use crate::infra::registry::ModelRegistry;
use crate::ml::model::{EstimatorKind, SalaryModel};
use crate::ml::trainer::fit_model;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a training run needs. Serialisable so it can be stored
// next to the model it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:    String,
    pub model_dir:    String,
    pub dataset:      DatasetId,
    pub estimator:    EstimatorKind,
    /// Hold out a test set before fitting.
    pub use_split:    bool,
    /// Fraction of rows held out, in (0, 1).
    pub test_size:    f64,
    pub random_state: u64,
    /// Persist the model, the encodings and this config after fitting.
    pub save:         bool,
    pub model_name:   String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:    "data/job_market.csv".to_string(),
            model_dir:    "models".to_string(),
            dataset:      DatasetId::JobMarket,
            estimator:    EstimatorKind::GradientBoosting,
            use_split:    true,
            test_size:    0.2,
            random_state: 42,
            save:         false,
            model_name:   "model".to_string(),
        }
    }
}

// ─── Training Outcome ─────────────────────────────────────────────────────────
/// What one training run produced. `features` / `target` are the rows
/// the model was fitted on; the test half is present only when the
/// run held one out.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub model:         SalaryModel,
    pub features:      DataFrame,
    pub target:        Vec<f64>,
    pub test_features: Option<DataFrame>,
    pub test_target:   Option<Vec<f64>>,
    pub encodings:     EncodingTable,
}

impl TrainingOutcome {
    /// Save the model, the encoding table and the config that produced them.
    pub fn persist(&self, registry: &ModelRegistry, cfg: &TrainConfig) -> Result<()> {
        registry.save_model(&self.model, &cfg.model_name)?;
        registry.save_encodings(&self.encodings, cfg.dataset)?;
        registry.save_config(cfg)?;
        tracing::info!("Artefacts written to '{}'", registry.dir().display());
        Ok(())
    }
}

/// The aligned, target-separated dataset, before any split.
#[derive(Debug)]
pub struct PreparedDataset {
    pub features:  DataFrame,
    pub target:    Vec<f64>,
    pub encodings: EncodingTable,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
/// Runs the training pipeline for one configuration.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    /// A use case bound to `config`. Nothing is read until `execute`.
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// The configuration this run uses.
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Run the pipeline on the CSV at `data_path`, persisting when
    /// `save` is set.
    pub fn execute(&self) -> Result<TrainingOutcome> {
        let loader  = CsvLoader::new(&self.config.data_path, self.config.dataset);
        let outcome = self.execute_with(&loader)?;

        if self.config.save {
            let registry = ModelRegistry::new(&self.config.model_dir)?;
            outcome.persist(&registry, &self.config)?;
        }
        Ok(outcome)
    }

    /// Run the pipeline on any dataset source. Never persists.
    pub fn execute_with<S: DatasetSource>(&self, source: &S) -> Result<TrainingOutcome> {
        let prepared = self.prepare(source)?;
        self.fit_prepared(prepared)
    }

    fn validate(&self) -> Result<()> {
        let cfg = &self.config;
        ensure!(
            !cfg.use_split || (cfg.test_size > 0.0 && cfg.test_size < 1.0),
            "test_size must be in (0, 1), got {}",
            cfg.test_size
        );
        Ok(())
    }

    /// Steps 6 and 7 on an already prepared dataset.
    pub fn fit_prepared(&self, prepared: PreparedDataset) -> Result<TrainingOutcome> {
        let cfg = &self.config;
        self.validate()?;

        // ── Step 6: Split train/test ──────────────────────────────────────────
        let (features, target, test_features, test_target) = if cfg.use_split {
            let rows: Vec<usize> = (0..prepared.features.height()).collect();
            let (train_rows, test_rows) = split_train_test(rows, cfg.test_size, cfg.random_state);
            ensure!(!train_rows.is_empty(), "No training rows left after the split");

            let pick = |rows: &[usize]| rows.iter().map(|&r| prepared.target[r]).collect::<Vec<f64>>();
            (
                take_rows(&prepared.features, &train_rows)?,
                pick(&train_rows),
                Some(take_rows(&prepared.features, &test_rows)?),
                Some(pick(&test_rows)),
            )
        } else {
            (prepared.features, prepared.target, None, None)
        };
        tracing::info!(
            "Training on {} rows, holding out {}",
            features.height(),
            test_target.as_ref().map_or(0, Vec::len)
        );

        // ── Step 7: Fit ───────────────────────────────────────────────────────
        let model = fit_model(cfg.estimator, &features, &target)?;
        tracing::info!("Training complete!");

        Ok(TrainingOutcome {
            model,
            features,
            target,
            test_features,
            test_target,
            encodings: prepared.encodings,
        })
    }

    /// Steps 1 to 5: load, preprocess, engineer, separate the
    /// target and align.
    pub fn prepare<S: DatasetSource>(&self, source: &S) -> Result<PreparedDataset> {
        let dataset = self.config.dataset;
        let ds_cfg  = dataset.config();

        // ── Step 1: Load ──────────────────────────────────────────────────────
        let raw = source.load()?;
        tracing::info!("Loaded {} raw rows", raw.height());

        // ── Step 2: Preprocess (train mode) ───────────────────────────────────
        let preprocessed = preprocess(raw, dataset, None, Mode::Train)
            .context("Preprocessing failed")?;
        let encodings = preprocessed
            .fitted_encodings
            .context("Train-mode preprocessing produced no encoding table")?;
        for column in encodings.columns() {
            tracing::info!("Encoded '{}' with {} levels", column, encodings.levels(column));
        }
        tracing::info!("{} rows after cleaning", preprocessed.frame.height());

        // ── Step 3: Feature engineering ───────────────────────────────────────
        let frame = build_features(preprocessed.frame, &preprocessed.skills, dataset)
            .context("Feature engineering failed")?;

        // ── Step 4: Separate the target ───────────────────────────────────────
        // Rows without a target cannot be learned from.
        let target_name = ds_cfg.target.name;
        let has_target  = frame
            .column(target_name)
            .with_context(|| format!("Target column '{target_name}' is missing"))?
            .as_materialized_series()
            .is_not_null();
        let before    = frame.height();
        let mut frame = frame.filter(&has_target)?;
        if frame.height() < before {
            tracing::warn!("Dropped {} rows with no target", before - frame.height());
        }

        let target: Vec<f64> = numbers(&frame, target_name)?.into_iter().flatten().collect();
        drop_if_present(&mut frame, target_name)?;

        // ── Step 5: Align to the frozen feature schema ────────────────────────
        let extra: Vec<String> = column_names(&frame)
            .into_iter()
            .filter(|name| !ds_cfg.feature_schema.iter().any(|s| s == name))
            .collect();
        if !extra.is_empty() {
            tracing::info!("Dropping {} columns outside the feature schema: {:?}", extra.len(), extra);
        }
        let features = align_to_model_schema(&frame, ds_cfg.feature_schema)
            .context("Alignment to the feature schema failed")?;

        tracing::info!(
            "Prepared {} rows x {} features",
            features.height(),
            features.width()
        );
        Ok(PreparedDataset { features, target, encodings })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::frame::to_matrix;
    use std::fmt::Write as _;
    use std::io::Write as _;

    const TITLES:    [&str; 4] = ["Data Scientist", "Backend Developer", "HR Manager", "Designer"];
    const COMPANIES: [&str; 3] = ["Acme", "Beta", "Gamma"];
    const JOB_TYPES: [&str; 3] = ["Remote", "Full-time", "Internship"];
    const SKILLS:    [&str; 4] = ["Python, SQL", "React, Git", "AWS, Docker, Python", ""];

    /// A small, deterministic job-market CSV with one extreme outlier
    /// (the last row) and one row without salaries.
    pub(crate) fn sample_csv(rows: usize) -> String {
        let mut csv = String::from(
            "job_title,company,location,job_type,category,experience_required,skills,salary_min,salary_max,publication_date\n",
        );
        for i in 0..rows {
            let experience = i % 8;
            let base = 40_000 + 3_000 * experience + 1_000 * (i % 3);
            let _ = writeln!(
                csv,
                "{},{},Berlin,{},Technology,{},\"{}\",{},{},2024-01-01",
                TITLES[i % 4],
                COMPANIES[i % 3],
                JOB_TYPES[i % 3],
                experience,
                SKILLS[i % 4],
                base,
                base + 10_000,
            );
        }
        csv.push_str("Designer,Acme,Berlin,Remote,Technology,2,Git,5000000,9000000,2024-01-01\n");
        csv.push_str("Designer,Acme,Berlin,Remote,Technology,2,Git,,,2024-01-01\n");
        csv
    }

    pub(crate) fn write_sample(rows: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(sample_csv(rows).as_bytes()).unwrap();
        f
    }

    fn ridge_config(data_path: &str) -> TrainConfig {
        TrainConfig {
            data_path: data_path.to_string(),
            estimator: EstimatorKind::Ridge,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_prepare_removes_outliers_and_aligns() {
        let f   = write_sample(40);
        let uc  = TrainUseCase::new(ridge_config(f.path().to_str().unwrap()));
        let ds  = uc.prepare(&CsvLoader::new(f.path(), DatasetId::JobMarket)).unwrap();
        let cfg = DatasetId::JobMarket.config();

        // the outlier and the salary-less row are gone
        assert_eq!(ds.features.height(), 40);
        assert_eq!(ds.target.len(), 40);
        assert!(ds.target.iter().all(|&t| t < 100_000.0));

        assert_eq!(column_names(&ds.features), cfg.feature_schema);
        assert!(to_matrix(&ds.features).is_ok());
        assert_eq!(ds.encodings.levels("company"), 3);
    }

    #[test]
    fn test_execute_splits_and_fits() {
        let f       = write_sample(40);
        let outcome = TrainUseCase::new(ridge_config(f.path().to_str().unwrap()))
            .execute()
            .unwrap();

        assert_eq!(outcome.test_target.as_ref().unwrap().len(), 8);
        assert_eq!(outcome.target.len(), 32);
        assert_eq!(outcome.features.height(), 32);
        assert_eq!(outcome.model.feature_names.len(), 35);

        let predictions = outcome.model.predict_frame(outcome.test_features.as_ref().unwrap()).unwrap();
        assert!(predictions.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_execute_without_split_uses_every_row() {
        let f   = write_sample(20);
        let cfg = TrainConfig { use_split: false, ..ridge_config(f.path().to_str().unwrap()) };
        let outcome = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(outcome.target.len(), 20);
        assert!(outcome.test_features.is_none());
    }

    #[test]
    fn test_rejects_bad_test_size() {
        let f   = write_sample(10);
        let cfg = TrainConfig { test_size: 1.0, ..ridge_config(f.path().to_str().unwrap()) };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }

    #[test]
    fn test_save_persists_artefacts() {
        let f   = write_sample(20);
        let tmp = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            save:      true,
            model_dir: tmp.path().to_str().unwrap().to_string(),
            ..ridge_config(f.path().to_str().unwrap())
        };
        TrainUseCase::new(cfg).execute().unwrap();

        assert!(tmp.path().join("model.json").is_file());
        assert!(tmp.path().join("mte_job_market.json").is_file());
        assert!(tmp.path().join("train_config.json").is_file());
    }
}
