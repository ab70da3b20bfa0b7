// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `predict`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → u64, f64, DatasetId, ...)
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::application::evaluate_use_case::EvaluateConfig;
use crate::application::predict_use_case::ServiceConfig;
use crate::application::train_use_case::TrainConfig;
use crate::domain::dataset::DatasetId;
use crate::domain::job_posting::PredictionRequest;
use crate::ml::model::EstimatorKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a salary model on the job-market CSV
    Train(TrainArgs),

    /// Report hold-out metrics and cross-validated RMSE
    Evaluate(EvaluateArgs),

    /// Predict the salary of one job posting with a saved model
    Predict(PredictArgs),
}

/// Flags shared by `train` and `evaluate`.
#[derive(Args, Debug)]
pub struct DataArgs {
    /// Raw job-market CSV
    #[arg(long, default_value = "data/job_market.csv")]
    pub data_path: String,

    /// Directory the model registry lives in
    #[arg(long, default_value = "models")]
    pub model_dir: String,

    /// Dataset configuration to apply
    #[arg(long, default_value = "job_market")]
    pub dataset: DatasetId,

    /// gradient_boosting or ridge
    #[arg(long, default_value = "gradient_boosting")]
    pub estimator: EstimatorKind,

    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    pub random_state: u64,

    /// Name the model is stored (or logged) under
    #[arg(long, default_value = "model")]
    pub model_name: String,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Fit on every row instead of holding out a test set
    #[arg(long)]
    pub no_split: bool,

    /// Persist the model, the encodings and the config
    #[arg(long)]
    pub save: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:    a.data.data_path,
            model_dir:    a.data.model_dir,
            dataset:      a.data.dataset,
            estimator:    a.data.estimator,
            use_split:    !a.no_split,
            test_size:    a.data.test_size,
            random_state: a.data.random_state,
            save:         a.save,
            model_name:   a.data.model_name,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Cross-validation folds (0 disables)
    #[arg(long, default_value_t = 5)]
    pub cv_folds: usize,

    /// Seed for the fold shuffle
    #[arg(long, default_value_t = 42)]
    pub cv_seed: u64,

    /// Do not append to evaluations.csv
    #[arg(long)]
    pub no_log: bool,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            train: TrainConfig {
                data_path:    a.data.data_path,
                model_dir:    a.data.model_dir,
                dataset:      a.data.dataset,
                estimator:    a.data.estimator,
                use_split:    true,
                test_size:    a.data.test_size,
                random_state: a.data.random_state,
                save:         false,
                model_name:   a.data.model_name,
            },
            cv_folds: a.cv_folds,
            cv_seed:  a.cv_seed,
            log:      !a.no_log,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory the model registry lives in
    #[arg(long, default_value = "models")]
    pub model_dir: String,

    /// Name of the saved model
    #[arg(long, default_value = "model")]
    pub model_name: String,

    #[arg(long, default_value = "job_market")]
    pub dataset: DatasetId,

    /// Whole request as a JSON document; overrides the field flags
    #[arg(long)]
    pub json: Option<String>,

    #[arg(long)]
    pub job_title: Option<String>,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub work_type: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Years of experience
    #[arg(long)]
    pub experience: Option<u32>,

    /// Comma-separated, e.g. "Python, SQL, AWS"
    #[arg(long, default_value = "")]
    pub skills: String,
}

impl PredictArgs {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            model_dir:  self.model_dir.clone(),
            model_name: self.model_name.clone(),
            dataset:    self.dataset,
        }
    }

    /// The request described by `--json`, or else by the field flags.
    pub fn request(&self) -> Result<PredictionRequest> {
        if let Some(json) = &self.json {
            return serde_json::from_str(json).context("Malformed --json request");
        }

        let missing: Vec<&str> = [
            ("--job-title", self.job_title.is_none()),
            ("--company", self.company.is_none()),
            ("--location", self.location.is_none()),
            ("--work-type", self.work_type.is_none()),
            ("--category", self.category.is_none()),
            ("--experience", self.experience.is_none()),
        ]
        .into_iter()
        .filter_map(|(flag, absent)| absent.then_some(flag))
        .collect();
        if !missing.is_empty() {
            bail!("Missing request fields: {} (or pass --json)", missing.join(", "));
        }

        Ok(PredictionRequest {
            job_title:  self.job_title.clone().unwrap_or_default(),
            company:    self.company.clone().unwrap_or_default(),
            location:   self.location.clone().unwrap_or_default(),
            work_type:  self.work_type.clone().unwrap_or_default(),
            category:   self.category.clone().unwrap_or_default(),
            experience: self.experience.unwrap_or_default(),
            skills:     self.skills.clone(),
        })
    }
}
