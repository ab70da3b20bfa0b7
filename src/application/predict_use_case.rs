// ============================================================
// Layer 2 — Prediction Service
// ============================================================
// Answers one salary request at a time:
//
//   Step 1: Request → single-row frame      (this layer)
//   Step 2: Preprocess in inference mode    (Layer 4 - data)
//   Step 3: Engineer features               (Layer 4 - data)
//   Step 4: Align to the feature schema     (Layer 4 - data)
//   Step 5: Predict                         (Layer 5 - ml)
//
// The trained model and the encoding table are loaded once, when
// the service is built, and never change afterwards. If either
// cannot be loaded, or the model was trained on a different
// feature list than the configured schema, the service is not
// built at all.
//
// Why run the training stages on a single row?
//   Sharing preprocess / build_features / align with training is
//   what keeps a request's 35 inputs identical to those of the
//   same posting seen during training. Only the mode differs:
//   inference applies the frozen encodings instead of fitting them.

use anyhow::{bail, Context, Result};
use polars::df;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use crate::data::{
    encoding::EncodingTable,
    features::build_features,
    preprocessor::{preprocess, Mode},
    schema::align_to_model_schema,
};
use crate::domain::dataset::DatasetId;
use crate::domain::job_posting::{PredictionRequest, PredictionResponse};
use crate::domain::traits::SalaryPredictor;
use crate::infra::registry::ModelRegistry;
use crate::ml::model::SalaryModel;

// ─── Service Configuration ────────────────────────────────────────────────────
/// Where the prediction service finds its artefacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub model_dir:  String,
    pub model_name: String,
    pub dataset:    DatasetId,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_dir:  "models".to_string(),
            model_name: "model".to_string(),
            dataset:    DatasetId::JobMarket,
        }
    }
}

// ─── PredictionService ────────────────────────────────────────────────────────
/// A loaded model plus the encodings it was trained with.
#[derive(Debug)]
pub struct PredictionService {
    dataset:   DatasetId,
    model:     SalaryModel,
    encodings: EncodingTable,
}

impl PredictionService {
    /// Load the model and the encoding table from the registry.
    pub fn load(cfg: &ServiceConfig) -> Result<Self> {
        let registry  = ModelRegistry::new(&cfg.model_dir)?;
        let model     = registry.load_model(&cfg.model_name)?;
        let encodings = registry.load_encodings(cfg.dataset)?;
        tracing::info!(
            "Loaded {} model '{}' from '{}'",
            model.estimator.kind(),
            cfg.model_name,
            cfg.model_dir
        );
        if registry.has_config() {
            let train = registry.load_config()?;
            tracing::info!("Model was trained on '{}' (seed {})", train.data_path, train.random_state);
        }
        Self::new(cfg.dataset, model, encodings)
    }

    /// Build a service from already-loaded parts, checking that the
    /// model's feature list is the dataset's schema.
    pub fn new(dataset: DatasetId, model: SalaryModel, encodings: EncodingTable) -> Result<Self> {
        let schema = dataset.config().feature_schema;
        if !model.feature_names.iter().eq(schema.iter()) {
            bail!(
                "Model was trained on {} features that do not match the {} '{}' schema features",
                model.feature_names.len(),
                schema.len(),
                dataset
            );
        }
        Ok(Self { dataset, model, encodings })
    }

    /// Steps 1 to 4: the aligned single-row feature frame for `request`.
    pub fn features_for(&self, request: &PredictionRequest) -> Result<DataFrame> {
        let cfg = self.dataset.config();

        let frame = request_frame(request)?;
        let preprocessed = preprocess(frame, self.dataset, Some(&self.encodings), Mode::Inference)
            .context("Preprocessing the request failed")?;
        let frame = build_features(preprocessed.frame, &preprocessed.skills, self.dataset)
            .context("Feature engineering for the request failed")?;
        let aligned = align_to_model_schema(&frame, cfg.feature_schema)
            .context("Aligning the request to the feature schema failed")?;
        Ok(aligned)
    }
}

impl SalaryPredictor for PredictionService {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        let features    = self.features_for(request)?;
        let predictions = self.model.predict_frame(&features)?;
        let predicted_salary = predictions
            .get(0)
            .copied()
            .context("Model returned no prediction")?;

        tracing::debug!(
            "Predicted {:.2} for '{}' at '{}'",
            predicted_salary,
            request.job_title,
            request.company
        );
        Ok(PredictionResponse { predicted_salary })
    }
}

/// One-row frame carrying the request's fields under their
/// request-facing names. Values are passed through untouched.
fn request_frame(request: &PredictionRequest) -> Result<DataFrame> {
    let frame = df![
        "job_title"  => [request.job_title.as_str()],
        "company"    => [request.company.as_str()],
        "location"   => [request.location.as_str()],
        "work_type"  => [request.work_type.as_str()],
        "category"   => [request.category.as_str()],
        "experience" => [f64::from(request.experience)],
        "skills"     => [request.skills.as_str()],
    ]
    .context("Building the request frame failed")?;
    Ok(frame)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{tests::write_sample, TrainConfig, TrainUseCase};
    use crate::data::frame::{column_names, numbers, to_matrix};
    use crate::data::loader::CsvLoader;
    use crate::ml::model::{EstimatorKind, Regressor};
    use ndarray::{Array1, Array2};

    fn request() -> PredictionRequest {
        PredictionRequest {
            job_title:  "Data Scientist".into(),
            company:    "Acme".into(),
            location:   "Berlin".into(),
            work_type:  "Remote".into(),
            category:   "Technology".into(),
            experience: 3,
            skills:     "Python, SQL, AWS".into(),
        }
    }

    /// A ridge model over the full schema that always predicts 1.5.
    fn constant_model() -> SalaryModel {
        let schema = DatasetId::JobMarket.config().feature_schema;
        let x = Array2::<f64>::zeros((2, schema.len()));
        let y = Array1::from(vec![1.0, 2.0]);
        let mut estimator = EstimatorKind::Ridge.build();
        estimator.fit(x.view(), y.view()).unwrap();
        SalaryModel::new(schema.iter().map(|s| s.to_string()).collect(), estimator)
    }

    fn encodings() -> EncodingTable {
        let t = df![
            "job_title"   => &["Data Scientist"],
            "company"     => &["Acme"],
            "location"    => &["Munich"],
            "salary_mean" => &[60_000.0],
        ]
        .unwrap();
        EncodingTable::fit(&t, &["job_title", "company", "location"], "salary_mean").unwrap()
    }

    #[test]
    fn test_request_features_match_the_schema() {
        let svc = PredictionService::new(DatasetId::JobMarket, constant_model(), encodings()).unwrap();
        let features = svc.features_for(&request()).unwrap();
        let schema   = DatasetId::JobMarket.config().feature_schema;

        assert_eq!(column_names(&features), schema);
        assert_eq!(features.height(), 1);

        let value = |name: &str| numbers(&features, name).unwrap()[0].unwrap();
        assert_eq!(value("backend_skills"), 1.0);
        assert_eq!(value("db_skills"), 1.0);
        assert_eq!(value("infra_skills"), 1.0);
        assert_eq!(value("frontend_skills"), 0.0);
        assert_eq!(value("skill_count"), 3.0);
        assert_eq!(value("experience_sq"), 9.0);
        assert!((value("experience_log") - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(value("job_type_Remote"), 1.0);
        assert_eq!(value("category_Technology"), 1.0);
        assert_eq!(value("job_title_mte"), 60_000.0);
        assert_eq!(value("company_mte"), 60_000.0);
        // Berlin was never seen
        assert_eq!(value("location_mte"), 0.0);

        let hot: f64 = schema
            .iter()
            .filter(|n| n.starts_with("job_type_") || n.starts_with("category_"))
            .map(|n| value(n))
            .sum();
        assert_eq!(hot, 2.0);
    }

    #[test]
    fn test_request_matches_its_training_row() {
        let data = write_sample(40);
        let uc   = TrainUseCase::new(TrainConfig {
            data_path: data.path().to_str().unwrap().to_string(),
            estimator: EstimatorKind::Ridge,
            ..TrainConfig::default()
        });
        let prepared = uc.prepare(&CsvLoader::new(data.path(), DatasetId::JobMarket)).unwrap();
        let training = to_matrix(&prepared.features).unwrap();

        // sample row 2, asked for as a request
        let request = PredictionRequest {
            job_title:  "HR Manager".into(),
            company:    "Gamma".into(),
            location:   "Berlin".into(),
            work_type:  "Internship".into(),
            category:   "Technology".into(),
            experience: 2,
            skills:     "AWS, Docker, Python".into(),
        };
        let svc = PredictionService::new(DatasetId::JobMarket, constant_model(), prepared.encodings).unwrap();
        let served = to_matrix(&svc.features_for(&request).unwrap()).unwrap();

        assert_eq!(served.ncols(), 35);
        let schema = DatasetId::JobMarket.config().feature_schema;
        for (j, name) in schema.iter().enumerate() {
            assert!(
                (training[[2, j]] - served[[0, j]]).abs() < 1e-9,
                "{name}: trained on {} but served {}",
                training[[2, j]],
                served[[0, j]]
            );
        }
    }

    #[test]
    fn test_request_fields_are_not_trimmed() {
        let svc = PredictionService::new(DatasetId::JobMarket, constant_model(), encodings()).unwrap();
        let padded = PredictionRequest { company: " Acme ".into(), ..request() };
        let features = svc.features_for(&padded).unwrap();
        assert_eq!(numbers(&features, "company_mte").unwrap(), vec![Some(0.0)]);
    }

    #[test]
    fn test_predict_returns_the_model_output() {
        let svc = PredictionService::new(DatasetId::JobMarket, constant_model(), encodings()).unwrap();
        let response = svc.predict(&request()).unwrap();
        assert!((response.predicted_salary - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_mismatched_feature_contract_is_rejected() {
        let mut model = constant_model();
        model.feature_names.swap(0, 1);
        assert!(PredictionService::new(DatasetId::JobMarket, model, encodings()).is_err());
    }

    #[test]
    fn test_load_fails_without_artefacts() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = ServiceConfig {
            model_dir: tmp.path().to_str().unwrap().to_string(),
            ..ServiceConfig::default()
        };
        assert!(PredictionService::load(&cfg).is_err());
    }

    #[test]
    fn test_trained_service_predicts() {
        let data = write_sample(40);
        let tmp  = tempfile::tempdir().unwrap();
        let dir  = tmp.path().to_str().unwrap().to_string();

        TrainUseCase::new(TrainConfig {
            data_path: data.path().to_str().unwrap().to_string(),
            model_dir: dir.clone(),
            estimator: EstimatorKind::Ridge,
            save:      true,
            ..TrainConfig::default()
        })
        .execute()
        .unwrap();

        let svc = PredictionService::load(&ServiceConfig { model_dir: dir, ..ServiceConfig::default() }).unwrap();
        let response = svc.predict(&request()).unwrap();
        assert!(response.predicted_salary.is_finite());
        assert!(response.predicted_salary > 0.0);
    }
}
