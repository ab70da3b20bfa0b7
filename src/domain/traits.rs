// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//
//   DatasetSource    → where raw training rows come from
//   BlobStore        → named persistence for trained artefacts
//   SalaryPredictor  → anything that turns a request into a salary
//
// The estimator capability (`Regressor`) sits in the ML layer
// because it speaks ndarray.

use anyhow::Result;
use polars::prelude::DataFrame;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::job_posting::{PredictionRequest, PredictionResponse};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can produce the raw dataset as a frame.
///
/// Implementations:
///   - CsvLoader → reads a delimited file with a header row
pub trait DatasetSource {
    fn load(&self) -> Result<DataFrame>;
}

// ─── BlobStore ────────────────────────────────────────────────────────────────
/// Named persistence for serialisable artefacts.
///
/// Implementations:
///   - ModelRegistry → one JSON file per name in a directory
pub trait BlobStore {
    fn save<T: Serialize>(&self, blob: &T, name: &str) -> Result<()>;

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T>;
}

// ─── SalaryPredictor ──────────────────────────────────────────────────────────
/// Any component that can answer a salary prediction request.
///
/// Implementations:
///   - PredictionService → feature pipeline + trained estimator
pub trait SalaryPredictor {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse>;
}
