// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw CSV and the feature matrix the
// estimator consumes:
//
//   job_market.csv / PredictionRequest
//       │
//       ▼
//   CsvLoader         → raw DataFrame (training only)
//       │
//       ▼
//   preprocess        → cleaning, nulls, one-hot, MTE, skills
//       │
//       ▼
//   build_features    → skill groups, skill_count, experience
//       │
//       ▼
//   align             → frozen feature schema, no missing cells
//       │
//       ▼
//   splitter          → train/test rows, k-fold partitions
//
// Training and inference go through the same stages; only the
// preprocessing mode differs.

/// Shared polars column accessors and the ndarray bridge
pub mod frame;

/// Reads the raw dataset from CSV
pub mod loader;

/// Mean-target encoding table (fit / apply / persist)
pub mod encoding;

/// Preprocessing stage, train and inference modes
pub mod preprocessor;

/// Feature engineering stage
pub mod features;

/// Alignment to the model's feature schema
pub mod schema;

/// Seeded train/test split and k-fold partitions
pub mod splitter;
