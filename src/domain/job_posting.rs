// ============================================================
// Layer 3 — Job Posting Domain Types
// ============================================================
// The request/response pair of the prediction entry point.
// Field names are the request-facing ones (`work_type`,
// `experience`); the preprocessing stage renames them.

use serde::{Deserialize, Serialize};

/// One job posting as submitted for a salary prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub job_title:  String,
    pub company:    String,
    pub location:   String,
    pub work_type:  String,
    pub category:   String,
    pub experience: u32,
    /// Comma-separated, e.g. "Python, SQL, AWS"
    pub skills:     String,
}

/// The model's answer to one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_salary: f64,
}
