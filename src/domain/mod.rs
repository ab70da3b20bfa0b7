// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain structs, enums and traits describing what the system
// works with:
//
//   dataset.rs      — per-dataset column configuration
//   job_posting.rs  — prediction request / response
//   traits.rs       — the abstractions other layers implement
//
// No file I/O and no estimator code in this layer.

pub mod dataset;

pub mod job_posting;

pub mod traits;
