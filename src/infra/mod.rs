// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concerns used by several layers that belong to none of them:
//
//   registry.rs — named JSON blobs on disk: the trained model,
//                 the mean-target encoding table and the train
//                 config that produced them
//
//   metrics.rs  — regression metrics and the evaluation CSV
//                 logger
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// File-backed model registry
pub mod registry;

/// Regression metrics and evaluation logging
pub mod metrics;
