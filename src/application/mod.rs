// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, evaluating or predicting).
//
// Rules for this layer:
//   - No estimator math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Hold-out metrics and cross-validation
pub mod evaluate_use_case;

// The single-request prediction workflow
pub mod predict_use_case;
