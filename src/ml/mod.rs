// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Estimators work on dense ndarray matrices; nothing outside this
// layer touches a matrix directly. Callers hand in an aligned
// DataFrame and get a SalaryModel (or predictions) back.
//
//   tree.rs    — least-squares regression tree, grown leaf-wise
//   gbm.rs     — gradient-boosted trees (the default estimator)
//   ridge.rs   — standardised ridge regression
//   model.rs   — Regressor trait, Estimator enum, SalaryModel
//   trainer.rs — fitting and k-fold cross-validation
//
// Reference: Friedman (2001) Greedy Function Approximation
//            Ke et al. (2017) LightGBM (leaf-wise growth)

/// Regression tree used as the boosting base learner
pub mod tree;

/// Gradient-boosted regression trees
pub mod gbm;

/// Ridge regression baseline
pub mod ridge;

/// Regressor capability trait and the persisted model bundle
pub mod model;

/// Model fitting and cross-validated scoring
pub mod trainer;
