// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles row indices with a seeded RNG and splits them into
//   - a training set: used to fit the estimator
//   - a test set:     held out for the evaluation metrics
//
// The same seed always yields the same split, so a reported
// metric can be reproduced from the stored train config.
//
// Also produces shuffled k-fold partitions for cross-validated
// RMSE.
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split off a test set of
/// `ceil(test_size · n)` items.
///
/// # Returns
/// A tuple (train_samples, test_samples)
pub fn split_train_test<T>(mut samples: Vec<T>, test_size: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let n_test  = ((total as f64) * test_size).ceil() as usize;
    let n_test  = n_test.min(total);
    let test    = samples.split_off(total - n_test);

    tracing::debug!(
        "Dataset split: {} train, {} test (seed {})",
        samples.len(),
        test.len(),
        seed
    );

    (samples, test)
}

/// Shuffled k-fold partition of `0..n`: for every fold, the
/// (train, validation) index lists. Fold sizes differ by at most one.
pub fn k_fold(n: usize, folds: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let folds = folds.max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let base  = n / folds;
    let extra = n % folds;
    let mut start = 0;
    let mut out   = Vec::with_capacity(folds);

    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        let validation = indices[start..start + size].to_vec();
        let train = indices[..start]
            .iter()
            .chain(&indices[start + size..])
            .copied()
            .collect();
        out.push((train, validation));
        start += size;
    }
    out
}
