// ============================================================
// Layer 5 — Histogram Regression Tree
// ============================================================
// A least-squares regression tree grown leaf-wise: at every
// step the leaf whose best split reduces the squared error the
// most is split, until the leaf budget is spent or no split
// gains anything.
//
//   split gain = S_L² / n_L + S_R² / n_R − S² / n
//
// where S is the sum of the targets in a node and n its size.
// Rows go left when `x[feature] <= threshold`.
//
// Why histograms?
//   An exact split search sorts every feature at every node.
//   With 600 boosting rounds of up to 31 leaves that dominates
//   training time. Instead each feature is quantised ONCE into
//   at most `max_bins` ordered bins (BinnedMatrix); a node then
//   only accumulates per-bin (sum, count) pairs in one pass over
//   its rows and scans the bins. A feature with few distinct
//   values (one-hot indicators, skill counts) gets one bin per
//   value, so its splits are exactly the exact-search ones.
//
// Bin edges are midpoints between neighbouring values, so a
// fitted tree predicts straight from raw feature values.

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Hard cap: bin indices are stored as `u8`.
pub const MAX_BINS: usize = 256;

/// Growth limits for one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_leaves:       usize,
    /// `None` means unlimited depth.
    pub max_depth:        Option<usize>,
    pub min_samples_leaf: usize,
    pub min_split_gain:   f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_leaves:       31,
            max_depth:        None,
            min_samples_leaf: 20,
            min_split_gain:   0.0,
        }
    }
}

// ─── Binned Features ──────────────────────────────────────────────────────────

/// Column-major bin indices of a feature matrix plus, per feature,
/// the ascending upper edges separating its bins.
///
/// A value `x` lands in the first bin whose edge is `>= x`; values
/// above every edge land in the last bin.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    bins:  Vec<Vec<u8>>,
    edges: Vec<Vec<f64>>,
    nrows: usize,
}

impl BinnedMatrix {
    /// Bin every column of `features` into at most `max_bins` bins.
    pub fn new(features: ArrayView2<'_, f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.clamp(2, MAX_BINS);
        let mut bins  = Vec::with_capacity(features.ncols());
        let mut edges = Vec::with_capacity(features.ncols());

        for column in features.columns() {
            let column_edges = bin_edges(column, max_bins);
            bins.push(
                column
                    .iter()
                    .map(|&x| column_edges.partition_point(|&e| e < x) as u8)
                    .collect(),
            );
            edges.push(column_edges);
        }

        Self { bins, edges, nrows: features.nrows() }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.bins.len()
    }

    fn n_bins(&self, feature: usize) -> usize {
        self.edges[feature].len() + 1
    }
}

/// Midpoints between neighbouring distinct values. With more
/// distinct values than bins, the cut points are spread evenly
/// over the sorted distinct values.
fn bin_edges(column: ArrayView1<'_, f64>, max_bins: usize) -> Vec<f64> {
    let mut distinct: Vec<f64> = column.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    let d = distinct.len();
    if d <= max_bins {
        return distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }

    let mut edges: Vec<f64> = (1..max_bins)
        .map(|k| {
            let i = (k * d / max_bins).clamp(1, d - 1);
            (distinct[i - 1] + distinct[i]) / 2.0
        })
        .collect();
    edges.dedup();
    edges
}

// ─── Tree ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature:   usize,
        threshold: f64,
        left:      usize,
        right:     usize,
    },
}

/// A fitted tree stored as a flat node list; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    /// Last bin that goes left.
    bin:     usize,
    gain:    f64,
}

/// A leaf that may still be split.
struct Frontier {
    node:  usize,
    rows:  Vec<usize>,
    depth: usize,
    split: Option<BestSplit>,
}

impl RegressionTree {
    /// Fit a tree to `target` over the given rows of `data`.
    pub fn fit(
        data:   &BinnedMatrix,
        target: ArrayView1<'_, f64>,
        rows:   Vec<usize>,
        params: &TreeParams,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { value: mean_of(target, &rows) }];
        let mut frontier = vec![Frontier {
            node:  0,
            split: find_best_split(data, target, &rows, params),
            rows,
            depth: 0,
        }];
        let mut leaves = 1;

        while leaves < params.max_leaves {
            // ── Pick the most profitable leaf ────────────────────────────────
            let best = frontier
                .iter()
                .enumerate()
                .filter_map(|(i, f)| f.split.map(|s| (i, s.gain)))
                .filter(|&(_, gain)| gain > params.min_split_gain)
                .max_by(|a, b| a.1.total_cmp(&b.1));
            let Some((index, _)) = best else {
                break;
            };
            let leaf = frontier.swap_remove(index);
            let Some(split) = leaf.split else {
                break;
            };

            // ── Partition its rows ───────────────────────────────────────────
            let column = &data.bins[split.feature];
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = leaf
                .rows
                .iter()
                .partition(|&&r| usize::from(column[r]) <= split.bin);

            let left  = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: mean_of(target, &left_rows) });
            nodes.push(Node::Leaf { value: mean_of(target, &right_rows) });
            nodes[leaf.node] = Node::Split {
                feature:   split.feature,
                threshold: data.edges[split.feature][split.bin],
                left,
                right,
            };
            leaves += 1;

            // ── Queue the children ───────────────────────────────────────────
            let depth = leaf.depth + 1;
            let can_grow = params.max_depth.map_or(true, |max| depth < max);
            for (node, rows) in [(left, left_rows), (right, right_rows)] {
                let split = if can_grow {
                    find_best_split(data, target, &rows, params)
                } else {
                    None
                };
                frontier.push(Frontier { node, rows, depth, split });
            }
        }

        Self { nodes }
    }

    /// Leaf value reached by `row`.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn mean_of(target: ArrayView1<'_, f64>, rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&r| target[r]).sum::<f64>() / rows.len() as f64
}

/// Scan every feature's histogram over `rows` for the split with
/// the largest gain, honouring `min_samples_leaf`.
fn find_best_split(
    data:   &BinnedMatrix,
    target: ArrayView1<'_, f64>,
    rows:   &[usize],
    params: &TreeParams,
) -> Option<BestSplit> {
    let n        = rows.len();
    let min_leaf = params.min_samples_leaf.max(1);
    if n < 2 * min_leaf {
        return None;
    }

    let total: f64 = rows.iter().map(|&r| target[r]).sum();
    let parent     = total * total / n as f64;
    let mut best: Option<BestSplit> = None;

    let mut sums   = [0.0_f64; MAX_BINS];
    let mut counts = [0_usize; MAX_BINS];

    for feature in 0..data.ncols() {
        let n_bins = data.n_bins(feature);
        if n_bins < 2 {
            continue;
        }

        // ── Build the histogram ──────────────────────────────────────────────
        sums[..n_bins].fill(0.0);
        counts[..n_bins].fill(0);
        let column = &data.bins[feature];
        for &r in rows {
            let b = usize::from(column[r]);
            sums[b]   += target[r];
            counts[b] += 1;
        }

        // ── Scan the bin boundaries ──────────────────────────────────────────
        let mut left_sum   = 0.0;
        let mut left_count = 0;
        for bin in 0..n_bins - 1 {
            left_sum   += sums[bin];
            left_count += counts[bin];
            let right_count = n - left_count;
            if counts[bin] == 0 || left_count < min_leaf || right_count < min_leaf {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - parent;

            if best.map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit { feature, bin, gain });
            }
        }
    }
    best
}
