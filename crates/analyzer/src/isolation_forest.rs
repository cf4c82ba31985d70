//! Isolation Forest scoring.
//!
//! Anomalies are few and different, so random axis-aligned splits isolate
//! them in fewer steps than normal points. The score of a row is
//! `2^(-E[h(x)] / c(ψ))` where `h` is its path length in a tree grown on `ψ`
//! sampled rows: close to 1 for anomalies, around 0.5 or below for the rest.
//! Higher means more anomalous.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
const DEFAULT_MAX_SAMPLES: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Rows drawn per tree; `None` means `min(256, n)`.
    pub max_samples: Option<usize>,
    pub seed: u64,
}

#[derive(Debug, Clone)]
enum Node {
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// A fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Grows `params.n_estimators` trees on `data`. Deterministic for a given seed.
    pub fn fit(data: &Array2<f64>, params: &ForestParams) -> Self {
        let n_rows = data.nrows();
        let sample_size = params
            .max_samples
            .unwrap_or(DEFAULT_MAX_SAMPLES)
            .min(n_rows)
            .max(1);
        let height_limit = (sample_size as f64).log2().ceil() as usize;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_estimators)
            .map(|_| {
                let rows = sample(&mut rng, n_rows, sample_size).into_vec();
                grow(data, rows, 0, height_limit, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = params.n_estimators,
            sample_size,
            height_limit,
            "Isolation forest fitted"
        );
        Self { trees, sample_size }
    }

    /// Anomaly score per row of `data`, in `(0, 1]`.
    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        let norm = average_path_length(self.sample_size);

        data.rows()
            .into_iter()
            .map(|row| {
                if norm <= 0.0 || self.trees.is_empty() {
                    return 0.5;
                }
                let mean_path = self
                    .trees
                    .iter()
                    .map(|tree| path_length(tree, row))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                2.0_f64.powf(-mean_path / norm)
            })
            .collect()
    }
}

fn grow(
    data: &Array2<f64>,
    rows: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    // Only features that still vary inside this node can split it.
    let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|feature| {
            let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    // Interpolated so that spans wider than f64::MAX stay finite.
    let u: f64 = rng.gen_range(0.0..1.0);
    let threshold = min * (1.0 - u) + max * u;
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.iter().partition(|&&r| data[[r, feature]] < threshold);

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    Node::Internal {
        feature,
        threshold,
        left: Box::new(grow(data, left, depth + 1, height_limit, rng)),
        right: Box::new(grow(data, right, depth + 1, height_limit, rng)),
    }
}

fn path_length(tree: &Node, row: ArrayView1<'_, f64>) -> f64 {
    let mut node = tree;
    let mut depth = 0.0;
    loop {
        match node {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                node = if row[*feature] < *threshold { left } else { right };
                depth += 1.0;
            }
        }
    }
}

/// Average path length of an unsuccessful binary-search-tree lookup among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// The score at or above which `round(contamination * n)` rows (at least one) are flagged.
///
/// Every row tied with the threshold score is flagged too, so heavily tied
/// scores can flag more rows than that, up to all `n`.
pub fn contamination_threshold(scores: &[f64], contamination: f64) -> f64 {
    if scores.is_empty() {
        return f64::INFINITY;
    }
    let n = scores.len();
    let k = ((contamination * n as f64).round() as usize).clamp(1, n);

    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted[k - 1]
}
