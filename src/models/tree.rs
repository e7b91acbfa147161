// =============================================================================
// Regression tree (second-order boosting split criterion)
// =============================================================================
//
// Each tree is fitted to the residuals r = y − ŷ of the current ensemble under
// squared loss (gradient −r, hessian 1). For a node holding rows S:
//
//   G = Σ r,   H = |S|
//   leaf weight = G / (H + λ)
//   split gain  = G_L²/(H_L + λ) + G_R²/(H_R + λ) − G²/(H + λ)
//
// Splits are searched exhaustively: rows are sorted per feature and every
// boundary between distinct values is a candidate (threshold = midpoint).
// A node becomes a leaf at `max_depth`, when no split has positive gain, or
// when no split leaves `min_samples_leaf` rows on both sides.
// =============================================================================

use serde::{Deserialize, Serialize};

/// Minimum gain for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    /// L2 regularisation on leaf weights.
    pub lambda: f64,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit a tree to `residuals` over feature rows `x`.
    pub fn fit(x: &[Vec<f64>], residuals: &[f64], params: &TreeParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let rows: Vec<usize> = (0..x.len()).collect();
        tree.grow(x, residuals, rows, 0, params);
        tree
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row.get(*feature).copied().unwrap_or(f64::NAN) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    /// Number of leaves, for diagnostics.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + depth_of(nodes, *left).max(depth_of(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            depth_of(&self.nodes, 0)
        }
    }

    /// Append the subtree for `rows` and return its node index.
    fn grow(
        &mut self,
        x: &[Vec<f64>],
        residuals: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let idx = self.nodes.len();
        let sum: f64 = rows.iter().map(|&i| residuals[i]).sum();
        let value = sum / (rows.len() as f64 + params.lambda);
        self.nodes.push(Node::Leaf { value });

        if depth >= params.max_depth || rows.len() < 2 * params.min_samples_leaf.max(1) {
            return idx;
        }

        let Some(best) = best_split(x, residuals, &rows, params) else {
            return idx;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| x[i][best.feature] <= best.threshold);

        let left = self.grow(x, residuals, left_rows, depth + 1, params);
        let right = self.grow(x, residuals, right_rows, depth + 1, params);
        self.nodes[idx] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        idx
    }
}

fn best_split(x: &[Vec<f64>], residuals: &[f64], rows: &[usize], params: &TreeParams) -> Option<BestSplit> {
    let width = x.get(rows[0])?.len();
    let min_leaf = params.min_samples_leaf.max(1);
    let n = rows.len();
    let total: f64 = rows.iter().map(|&i| residuals[i]).sum();
    let parent_score = total * total / (n as f64 + params.lambda);

    let mut best: Option<BestSplit> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..width {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += residuals[sorted[pos]];
            let left_n = pos + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let here = x[sorted[pos]][feature];
            let next = x[sorted[pos + 1]][feature];
            if here == next {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / (left_n as f64 + params.lambda)
                + right_sum * right_sum / (right_n as f64 + params.lambda)
                - parent_score;

            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(BestSplit {
                    feature,
                    threshold: here + (next - here) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            lambda: 0.0,
            min_samples_leaf: 1,
        }
    }

    #[test]
    fn single_split_separates_step() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { -1.0 } else { 1.0 }).collect();
        let tree = RegressionTree::fit(&x, &y, &params(1));
        assert_eq!(tree.leaf_count(), 2);
        assert!((tree.predict(&[2.0]) + 1.0).abs() < 1e-12);
        assert!((tree.predict(&[7.0]) - 1.0).abs() < 1e-12);
        // Threshold sits between 4 and 5.
        assert!((tree.predict(&[4.4]) + 1.0).abs() < 1e-12);
        assert!((tree.predict(&[4.6]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn depth_zero_is_a_single_leaf() {
        let x: Vec<Vec<f64>> = (0..4).map(|i| vec![i as f64]).collect();
        let tree = RegressionTree::fit(&x, &[1.0, 2.0, 3.0, 6.0], &params(0));
        assert_eq!(tree.leaf_count(), 1);
        assert!((tree.predict(&[0.0]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn lambda_shrinks_leaf_weights() {
        let x = vec![vec![0.0], vec![1.0]];
        let tree = RegressionTree::fit(
            &x,
            &[2.0, 2.0],
            &TreeParams {
                max_depth: 0,
                lambda: 2.0,
                min_samples_leaf: 1,
            },
        );
        // 4 / (2 + 2)
        assert!((tree.predict(&[0.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn respects_max_depth_and_min_leaf() {
        let x: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..64).map(|i| ((i * 7) % 11) as f64).collect();
        let tree = RegressionTree::fit(
            &x,
            &y,
            &TreeParams {
                max_depth: 3,
                lambda: 1.0,
                min_samples_leaf: 5,
            },
        );
        assert!(tree.depth() <= 3);
        assert!(tree.leaf_count() <= 8);
    }

    #[test]
    fn constant_features_do_not_split() {
        let x = vec![vec![1.0]; 6];
        let tree = RegressionTree::fit(&x, &[1.0, -1.0, 2.0, 0.0, 3.0, 1.0], &params(4));
        assert_eq!(tree.leaf_count(), 1);
    }
}
