//! CART regression trees
//!
//! Squared-error trees grown with exact greedy splits. Nodes are stored in a
//! flat vector with the root at index 0.

use serde::{Deserialize, Serialize};

/// Smallest impurity decrease that counts as a split
const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        /// Rows with `x[feature] <= threshold` go left
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// A tree plus the squared-error decrease credited to each feature
#[derive(Debug, Clone)]
pub struct FittedTree {
    pub tree: RegressionTree,
    pub gains: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the given sample indices (repeats allowed)
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], samples: &[usize], params: TreeParams) -> FittedTree {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut builder = TreeBuilder {
            rows,
            targets,
            params: TreeParams {
                min_samples_leaf: params.min_samples_leaf.max(1),
                min_samples_split: params.min_samples_split.max(2),
                ..params
            },
            nodes: Vec::new(),
            gains: vec![0.0; width],
        };

        let mut samples = samples.to_vec();
        builder.grow(&mut samples, 0);

        FittedTree {
            tree: RegressionTree {
                nodes: builder.nodes,
            },
            gains: builder.gains,
        }
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
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn depth_from(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(Node::Split { left, right, .. }) => {
                    1 + depth_from(nodes, *left).max(depth_from(nodes, *right))
                }
                _ => 0,
            }
        }
        depth_from(&self.nodes, 0)
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
    gains: Vec<f64>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let id = self.nodes.len();
        let value = mean(samples.iter().map(|&i| self.targets[i]));
        self.nodes.push(Node::Leaf { value });

        let n = samples.len();
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
        {
            return id;
        }

        let Some(split) = self.best_split(samples) else {
            return id;
        };
        self.gains[split.feature] += split.gain;

        let rows = self.rows;
        let mid = partition(samples, |&i| rows[i][split.feature] <= split.threshold);
        let (left_samples, right_samples) = samples.split_at_mut(mid);

        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    /// Exhaustive search over features and midpoints between distinct values
    fn best_split(&self, samples: &[usize]) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let total: f64 = samples.iter().map(|&i| self.targets[i]).sum();
        let parent_term = total * total / n as f64;

        let mut best: Option<BestSplit> = None;
        let mut order = samples.to_vec();
        let width = self.gains.len();

        for feature in 0..width {
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += self.targets[order[k - 1]];
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let lo = self.rows[order[k - 1]][feature];
                let hi = self.rows[order[k]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / k as f64
                    + right_sum * right_sum / (n - k) as f64
                    - parent_term;

                if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Move elements matching `pred` to the front, returning how many matched
fn partition<T, F: Fn(&T) -> bool>(items: &mut [T], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
