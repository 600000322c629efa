//! Seeded train/held-out partitioning

use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `0..n` with a fixed seed and hold out `ceil(n * test_fraction)` rows.
    ///
    /// The training partition always keeps at least one row when `n > 0`.
    pub fn new(n: usize, test_fraction: f64, seed: u64) -> Self {
        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        Self::hold_out_tail(indices, test_fraction)
    }

    /// Hold out the last `ceil(n * test_fraction)` rows in their original order.
    ///
    /// For time-ordered rows every test index is later than every train index.
    pub fn chronological(n: usize, test_fraction: f64) -> Self {
        Self::hold_out_tail((0..n).collect(), test_fraction)
    }

    fn hold_out_tail(mut indices: Vec<usize>, test_fraction: f64) -> Self {
        let n = indices.len();
        let fraction = if test_fraction.is_finite() {
            test_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut n_test = (n as f64 * fraction).ceil() as usize;
        if n_test >= n {
            n_test = n.saturating_sub(1);
        }

        let test = indices.split_off(n - n_test);
        log::info!("Split {} rows: train={}, test={}", n, indices.len(), test.len());

        TrainTestSplit {
            train: indices,
            test,
        }
    }

    /// Pick the rows of one partition
    pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
        indices.iter().map(|&i| items[i].clone()).collect()
    }
}
