//! Poisson scoreline grid
//!
//! Converts a pair of expected goal rates into home/draw/away probabilities
//! by summing independent Poisson masses over scorelines 0-0 to 5-5.

use crate::OutcomeProbabilities;

/// Highest goal count per side included in the grid
pub const MAX_GOALS: usize = 5;

/// Poisson point masses P(0..=MAX_GOALS; lambda).
///
/// Negative or non-finite rates are treated as 0.
pub fn poisson_masses(lambda: f64) -> [f64; MAX_GOALS + 1] {
    let lambda = if lambda.is_finite() { lambda.max(0.0) } else { 0.0 };
    let mut masses = [0.0; MAX_GOALS + 1];
    masses[0] = (-lambda).exp();
    for k in 1..=MAX_GOALS {
        masses[k] = masses[k - 1] * lambda / k as f64;
    }
    masses
}

/// Outcome distribution from expected goals
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbabilityEngine;

impl ProbabilityEngine {
    pub fn new() -> Self {
        ProbabilityEngine
    }

    /// Probabilities of home win, draw and away win, summing to 1.
    ///
    /// Mass beyond the grid is dropped and the three buckets renormalised.
    pub fn outcome_probabilities(&self, lambda_home: f64, lambda_away: f64) -> OutcomeProbabilities {
        let home = poisson_masses(lambda_home);
        let away = poisson_masses(lambda_away);

        // Paired accumulation keeps swapped inputs exactly mirrored
        let mut p_home = 0.0;
        let mut p_away = 0.0;
        let mut p_draw = 0.0;
        for i in 0..=MAX_GOALS {
            for j in 0..i {
                p_home += home[i] * away[j];
                p_away += away[i] * home[j];
            }
            p_draw += home[i] * away[i];
        }

        OutcomeProbabilities {
            home: p_home,
            draw: p_draw,
            away: p_away,
        }
        .normalized()
    }

    /// Full grid of scoreline probabilities, `grid[h][a]`, before renormalisation
    pub fn scoreline_grid(&self, lambda_home: f64, lambda_away: f64) -> [[f64; MAX_GOALS + 1]; MAX_GOALS + 1] {
        let home = poisson_masses(lambda_home);
        let away = poisson_masses(lambda_away);
        let mut grid = [[0.0; MAX_GOALS + 1]; MAX_GOALS + 1];
        for (h, row) in grid.iter_mut().enumerate() {
            for (a, cell) in row.iter_mut().enumerate() {
                *cell = home[h] * away[a];
            }
        }
        grid
    }

    /// Most likely scoreline within the grid
    pub fn most_likely_score(&self, lambda_home: f64, lambda_away: f64) -> (u32, u32) {
        let grid = self.scoreline_grid(lambda_home, lambda_away);
        let mut best = (0, 0);
        let mut best_p = f64::NEG_INFINITY;
        for (h, row) in grid.iter().enumerate() {
            for (a, &p) in row.iter().enumerate() {
                if p > best_p {
                    best_p = p;
                    best = (h as u32, a as u32);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: [f64; 9] = [0.0, 0.05, 0.4, 1.0, 1.2, 1.8, 2.7, 4.5, 9.0];

    #[test]
    fn test_known_scenario() {
        let p = ProbabilityEngine::new().outcome_probabilities(1.8, 1.2);
        assert!((p.home - 0.5101038798425134).abs() < 1e-9);
        assert!((p.draw - 0.23415779169430917).abs() < 1e-9);
        assert!((p.away - 0.25573832846317746).abs() < 1e-9);
        // Roughly half home wins, a quarter each for the rest
        assert!((p.home - 0.49).abs() < 0.03);
        assert!((p.draw - 0.24).abs() < 0.03);
        assert!((p.away - 0.27).abs() < 0.03);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let engine = ProbabilityEngine::new();
        for &h in &RATES {
            for &a in &RATES {
                let p = engine.outcome_probabilities(h, a);
                assert!((p.sum() - 1.0).abs() < 1e-6, "sum for ({h}, {a}) = {}", p.sum());
                assert!(p.home >= 0.0 && p.draw >= 0.0 && p.away >= 0.0);
            }
        }
    }

    #[test]
    fn test_swapping_rates_mirrors_outcomes() {
        let engine = ProbabilityEngine::new();
        for &h in &RATES {
            for &a in &RATES {
                let p = engine.outcome_probabilities(h, a);
                let q = engine.outcome_probabilities(a, h);
                assert_eq!(p.home, q.away);
                assert_eq!(p.away, q.home);
                assert_eq!(p.draw, q.draw);
            }
        }
    }

    #[test]
    fn test_zero_rates() {
        let engine = ProbabilityEngine::new();
        let p = engine.outcome_probabilities(0.0, 0.0);
        assert_eq!((p.home, p.draw, p.away), (0.0, 1.0, 0.0));

        let p = engine.outcome_probabilities(0.0, 1.5);
        assert_eq!(p.home, 0.0);
        assert!((p.draw - 0.224128874102609).abs() < 1e-9);
        assert!((p.away - 0.775871125897391).abs() < 1e-9);
    }

    #[test]
    fn test_poisson_masses() {
        let m = poisson_masses(0.0);
        assert_eq!(m[0], 1.0);
        assert!(m[1..].iter().all(|&x| x == 0.0));

        let m = poisson_masses(2.0);
        assert!((m[2] - 2.0 * (-2.0f64).exp()).abs() < 1e-12);
        assert_eq!(poisson_masses(-1.0), poisson_masses(0.0));
    }

    #[test]
    fn test_most_likely_score() {
        let engine = ProbabilityEngine::new();
        assert_eq!(engine.most_likely_score(0.0, 0.0), (0, 0));
        assert_eq!(engine.most_likely_score(2.6, 0.3), (2, 0));
    }
}
