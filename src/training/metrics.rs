//! Evaluation metrics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error of a continuous regressor on held-out rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub count: usize,
}

impl RegressionMetrics {
    /// Zero on an empty set
    pub fn from_predictions(actual: &[f64], predicted: &[f64]) -> Self {
        let count = actual.len().min(predicted.len());
        if count == 0 {
            return Self::default();
        }

        let (abs_sum, sq_sum) = actual
            .iter()
            .zip(predicted)
            .fold((0.0, 0.0), |(a, s), (y, p)| {
                let err = y - p;
                (a + err.abs(), s + err * err)
            });

        RegressionMetrics {
            mae: abs_sum / count as f64,
            rmse: (sq_sum / count as f64).sqrt(),
            count,
        }
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MAE {:.3} | RMSE {:.3}", self.mae, self.rmse)
    }
}

/// Share of ordinal predictions within 0.5 of the true label
pub fn thresholded_accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    let count = actual.len().min(predicted.len());
    if count == 0 {
        return 0.0;
    }
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(y, p)| (*y - *p).abs() < 0.5)
        .count();
    correct as f64 / count as f64
}

/// Held-out evaluation of the ensemble
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub train_size: usize,
    pub test_size: usize,
    pub home_goals: RegressionMetrics,
    pub away_goals: RegressionMetrics,
    pub result_accuracy: f64,
}

impl EvaluationReport {
    /// `(1 - (mae_home + mae_away) / 4) * accuracy`
    pub fn overall_score(&self) -> f64 {
        (1.0 - (self.home_goals.mae + self.away_goals.mae) / 4.0) * self.result_accuracy
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Held-out rows: {} (trained on {})", self.test_size, self.train_size)?;
        writeln!(f, "Home goals:    {}", self.home_goals)?;
        writeln!(f, "Away goals:    {}", self.away_goals)?;
        writeln!(f, "Result acc:    {:.2}%", self.result_accuracy * 100.0)?;
        write!(f, "Overall score: {:.3}", self.overall_score())
    }
}

/// Held-out evaluation of the strength heuristic
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeuristicEvaluation {
    pub evaluated: usize,
    /// Held-out matches skipped for lack of home-side history
    pub skipped: usize,
    pub correct_results: usize,
    /// Sum over matches of `|home - FTHG| + |away - FTAG|` for the predicted scoreline
    pub goal_error_total: u64,
}

impl HeuristicEvaluation {
    pub fn accuracy(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.correct_results as f64 / self.evaluated as f64
        }
    }

    /// Mean per-match goal error of the predicted scoreline, both sides summed
    pub fn avg_goal_error(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.goal_error_total as f64 / self.evaluated as f64
        }
    }

    /// Score one held-out match from its predicted and actual scorelines
    pub fn record(&mut self, predicted: (u32, u32), actual: (u32, u32), result_correct: bool) {
        self.evaluated += 1;
        if result_correct {
            self.correct_results += 1;
        }
        let error = predicted.0.abs_diff(actual.0) as u64 + predicted.1.abs_diff(actual.1) as u64;
        self.goal_error_total = self.goal_error_total.saturating_add(error);
    }
}

impl fmt::Display for HeuristicEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Evaluated {} (skipped {}) | Acc: {:.2}% | Avg goal error: {:.3}",
            self.evaluated,
            self.skipped,
            self.accuracy() * 100.0,
            self.avg_goal_error()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regression_metrics() {
        let m = RegressionMetrics::from_predictions(&[1.0, 2.0, 0.0, 3.0], &[2.0, 2.0, 0.0, 1.0]);
        assert_eq!(m.count, 4);
        assert_eq!(m.mae, 0.75);
        assert!((m.rmse - (5.0f64 / 4.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = RegressionMetrics::from_predictions(&[], &[]);
        assert_eq!(m, RegressionMetrics::default());
        assert_eq!(thresholded_accuracy(&[], &[]), 0.0);
        assert_eq!(HeuristicEvaluation::default().accuracy(), 0.0);
    }

    #[test]
    fn test_thresholded_accuracy() {
        let actual = [2.0, 1.0, 0.0, 1.0];
        let predicted = [1.6, 1.49, 0.5, 0.2];
        // 0.4 and 0.49 are within; 0.5 and 0.8 are not
        assert_eq!(thresholded_accuracy(&actual, &predicted), 0.5);
    }

    #[test]
    fn test_overall_score() {
        let report = EvaluationReport {
            train_size: 80,
            test_size: 20,
            home_goals: RegressionMetrics {
                mae: 1.0,
                rmse: 1.2,
                count: 20,
            },
            away_goals: RegressionMetrics {
                mae: 0.6,
                rmse: 0.8,
                count: 20,
            },
            result_accuracy: 0.5,
        };
        assert!((report.overall_score() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_heuristic_evaluation() {
        let mut eval = HeuristicEvaluation {
            skipped: 1,
            ..Default::default()
        };
        eval.record((2, 1), (2, 1), true);
        eval.record((1, 0), (3, 0), true);
        eval.record((1, 1), (0, 2), false);
        eval.record((0, 2), (1, 3), true);

        assert_eq!(eval.evaluated, 4);
        assert_eq!(eval.correct_results, 3);
        assert_eq!(eval.accuracy(), 0.75);
        // 0 + 2 + 2 + 2 goals off over four matches
        assert_eq!(eval.goal_error_total, 6);
        assert_eq!(eval.avg_goal_error(), 1.5);
    }
}
