//! Model training
//!
//! Seeded data splits, evaluation metrics and the end-to-end pipeline.

pub mod metrics;
pub mod pipeline;
pub mod split;

pub use metrics::{EvaluationReport, HeuristicEvaluation, RegressionMetrics};
pub use pipeline::{train, train_from_records, PredictorKind, TrainingEvaluation, TrainingOutcome};
pub use split::TrainTestSplit;
