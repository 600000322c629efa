//! Prediction
//!
//! The two predictor strategies behind one tagged enum, the Poisson outcome
//! engine, model artifacts on disk and the swappable model handle.

pub mod ensemble;
pub mod handle;
pub mod heuristic;
pub mod persistence;
pub mod probability;

pub use ensemble::EnsemblePredictor;
pub use handle::ModelHandle;
pub use heuristic::StrengthHeuristicPredictor;
pub use persistence::{load, save};
pub use probability::ProbabilityEngine;

use serde::{Deserialize, Serialize};

use crate::{FormHint, ModelKind, PredictionResult};

/// A trained predictor of either strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predictor {
    Heuristic(StrengthHeuristicPredictor),
    Ensemble(Box<EnsemblePredictor>),
}

impl Predictor {
    pub fn kind(&self) -> ModelKind {
        match self {
            Predictor::Heuristic(_) => ModelKind::Heuristic,
            Predictor::Ensemble(_) => ModelKind::Ensemble,
        }
    }

    /// Predict a fixture. Never fails: unknown teams get a defined fallback.
    pub fn predict(&self, home: &str, away: &str, hint: Option<FormHint>) -> PredictionResult {
        match self {
            Predictor::Heuristic(model) => model.predict(home, away, hint),
            Predictor::Ensemble(model) => model.predict(home, away, hint),
        }
    }
}

impl From<StrengthHeuristicPredictor> for Predictor {
    fn from(model: StrengthHeuristicPredictor) -> Self {
        Predictor::Heuristic(model)
    }
}

impl From<EnsemblePredictor> for Predictor {
    fn from(model: EnsemblePredictor) -> Self {
        Predictor::Ensemble(Box::new(model))
    }
}
