//! Shared, swappable model
//!
//! Readers clone an `Arc` of the current predictor and work on that
//! snapshot. A retrain publishes a new `Arc`; in-flight predictions keep the
//! model they started with and never see a half-replaced one.

use std::sync::{Arc, RwLock};

use super::Predictor;
use crate::{FootballError, FormHint, PredictionResult, Result};

#[derive(Debug, Default)]
pub struct ModelHandle {
    inner: RwLock<Option<Arc<Predictor>>>,
}

impl ModelHandle {
    /// Handle with no model yet
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(predictor: Predictor) -> Self {
        ModelHandle {
            inner: RwLock::new(Some(Arc::new(predictor))),
        }
    }

    /// Replace the current model; returns the one it replaced
    pub fn publish(&self, predictor: impl Into<Arc<Predictor>>) -> Option<Arc<Predictor>> {
        let next = predictor.into();
        log::info!("Publishing {} model", next.kind());
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        slot.replace(next)
    }

    /// Snapshot of the current model
    pub fn current(&self) -> Result<Arc<Predictor>> {
        let slot = self.inner.read().unwrap_or_else(|e| e.into_inner());
        slot.clone().ok_or(FootballError::Untrained)
    }

    pub fn is_ready(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn predict(&self, home: &str, away: &str, hint: Option<FormHint>) -> Result<PredictionResult> {
        Ok(self.current()?.predict(home, away, hint))
    }
}
