//! Online regressor trained during calibration
//!
//! Samples are double-buffered: `pending` holds the most recent samples for
//! the target currently being fixated (bounded, oldest dropped first) and
//! `committed` accumulates every completed target. Each new sample triggers
//! a full refit over both sets.

use super::linear::{self, LinearModel};
use super::{FitOutcome, GazeModel, TrainingSample};
use crate::error::{EngineError, Result};
use crate::features::FeatureVector;
use crate::types::Point2;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct OnlineRegressor {
    pending_capacity: usize,
    pending: VecDeque<TrainingSample>,
    committed: Vec<TrainingSample>,
    /// Fixed by the first sample after construction or reset
    dimension: Option<usize>,
    /// (x-predictor, y-predictor)
    fitted: Option<(LinearModel, LinearModel)>,
}

impl OnlineRegressor {
    pub fn new(pending_capacity: usize) -> Self {
        let pending_capacity = pending_capacity.max(1);
        Self {
            pending_capacity,
            pending: VecDeque::with_capacity(pending_capacity + 1),
            committed: Vec::new(),
            dimension: None,
            fitted: None,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn committed_len(&self) -> usize {
        self.committed.len()
    }

    /// Fitted (x, y) predictors, if any
    pub fn models(&self) -> Option<(&LinearModel, &LinearModel)> {
        self.fitted.as_ref().map(|(x, y)| (x, y))
    }

    fn check_dimension(&self, features: &FeatureVector) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != features.len() => Err(EngineError::FeatureDimension {
                expected,
                actual: features.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl Default for OnlineRegressor {
    fn default() -> Self {
        Self::new(40)
    }
}

impl GazeModel for OnlineRegressor {
    fn add(&mut self, features: &FeatureVector, target: Point2) -> Result<FitOutcome> {
        self.check_dimension(features)?;
        if !(target.x.is_finite() && target.y.is_finite()) || features.as_slice().iter().any(|v| !v.is_finite()) {
            log::warn!("Discarding non-finite training sample; keeping previous gaze model");
            return Ok(FitOutcome::Retained);
        }
        let dim = *self.dimension.get_or_insert(features.len());

        self.pending.push_back(TrainingSample {
            features: features.clone(),
            target,
        });
        while self.pending.len() > self.pending_capacity {
            self.pending.pop_front();
        }

        let samples: Vec<&TrainingSample> = self.pending.iter().chain(&self.committed).collect();
        match linear::fit_pair(&samples, dim) {
            Ok(pair) => {
                self.fitted = Some(pair);
                Ok(FitOutcome::Refit)
            }
            Err(e) => {
                log::warn!("Keeping previous gaze model ({} samples): {e}", samples.len());
                Ok(FitOutcome::Retained)
            }
        }
    }

    fn predict(&self, features: &FeatureVector) -> Result<Point2> {
        let Some((mx, my)) = &self.fitted else {
            return Ok(Point2::ORIGIN);
        };
        self.check_dimension(features)?;
        let f = features.as_slice();
        Ok(Point2::new(mx.predict(f), my.predict(f)))
    }

    fn commit(&mut self) {
        self.committed.extend(self.pending.drain(..));
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.committed.clear();
        self.dimension = None;
        self.fitted = None;
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }
}
