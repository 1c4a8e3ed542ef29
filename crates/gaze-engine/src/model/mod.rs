//! Feature → screen coordinate models
//!
//! The calibration controller only talks to a [`GazeModel`], so the
//! regression can be swapped (or replaced by a recording fake in tests).

mod linear;
mod regressor;

pub use linear::LinearModel;
pub use regressor::OnlineRegressor;

use crate::error::Result;
use crate::features::FeatureVector;
use crate::types::Point2;

/// One recorded fixation: features observed while the user looked at `target`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub target: Point2,
}

/// What happened to the fitted state after adding a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Both predictors were refit including the new sample
    Refit,
    /// The solve failed; the previous predictors were kept
    Retained,
}

pub trait GazeModel {
    /// Record a sample for the current target and refit.
    fn add(&mut self, features: &FeatureVector, target: Point2) -> Result<FitOutcome>;

    /// Predict a screen point; the origin while unfit.
    fn predict(&self, features: &FeatureVector) -> Result<Point2>;

    /// Fold the samples of the current target into the committed set.
    fn commit(&mut self);

    /// Drop every sample and return to the unfit state.
    fn reset(&mut self);

    fn is_fitted(&self) -> bool;
}
