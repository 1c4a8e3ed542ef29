//! Guided calibration: target sequence and the state machine walking it

mod controller;
mod sequence;

pub use controller::{CalibrationController, CalibrationState, StepReport};
pub use sequence::{CalibrationSequence, DEFAULT_TARGETS};
