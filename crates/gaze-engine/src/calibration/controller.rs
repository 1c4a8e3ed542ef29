//! Calibration state machine
//!
//! While calibrating, every frame trains the model on the current target.
//! When the smoothed gaze stays inside the acceptance radius for more than
//! `dwell_frames` frames, the pending samples are committed and the sequence
//! advances. Each change of target counts as one completed point; after
//! `points` of them the controller switches to tracking for good (until an
//! explicit recalibration).

use super::CalibrationSequence;
use crate::config::CalibrationSettings;
use crate::error::Result;
use crate::features::FeatureVector;
use crate::model::{FitOutcome, GazeModel};
use crate::types::{CalibrationTarget, Point2, ScreenSize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationState {
    /// Not started, or stopped
    Idle,
    Calibrating {
        /// Frames spent inside the acceptance radius for the current target
        dwell: u32,
        /// Target seen on the previous frame
        last_target: Option<CalibrationTarget>,
    },
    Tracking,
}

/// What the controller did with one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// The frame was processed in calibration mode
    pub calibrating: bool,
    /// Target in pixels for this frame, `None` outside calibration
    pub target: Option<Point2>,
    /// The current target was accepted and the sequence advanced
    pub accepted: bool,
    /// This frame completed the calibration
    pub finished: bool,
}

impl StepReport {
    fn passive() -> Self {
        Self {
            calibrating: false,
            target: None,
            accepted: false,
            finished: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalibrationController {
    settings: CalibrationSettings,
    sequence: CalibrationSequence,
    state: CalibrationState,
    completed: usize,
}

impl CalibrationController {
    pub fn new(settings: CalibrationSettings, sequence: CalibrationSequence) -> Self {
        Self {
            settings,
            sequence,
            state: CalibrationState::Idle,
            completed: 0,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.state, CalibrationState::Calibrating { .. })
    }

    /// Index of the current target in the sequence
    pub fn target_index(&self) -> usize {
        self.sequence.index()
    }

    /// Target changes counted since calibration (re)started
    pub fn completed_points(&self) -> usize {
        self.completed
    }

    pub fn sequence(&self) -> &CalibrationSequence {
        &self.sequence
    }

    /// Start calibrating from the first target.
    pub fn begin(&mut self) {
        self.sequence.rewind();
        self.completed = 0;
        self.state = CalibrationState::Calibrating {
            dwell: 0,
            last_target: None,
        };
    }

    /// Drop all training data and calibrate again from the first target.
    pub fn recalibrate<M: GazeModel>(&mut self, model: &mut M) {
        model.reset();
        self.begin();
    }

    /// Return to idle; the sequence is rewound.
    pub fn halt(&mut self) {
        self.sequence.rewind();
        self.completed = 0;
        self.state = CalibrationState::Idle;
    }

    /// Replace the target sequence. An ongoing calibration restarts at the
    /// first target of the new sequence.
    pub fn set_sequence(&mut self, sequence: CalibrationSequence) {
        self.sequence = sequence;
        if self.is_calibrating() {
            self.begin();
        }
    }

    /// Process one frame.
    ///
    /// `gaze` is the smoothed prediction made before this frame's sample is
    /// added to the model.
    pub fn step<M: GazeModel>(
        &mut self,
        model: &mut M,
        features: &FeatureVector,
        gaze: Point2,
        screen: ScreenSize,
    ) -> Result<StepReport> {
        let CalibrationState::Calibrating {
            mut dwell,
            mut last_target,
        } = self.state
        else {
            return Ok(StepReport::passive());
        };

        let target = self.sequence.current_target(screen);
        if model.add(features, target)? == FitOutcome::Retained {
            log::debug!("Sample for target {} did not refit the model", self.sequence.index());
        }

        let radius = self.settings.acceptance_radius * screen.width;
        let mut accepted = false;
        if gaze.distance(target) < radius {
            if dwell > self.settings.dwell_frames {
                model.commit();
                self.sequence.advance();
                dwell = 0;
                accepted = true;
                log::debug!(
                    "Calibration target accepted, moving to index {}",
                    self.sequence.index()
                );
            } else {
                dwell += 1;
            }
        } else if self.settings.reset_dwell_on_exit {
            dwell = 0;
        }

        let now = self.sequence.current();
        if last_target.is_some_and(|last| last != now) {
            self.completed += 1;
        }
        last_target = Some(now);

        let finished = self.completed >= self.settings.points;
        self.state = if finished {
            log::info!("Calibration complete after {} points", self.completed);
            CalibrationState::Tracking
        } else {
            CalibrationState::Calibrating { dwell, last_target }
        };

        Ok(StepReport {
            calibrating: true,
            target: Some(target),
            accepted,
            finished,
        })
    }
}
