//! Ordered, cyclic list of calibration targets

use crate::error::{EngineError, Result};
use crate::types::{CalibrationTarget, Point2, ScreenSize};

const fn t(x: f64, y: f64) -> CalibrationTarget {
    CalibrationTarget::new(x, y)
}

/// Default 25-point layout: a 5x5 grid of quarter-screen steps visited in a
/// scattered order so consecutive targets are far apart.
pub const DEFAULT_TARGETS: [CalibrationTarget; 25] = [
    t(0.25, 0.25), t(0.5, 0.75), t(1.0, 0.5), t(0.75, 0.5), t(0.0, 0.75),
    t(0.5, 0.5), t(1.0, 0.25), t(0.75, 0.0), t(0.25, 0.5), t(0.5, 0.0),
    t(0.0, 0.5), t(1.0, 1.0), t(0.75, 1.0), t(0.25, 0.0), t(1.0, 0.0),
    t(0.0, 1.0), t(0.25, 1.0), t(0.75, 0.75), t(0.5, 0.25), t(0.0, 0.25),
    t(1.0, 0.5), t(0.75, 0.25), t(0.5, 1.0), t(0.25, 0.75), t(0.0, 0.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSequence {
    targets: Vec<CalibrationTarget>,
    cursor: usize,
}

impl CalibrationSequence {
    /// Validate and wrap a list of targets.
    ///
    /// Every target must lie in the unit square and differ from its cyclic
    /// successor, otherwise advancing would not register as a target change.
    pub fn new(targets: Vec<CalibrationTarget>) -> Result<Self> {
        if targets.is_empty() {
            return Err(EngineError::EmptySequence);
        }
        for (index, target) in targets.iter().enumerate() {
            let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
            if !(in_range(target.x) && in_range(target.y)) {
                return Err(EngineError::InvalidTarget {
                    index,
                    x: target.x,
                    y: target.y,
                });
            }
        }
        for index in 0..targets.len() {
            let next = (index + 1) % targets.len();
            if targets[index] == targets[next] {
                return Err(EngineError::RepeatedTarget { index: next });
            }
        }

        Ok(Self { targets, cursor: 0 })
    }

    /// Current target as screen fractions
    pub fn current(&self) -> CalibrationTarget {
        self.targets[self.cursor]
    }

    /// Current target resolved to pixels
    pub fn current_target(&self, screen: ScreenSize) -> Point2 {
        self.current().to_pixels(screen)
    }

    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.targets.len();
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn targets(&self) -> &[CalibrationTarget] {
        &self.targets
    }
}

impl Default for CalibrationSequence {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS.to_vec(),
            cursor: 0,
        }
    }
}
