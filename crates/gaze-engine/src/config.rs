//! Engine and driver configuration
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! smoothing_window = 10
//!
//! [calibration]
//! points = 9
//! reset_dwell_on_exit = true
//! ```

use crate::error::Result;
use crate::types::{EyeLandmarkIndices, ScreenSize};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables of the calibration state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// A target is accepted once the dwell counter exceeds this value
    pub dwell_frames: u32,
    /// Acceptance radius as a fraction of screen width
    pub acceptance_radius: f64,
    /// Number of target changes after which calibration ends
    pub points: usize,
    /// Reset the dwell counter when the gaze leaves the acceptance radius
    pub reset_dwell_on_exit: bool,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            dwell_frames: 20,
            acceptance_radius: 0.1,
            points: 25,
            reset_dwell_on_exit: false,
        }
    }
}

/// Configuration for a [`crate::GazeEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of predictions averaged into the output point
    pub smoothing_window: usize,
    /// Most recent samples kept for the target being calibrated
    pub pending_capacity: usize,
    pub calibration: CalibrationSettings,
    pub landmarks: EyeLandmarkIndices,
    /// Custom calibration sequence as `[x, y]` screen fractions
    pub sequence: Option<Vec<[f64; 2]>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 20,
            pending_capacity: 40,
            calibration: CalibrationSettings::default(),
            landmarks: EyeLandmarkIndices::default(),
            sequence: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading engine config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Configuration for the frame driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Screen size used when a frame does not carry its own
    pub screen: ScreenSize,
    /// Pause between frames for sources that do not block (~60Hz)
    pub frame_interval_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            screen: ScreenSize::new(1920.0, 1080.0),
            frame_interval_ms: 16,
        }
    }
}

/// Top-level file layout: engine keys at the root, driver keys under `[driver]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub driver: DriverConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
