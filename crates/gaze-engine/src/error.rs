//! Error types for the gaze engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Face bounding box has zero width or height
    #[error("degenerate face geometry: bounding box has no extent")]
    DegenerateGeometry,

    #[error("{region} has {actual} landmarks, expected {expected}")]
    LandmarkCount {
        region: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("feature vector has {actual} entries, model was trained on {expected}")]
    FeatureDimension { expected: usize, actual: usize },

    #[error("linear solve failed: design matrix is singular")]
    SingularFit,

    #[error("invalid screen size {width}x{height}")]
    InvalidScreen { width: f64, height: f64 },

    #[error("calibration sequence is empty")]
    EmptySequence,

    #[error("calibration target {index} ({x}, {y}) is outside the unit square")]
    InvalidTarget { index: usize, x: f64, y: f64 },

    #[error("calibration target {index} repeats its predecessor")]
    RepeatedTarget { index: usize },

    #[error("landmark index {index} out of range for mesh of {len} points")]
    MeshIndex { index: usize, len: usize },

    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
