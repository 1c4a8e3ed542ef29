//! Core data types for the gaze engine

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A 2-D point. Used for landmarks (camera-normalized) and gaze
/// predictions (screen pixels) alike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const ORIGIN: Point2 = Point2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`
    pub fn distance(&self, other: Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Screen dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl ScreenSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0 {
            Ok(())
        } else {
            Err(EngineError::InvalidScreen {
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Axis-aligned bounding box of a set of landmarks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Smallest box enclosing every point, `None` for an empty slice.
    pub fn enclosing(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn origin(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// True when either side has no extent (or is not a number)
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Indices of the eye landmarks inside a full face mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarkIndices {
    pub left_eye: Vec<usize>,
    pub right_eye: Vec<usize>,
}

impl Default for EyeLandmarkIndices {
    /// MediaPipe face-mesh contour points plus the iris centre (468 / 473).
    /// The repeated indices (153, 374) are part of the trained layout.
    fn default() -> Self {
        Self {
            left_eye: vec![33, 133, 160, 159, 158, 157, 173, 155, 154, 153, 144, 145, 153, 246, 468],
            right_eye: vec![362, 263, 387, 386, 385, 384, 398, 382, 381, 380, 374, 373, 374, 466, 473],
        }
    }
}

/// Landmarks for one frame, as consumed by the feature extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub left_eye: Vec<Point2>,
    pub right_eye: Vec<Point2>,
    /// Bounding box over the whole face, not just the eyes
    pub bounds: BoundingBox,
}

impl FaceLandmarks {
    /// Select the eye landmarks out of a full face mesh.
    pub fn from_mesh(mesh: &[Point2], indices: &EyeLandmarkIndices) -> Result<Self> {
        let pick = |idx: &[usize]| -> Result<Vec<Point2>> {
            idx.iter()
                .map(|&i| {
                    mesh.get(i).copied().ok_or(EngineError::MeshIndex {
                        index: i,
                        len: mesh.len(),
                    })
                })
                .collect()
        };

        let left_eye = pick(&indices.left_eye)?;
        let right_eye = pick(&indices.right_eye)?;
        let bounds = BoundingBox::enclosing(mesh).ok_or(EngineError::DegenerateGeometry)?;

        Ok(Self {
            left_eye,
            right_eye,
            bounds,
        })
    }
}

/// A calibration point as fractions (0..=1) of screen width/height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    pub x: f64,
    pub y: f64,
}

impl CalibrationTarget {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Resolve to pixels against the current screen
    pub fn to_pixels(&self, screen: ScreenSize) -> Point2 {
        Point2::new(self.x * screen.width, self.y * screen.height)
    }
}

impl From<[f64; 2]> for CalibrationTarget {
    fn from(p: [f64; 2]) -> Self {
        Self::new(p[0], p[1])
    }
}

/// Per-frame engine output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeOutput {
    /// Smoothed gaze point in screen pixels
    pub point: Point2,
    /// Unsmoothed model prediction for this frame
    pub raw: Point2,
    /// Whether this frame was processed in calibration mode
    pub calibrating: bool,
    /// Current calibration target in pixels, `None` once tracking
    pub target: Option<Point2>,
    /// Whether a consumer should draw the gaze cursor
    pub cursor_visible: bool,
}

/// Events delivered to output consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Gaze(GazeOutput),
    /// Emitted once on the first frame after calibration finished
    CalibrationComplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_box_and_degenerate() {
        let pts = [Point2::new(0.3, 0.5), Point2::new(0.7, 0.2), Point2::new(0.5, 0.8)];
        let b = BoundingBox::enclosing(&pts).expect("box");
        assert_eq!(b.origin(), Point2::new(0.3, 0.2));
        assert!((b.width - 0.4).abs() < 1e-12);
        assert!((b.height - 0.6).abs() < 1e-12);
        assert!(!b.is_degenerate());

        assert!(BoundingBox::enclosing(&[]).is_none());
        let flat = BoundingBox::enclosing(&[Point2::new(0.5, 0.1), Point2::new(0.5, 0.9)]).expect("box");
        assert!(flat.is_degenerate());
    }

    #[test]
    fn from_mesh_picks_indices_and_bounds_whole_mesh() {
        let mesh: Vec<Point2> = (0..6).map(|i| Point2::new(i as f64 * 0.1, 1.0 - i as f64 * 0.1)).collect();
        let indices = EyeLandmarkIndices {
            left_eye: vec![1, 2],
            right_eye: vec![4, 4],
        };

        let face = FaceLandmarks::from_mesh(&mesh, &indices).expect("face");
        assert_eq!(face.left_eye, vec![mesh[1], mesh[2]]);
        assert_eq!(face.right_eye, vec![mesh[4], mesh[4]]);
        assert_eq!(face.bounds.origin(), Point2::new(0.0, mesh[5].y));

        let short = FaceLandmarks::from_mesh(&mesh[..4], &indices);
        assert!(matches!(short, Err(EngineError::MeshIndex { index: 4, len: 4 })));
        let empty = FaceLandmarks::from_mesh(&[], &EyeLandmarkIndices { left_eye: vec![], right_eye: vec![] });
        assert!(matches!(empty, Err(EngineError::DegenerateGeometry)));
    }

    #[test]
    fn screen_validation() {
        assert!(ScreenSize::new(1920.0, 1080.0).validate().is_ok());
        assert!(ScreenSize::new(0.0, 1080.0).validate().is_err());
        assert!(ScreenSize::new(1920.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn events_serialize_with_tag() {
        let out = GazeOutput {
            point: Point2::new(10.0, 20.0),
            raw: Point2::new(11.0, 19.0),
            calibrating: false,
            target: None,
            cursor_visible: true,
        };
        let gaze = serde_json::to_value(EngineEvent::Gaze(out)).expect("json");
        assert_eq!(gaze["event"], "gaze");
        assert_eq!(gaze["point"]["x"], 10.0);
        assert!(gaze["target"].is_null());

        let done = serde_json::to_string(&EngineEvent::CalibrationComplete).expect("json");
        assert_eq!(done, r#"{"event":"calibration_complete"}"#);
    }

    #[test]
    fn default_indices_have_fifteen_points_per_eye() {
        let idx = EyeLandmarkIndices::default();
        assert_eq!(idx.left_eye.len(), 15);
        assert_eq!(idx.right_eye.len(), 15);
        assert_eq!(idx.left_eye.last(), Some(&468));
        assert_eq!(idx.right_eye.last(), Some(&473));
    }
}
