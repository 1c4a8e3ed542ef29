//! Frame wire format
//!
//! One JSON object per line (or per datagram). Either a full face mesh:
//!
//! ```json
//! {"mesh": [[0.41, 0.38], [0.43, 0.37], ...], "width": 1920, "height": 1080}
//! ```
//!
//! or pre-selected eye landmarks with the face bounding box:
//!
//! ```json
//! {"left_eye": [...], "right_eye": [...],
//!  "bounds": {"x": 0.3, "y": 0.2, "width": 0.4, "height": 0.6}}
//! ```
//!
//! Points may be `[x, y]` pairs or `{"x": .., "y": .., "z": ..}` objects as
//! emitted by MediaPipe (`z` is ignored). Screen size is optional.

use crate::error::Result;
use crate::types::{BoundingBox, FaceLandmarks, Point2, ScreenSize};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum FrameLandmarks {
    /// Whole face mesh; eyes are picked by the engine's index sets
    Mesh(Vec<Point2>),
    Eyes(FaceLandmarks),
}

/// One unit of input for the engine
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub landmarks: FrameLandmarks,
    /// Screen size at capture time, if the producer knows it
    pub screen: Option<ScreenSize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl From<WirePoint> for Point2 {
    fn from(p: WirePoint) -> Self {
        match p {
            WirePoint::Pair([x, y]) => Point2::new(x, y),
            WirePoint::Object { x, y } => Point2::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireLandmarks {
    Mesh {
        mesh: Vec<WirePoint>,
    },
    Eyes {
        left_eye: Vec<WirePoint>,
        right_eye: Vec<WirePoint>,
        bounds: BoundingBox,
    },
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(flatten)]
    landmarks: WireLandmarks,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

fn points(raw: Vec<WirePoint>) -> Vec<Point2> {
    raw.into_iter().map(Point2::from).collect()
}

/// Parse one frame message. Blank input yields `Ok(None)`.
pub fn parse_frame_message(msg: &str) -> Result<Option<Frame>> {
    let msg = msg.trim();
    if msg.is_empty() {
        return Ok(None);
    }

    let wire: WireFrame = serde_json::from_str(msg)?;
    let landmarks = match wire.landmarks {
        WireLandmarks::Mesh { mesh } => FrameLandmarks::Mesh(points(mesh)),
        WireLandmarks::Eyes {
            left_eye,
            right_eye,
            bounds,
        } => FrameLandmarks::Eyes(FaceLandmarks {
            left_eye: points(left_eye),
            right_eye: points(right_eye),
            bounds,
        }),
    };
    let screen = match (wire.width, wire.height) {
        (Some(w), Some(h)) => Some(ScreenSize::new(w, h)),
        _ => None,
    };

    Ok(Some(Frame { landmarks, screen }))
}
