//! Synthetic landmark producer
//!
//! Generates a MediaPipe-sized face mesh whose iris centres move linearly
//! with the point being looked at. Used by the `simulate` CLI mode and by the
//! integration tests in place of a camera and landmark detector.

use super::frame::{Frame, FrameLandmarks};
use super::FrameSource;
use crate::types::{EyeLandmarkIndices, GazeOutput, Point2, ScreenSize};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Landmarks in a MediaPipe face mesh with refined irises
pub const MESH_POINTS: usize = 478;

const FACE_MIN: Point2 = Point2 { x: 0.3, y: 0.2 };
const FACE_MAX: Point2 = Point2 { x: 0.7, y: 0.8 };
const LEFT_EYE_CENTER: Point2 = Point2 { x: 0.42, y: 0.42 };
const RIGHT_EYE_CENTER: Point2 = Point2 { x: 0.58, y: 0.42 };
const EYE_RADIUS: f64 = 0.025;
/// Iris travel from screen centre to edge
const IRIS_TRAVEL: Point2 = Point2 { x: 0.012, y: 0.008 };

/// A still face whose irises follow a gaze point
#[derive(Debug, Clone)]
pub struct SimulatedFace {
    indices: EyeLandmarkIndices,
}

impl SimulatedFace {
    pub fn new(indices: EyeLandmarkIndices) -> Self {
        Self { indices }
    }

    /// Mesh for a user looking at `gaze` (screen fractions). The last index
    /// of each eye set is treated as the iris centre.
    pub fn mesh_looking_at(&self, gaze: Point2) -> Vec<Point2> {
        let len = self
            .indices
            .left_eye
            .iter()
            .chain(&self.indices.right_eye)
            .map(|&i| i + 1)
            .max()
            .unwrap_or(0)
            .max(MESH_POINTS);

        // face filler on a 20 x 24 grid spanning the face box
        let mut mesh: Vec<Point2> = (0..len)
            .map(|i| {
                let col = (i % 20) as f64 / 19.0;
                let row = ((i / 20) % 24) as f64 / 23.0;
                Point2::new(
                    FACE_MIN.x + col * (FACE_MAX.x - FACE_MIN.x),
                    FACE_MIN.y + row * (FACE_MAX.y - FACE_MIN.y),
                )
            })
            .collect();

        let iris_shift = Point2::new((gaze.x - 0.5) * 2.0 * IRIS_TRAVEL.x, (gaze.y - 0.5) * 2.0 * IRIS_TRAVEL.y);
        place_eye(&mut mesh, &self.indices.left_eye, LEFT_EYE_CENTER, iris_shift);
        place_eye(&mut mesh, &self.indices.right_eye, RIGHT_EYE_CENTER, iris_shift);
        mesh
    }
}

fn place_eye(mesh: &mut [Point2], indices: &[usize], center: Point2, iris_shift: Point2) {
    let Some((&iris, contour)) = indices.split_last() else {
        return;
    };
    let n = contour.len().max(1) as f64;
    for (k, &i) in contour.iter().enumerate() {
        let angle = k as f64 / n * std::f64::consts::TAU;
        mesh[i] = Point2::new(center.x + EYE_RADIUS * angle.cos(), center.y + 0.5 * EYE_RADIUS * angle.sin());
    }
    mesh[iris] = Point2::new(center.x + iris_shift.x, center.y + iris_shift.y);
}

/// Frame source driven by a [`SimulatedFace`].
///
/// While calibrating it fixates whatever target the engine reports; once
/// tracking it wanders smoothly around the screen centre.
pub struct SimulatedSource {
    face: SimulatedFace,
    screen: ScreenSize,
    interval: Duration,
    remaining: Option<usize>,
    gaze: Point2,
    tick: u64,
}

impl SimulatedSource {
    pub fn new(indices: EyeLandmarkIndices, screen: ScreenSize, interval: Duration) -> Self {
        Self {
            face: SimulatedFace::new(indices),
            screen,
            interval,
            remaining: None,
            gaze: Point2::new(0.5, 0.5),
            tick: 0,
        }
    }

    /// Stop after `frames` frames
    pub fn with_frame_limit(mut self, frames: usize) -> Self {
        self.remaining = Some(frames);
        self
    }

    /// Point currently looked at, as screen fractions
    pub fn gaze(&self) -> Point2 {
        self.gaze
    }
}

#[async_trait]
impl FrameSource for SimulatedSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(None);
            }
            *remaining -= 1;
        }
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }

        self.tick += 1;
        Ok(Some(Frame {
            landmarks: FrameLandmarks::Mesh(self.face.mesh_looking_at(self.gaze)),
            screen: Some(self.screen),
        }))
    }

    fn observe(&mut self, output: &GazeOutput) {
        self.gaze = match output.target {
            Some(target) => Point2::new(target.x / self.screen.width, target.y / self.screen.height),
            None => {
                let t = self.tick as f64 / 60.0;
                Point2::new(0.5 + 0.2 * (t * 0.5).sin(), 0.5 + 0.15 * (t * 0.3).cos())
            }
        };
    }
}
