//! Landmark → feature vector conversion
//!
//! Eye landmarks are normalized to the face bounding box and multiplied by a
//! per-axis scale relative to the face size seen on the first usable frame,
//! so moving closer to or further from the camera shows up in the features
//! instead of being normalized away. The vector ends with the two scale
//! factors, the raw box size and the head offset from its starting position.
//!
//! Layout (pairs flattened as `x, y`):
//!
//! ```text
//! [left eye points..] [right eye points..] [scale] [box size] [head offset]
//! ```

use crate::error::{EngineError, Result};
use crate::types::{FaceLandmarks, Point2};

/// Normalized feature vector consumed by the regression model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Number of trailing 2-D entries appended after the eye points
const EXTRA_ENTRIES: usize = 3;

/// Stateful extractor; holds the session baselines captured on the first
/// usable frame.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    left_len: usize,
    right_len: usize,
    /// Face box width/height of the first usable frame
    baseline: Option<(f64, f64)>,
    /// Scaled head position of the first usable frame
    head_origin: Option<Point2>,
}

impl FeatureExtractor {
    pub fn new(left_len: usize, right_len: usize) -> Self {
        Self {
            left_len,
            right_len,
            baseline: None,
            head_origin: None,
        }
    }

    /// Length of every vector this extractor produces
    pub fn dimension(&self) -> usize {
        2 * (self.left_len + self.right_len + EXTRA_ENTRIES)
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    /// Forget the session baselines; the next frame becomes the reference.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.head_origin = None;
    }

    /// Build the feature vector for one frame.
    ///
    /// Returns [`EngineError::DegenerateGeometry`] without touching any
    /// state when the face box has no extent, a coordinate is not finite or
    /// the normalized values overflow.
    pub fn extract(&mut self, face: &FaceLandmarks) -> Result<FeatureVector> {
        check_count("left eye", self.left_len, face.left_eye.len())?;
        check_count("right eye", self.right_len, face.right_eye.len())?;

        let bounds = face.bounds;
        let finite = |p: &Point2| p.x.is_finite() && p.y.is_finite();
        if bounds.is_degenerate()
            || !(bounds.width.is_finite() && bounds.height.is_finite())
            || !finite(&bounds.origin())
            || !face.left_eye.iter().chain(&face.right_eye).all(finite)
        {
            return Err(EngineError::DegenerateGeometry);
        }

        let (start_width, start_height) = self.baseline.unwrap_or((bounds.width, bounds.height));
        let scale_x = bounds.width / start_width;
        let scale_y = bounds.height / start_height;

        let head = Point2::new(bounds.x * scale_x, bounds.y * scale_x);
        let head_origin = self.head_origin.unwrap_or(head);

        let mut values = Vec::with_capacity(self.dimension());
        for p in face.left_eye.iter().chain(&face.right_eye) {
            values.push((p.x - bounds.x) / bounds.width * scale_x);
            values.push((p.y - bounds.y) / bounds.height * scale_y);
        }
        values.extend_from_slice(&[
            scale_x,
            scale_y,
            bounds.width,
            bounds.height,
            head.x - head_origin.x,
            head.y - head_origin.y,
        ]);
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::DegenerateGeometry);
        }

        self.baseline.get_or_insert((start_width, start_height));
        self.head_origin.get_or_insert(head_origin);
        Ok(FeatureVector(values))
    }
}

fn check_count(region: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(EngineError::LandmarkCount {
            region,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn face(bounds: BoundingBox, left: Vec<Point2>, right: Vec<Point2>) -> FaceLandmarks {
        FaceLandmarks {
            left_eye: left,
            right_eye: right,
            bounds,
        }
    }

    fn unit_box(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h }
    }

    #[test]
    fn first_frame_is_its_own_reference() {
        let mut ex = FeatureExtractor::new(1, 1);
        let f = ex
            .extract(&face(
                unit_box(0.2, 0.4, 0.5, 0.25),
                vec![Point2::new(0.45, 0.5)],
                vec![Point2::new(0.7, 0.65)],
            ))
            .expect("features");

        let v = f.as_slice();
        assert_eq!(v.len(), ex.dimension());
        assert!((v[0] - 0.5).abs() < 1e-12);
        assert!((v[1] - 0.4).abs() < 1e-12);
        assert!((v[2] - 1.0).abs() < 1e-12);
        assert!((v[3] - 1.0).abs() < 1e-12);
        // scale factors
        assert!((v[4] - 1.0).abs() < 1e-12);
        assert!((v[5] - 1.0).abs() < 1e-12);
        // box size
        assert!((v[6] - 0.5).abs() < 1e-12);
        assert!((v[7] - 0.25).abs() < 1e-12);
        // head offset
        assert_eq!(&v[8..10], &[0.0, 0.0]);
    }

    #[test]
    fn later_frames_scale_against_baseline() {
        let mut ex = FeatureExtractor::new(1, 1);
        let eye = vec![Point2::new(0.3, 0.3)];
        ex.extract(&face(unit_box(0.2, 0.2, 0.4, 0.4), eye.clone(), eye.clone()))
            .expect("baseline");

        // face doubled in width only and moved right
        let f = ex
            .extract(&face(unit_box(0.3, 0.2, 0.8, 0.4), vec![Point2::new(0.7, 0.4)], vec![Point2::new(0.3, 0.2)]))
            .expect("features");
        let v = f.as_slice();

        assert!((v[0] - 1.0).abs() < 1e-12); // (0.7-0.3)/0.8 * 2
        assert!((v[1] - 0.5).abs() < 1e-12); // (0.4-0.2)/0.4 * 1
        assert!((v[4] - 2.0).abs() < 1e-12);
        assert!((v[5] - 1.0).abs() < 1e-12);
        // head = (0.3*2, 0.2*2) - (0.2, 0.2)
        assert!((v[8] - 0.4).abs() < 1e-12);
        assert!((v[9] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn degenerate_box_leaves_state_untouched() {
        let mut ex = FeatureExtractor::new(1, 1);
        let eye = vec![Point2::new(0.3, 0.3)];
        let err = ex
            .extract(&face(unit_box(0.3, 0.3, 0.0, 0.2), eye.clone(), eye.clone()))
            .unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry));
        assert!(!ex.has_baseline());

        ex.extract(&face(unit_box(0.2, 0.2, 0.4, 0.4), eye.clone(), eye))
            .expect("first usable frame");
        assert!(ex.has_baseline());
    }

    #[test]
    fn non_finite_landmark_is_degenerate() {
        let mut ex = FeatureExtractor::new(1, 1);
        let err = ex
            .extract(&face(
                unit_box(0.2, 0.2, 0.4, 0.4),
                vec![Point2::new(f64::NAN, 0.3)],
                vec![Point2::new(0.3, 0.3)],
            ))
            .unwrap_err();
        assert!(matches!(err, EngineError::DegenerateGeometry));
        assert!(!ex.has_baseline());
    }

    #[test]
    fn infinite_or_overflowing_geometry_is_degenerate() {
        let mut ex = FeatureExtractor::new(1, 1);
        let eye = vec![Point2::new(0.3, 0.3)];

        let wide = face(unit_box(0.2, 0.2, f64::INFINITY, 0.4), eye.clone(), eye.clone());
        assert!(matches!(ex.extract(&wide), Err(EngineError::DegenerateGeometry)));

        // a mesh spanning +-1e308 has an infinite box
        let mesh = [Point2::new(-1e308, -1e308), Point2::new(1e308, 1e308), Point2::new(0.3, 0.3)];
        let huge = BoundingBox::enclosing(&mesh).expect("box");
        assert!(matches!(
            ex.extract(&face(huge, eye.clone(), eye.clone())),
            Err(EngineError::DegenerateGeometry)
        ));
        assert!(!ex.has_baseline());

        // finite inputs whose normalized values overflow
        ex.extract(&face(unit_box(0.2, 0.2, 0.4, 0.4), eye.clone(), eye.clone()))
            .expect("baseline");
        let tiny = face(unit_box(0.0, 0.0, 1e-310, 1e-310), vec![Point2::new(0.5, 0.5)], eye);
        assert!(matches!(ex.extract(&tiny), Err(EngineError::DegenerateGeometry)));
        assert_eq!(ex.baseline, Some((0.4, 0.4)));
    }

    #[test]
    fn wrong_landmark_count_is_rejected() {
        let mut ex = FeatureExtractor::new(2, 1);
        let err = ex
            .extract(&face(unit_box(0.0, 0.0, 1.0, 1.0), vec![Point2::ORIGIN], vec![Point2::ORIGIN]))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::LandmarkCount { region: "left eye", expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn dimension_matches_default_eye_sets() {
        let ex = FeatureExtractor::new(15, 15);
        assert_eq!(ex.dimension(), 66);
    }
}
