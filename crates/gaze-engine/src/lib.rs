//! # Gaze Engine
//!
//! Turns a stream of facial landmarks into an on-screen gaze point.
//!
//! Per frame: landmarks → [`FeatureExtractor`] → [`OnlineRegressor`] prediction
//! → [`GazeSmoother`] → [`CalibrationController`], which trains the model on
//! the current calibration target until the user has dwelt on enough of them.
//! Consumers only ever see a [`GazeOutput`]: a pixel position plus a flag
//! telling whether calibration is still running.
//!
//! The engine is synchronous and owns all of its state; one driver calls
//! [`GazeEngine::process_frame`] once per video frame.
//!
//! ```rust,no_run
//! use gaze_engine::{EngineConfig, GazeEngine, ScreenSize};
//! # fn landmarks() -> gaze_engine::FaceLandmarks { unimplemented!() }
//!
//! let mut engine = GazeEngine::new(EngineConfig::default())?;
//! engine.start();
//!
//! let screen = ScreenSize::new(1920.0, 1080.0);
//! if let Some(out) = engine.process_frame(&landmarks(), screen)? {
//!     println!("gaze at ({:.0}, {:.0}) calibrating={}", out.point.x, out.point.y, out.calibrating);
//! }
//! # Ok::<(), gaze_engine::EngineError>(())
//! ```

pub mod calibration;
pub mod config;
pub mod driver;
pub mod error;
pub mod features;
pub mod model;
pub mod smoothing;
pub mod types;

pub use calibration::{CalibrationController, CalibrationSequence, CalibrationState};
pub use config::{AppConfig, CalibrationSettings, DriverConfig, EngineConfig};
pub use error::{EngineError, Result};
pub use features::{FeatureExtractor, FeatureVector};
pub use model::{FitOutcome, GazeModel, OnlineRegressor};
pub use smoothing::GazeSmoother;
pub use types::*;

/// The engine coordinator: owns the extractor, model, smoother and
/// calibration state machine of one session.
pub struct GazeEngine<M: GazeModel = OnlineRegressor> {
    landmarks: EyeLandmarkIndices,
    extractor: FeatureExtractor,
    model: M,
    smoother: GazeSmoother,
    controller: CalibrationController,
    running: bool,
    visible: bool,
    last_output: Option<GazeOutput>,
}

impl GazeEngine<OnlineRegressor> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let model = OnlineRegressor::new(config.pending_capacity);
        Self::with_model(config, model)
    }
}

impl<M: GazeModel> GazeEngine<M> {
    /// Build an engine around a custom model.
    pub fn with_model(config: EngineConfig, model: M) -> Result<Self> {
        let sequence = match &config.sequence {
            Some(points) => CalibrationSequence::new(points.iter().copied().map(CalibrationTarget::from).collect())?,
            None => CalibrationSequence::default(),
        };

        log::info!(
            "Gaze engine configured: {} calibration targets, {} points to complete, smoothing over {} frames",
            sequence.len(),
            config.calibration.points,
            config.smoothing_window
        );

        Ok(Self {
            extractor: FeatureExtractor::new(config.landmarks.left_eye.len(), config.landmarks.right_eye.len()),
            landmarks: config.landmarks,
            model,
            smoother: GazeSmoother::new(config.smoothing_window),
            controller: CalibrationController::new(config.calibration, sequence),
            running: false,
            visible: true,
            last_output: None,
        })
    }

    /// Begin a session. Calibration starts immediately.
    pub fn start(&mut self) {
        if self.running {
            log::debug!("Gaze engine already running");
            return;
        }
        log::info!("Starting gaze engine, calibrating...");
        self.running = true;
        self.controller.begin();
    }

    /// End the session. The trained model and all session baselines are
    /// discarded; frames are ignored until the next [`start`](Self::start).
    pub fn stop(&mut self) {
        log::info!("Stopping gaze engine");
        self.running = false;
        self.model.reset();
        self.smoother.clear();
        self.extractor.reset();
        self.controller.halt();
        self.last_output = None;
    }

    /// Throw away the training data and calibrate again from the first target.
    /// Ignored while stopped; [`start`](Self::start) always calibrates afresh.
    pub fn recalibrate(&mut self) {
        if !self.running {
            log::debug!("Ignoring recalibrate on a stopped gaze engine");
            return;
        }
        log::info!("Recalibrating gaze engine");
        self.controller.recalibrate(&mut self.model);
    }

    /// Show or hide the gaze cursor. Only reported to consumers.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Replace the calibration targets (screen fractions).
    pub fn set_calibration_sequence(&mut self, targets: Vec<CalibrationTarget>) -> Result<()> {
        let sequence = CalibrationSequence::new(targets)?;
        log::info!("Calibration sequence replaced ({} targets)", sequence.len());
        self.controller.set_sequence(sequence);
        Ok(())
    }

    /// Process one frame of landmarks.
    ///
    /// Returns `Ok(None)` while stopped. A frame with degenerate geometry is
    /// skipped and the previous output is returned again.
    pub fn process_frame(&mut self, face: &FaceLandmarks, screen: ScreenSize) -> Result<Option<GazeOutput>> {
        if !self.running {
            return Ok(None);
        }
        screen.validate()?;

        let features = match self.extractor.extract(face) {
            Ok(f) => f,
            Err(EngineError::DegenerateGeometry) => {
                log::debug!("Skipping frame with degenerate face geometry");
                return Ok(self.last_output);
            }
            Err(e) => return Err(e),
        };

        let raw = self.model.predict(&features)?;
        self.smoother.push(raw);
        let point = self.smoother.current();

        let report = self.controller.step(&mut self.model, &features, point, screen)?;

        let output = GazeOutput {
            point,
            raw,
            calibrating: report.calibrating,
            target: report.target,
            cursor_visible: self.visible,
        };
        self.last_output = Some(output);
        Ok(Some(output))
    }

    /// Process a full face mesh, selecting the eyes by the configured indices.
    pub fn process_mesh(&mut self, mesh: &[Point2], screen: ScreenSize) -> Result<Option<GazeOutput>> {
        if !self.running {
            return Ok(None);
        }
        match FaceLandmarks::from_mesh(mesh, &self.landmarks) {
            Ok(face) => self.process_frame(&face, screen),
            Err(EngineError::DegenerateGeometry) => Ok(self.last_output),
            Err(e) => Err(e),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_calibrating(&self) -> bool {
        self.controller.is_calibrating()
    }

    pub fn state(&self) -> CalibrationState {
        self.controller.state()
    }

    /// Current calibration target in pixels, while calibrating
    pub fn current_target(&self, screen: ScreenSize) -> Option<Point2> {
        self.is_calibrating()
            .then(|| self.controller.sequence().current_target(screen))
    }

    pub fn landmark_indices(&self) -> &EyeLandmarkIndices {
        &self.landmarks
    }

    pub fn controller(&self) -> &CalibrationController {
        &self.controller
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn last_output(&self) -> Option<GazeOutput> {
        self.last_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> EngineConfig {
        EngineConfig {
            landmarks: EyeLandmarkIndices {
                left_eye: vec![0, 1],
                right_eye: vec![2, 3],
            },
            ..EngineConfig::default()
        }
    }

    fn mesh(shift: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.40 + shift, 0.40),
            Point2::new(0.45, 0.41),
            Point2::new(0.55 + shift, 0.40),
            Point2::new(0.60, 0.41),
            Point2::new(0.30, 0.20),
            Point2::new(0.70, 0.80),
        ]
    }

    #[test]
    fn stopped_engine_ignores_frames() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        let out = engine
            .process_mesh(&mesh(0.0), ScreenSize::new(1000.0, 1000.0))
            .expect("frame");
        assert!(out.is_none());
        assert_eq!(engine.state(), CalibrationState::Idle);
    }

    #[test]
    fn first_frame_predicts_origin_and_calibrates() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let screen = ScreenSize::new(1000.0, 1000.0);

        let out = engine.process_mesh(&mesh(0.0), screen).expect("frame").expect("output");
        assert_eq!(out.raw, Point2::ORIGIN);
        assert_eq!(out.point, Point2::ORIGIN);
        assert!(out.calibrating);
        assert_eq!(out.target, Some(Point2::new(250.0, 250.0)));
        assert!(engine.model().is_fitted());
    }

    #[test]
    fn degenerate_frame_repeats_previous_output() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let screen = ScreenSize::new(1000.0, 1000.0);

        let first = engine.process_mesh(&mesh(0.0), screen).expect("frame");
        let flat = vec![Point2::new(0.5, 0.5); 6];
        let skipped = engine.process_mesh(&flat, screen).expect("frame");
        assert_eq!(first, skipped);
        assert_eq!(engine.model().pending_len(), 1);
    }

    #[test]
    fn non_finite_geometry_is_skipped() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let screen = ScreenSize::new(1000.0, 1000.0);
        let first = engine.process_mesh(&mesh(0.0), screen).expect("frame");

        let face = FaceLandmarks {
            left_eye: vec![Point2::new(0.4, 0.4), Point2::new(0.45, 0.41)],
            right_eye: vec![Point2::new(0.55, 0.4), Point2::new(0.6, 0.41)],
            bounds: BoundingBox {
                x: 0.3,
                y: 0.2,
                width: f64::INFINITY,
                height: 0.6,
            },
        };
        assert_eq!(engine.process_frame(&face, screen).expect("frame"), first);

        let mut huge = mesh(0.0);
        huge[4] = Point2::new(-1e308, -1e308);
        huge[5] = Point2::new(1e308, 1e308);
        assert_eq!(engine.process_mesh(&huge, screen).expect("frame"), first);
        assert_eq!(engine.model().pending_len(), 1);

        // calibration carries on with the next good frame
        let next = engine.process_mesh(&mesh(0.01), screen).expect("frame").expect("output");
        assert!(next.calibrating);
        assert_eq!(engine.model().pending_len(), 2);
    }

    #[test]
    fn recalibrate_is_ignored_while_stopped() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.recalibrate();
        assert!(!engine.is_calibrating());
        assert_eq!(engine.state(), CalibrationState::Idle);
        assert_eq!(engine.current_target(ScreenSize::new(1000.0, 1000.0)), None);

        engine.start();
        engine.stop();
        engine.recalibrate();
        assert_eq!(engine.state(), CalibrationState::Idle);
    }

    #[test]
    fn landmark_indices_come_from_config() {
        let engine = GazeEngine::new(small_config()).expect("engine");
        assert_eq!(engine.landmark_indices().left_eye, vec![0, 1]);
        assert_eq!(engine.landmark_indices().right_eye, vec![2, 3]);
    }

    #[test]
    fn invalid_screen_is_rejected() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let err = engine
            .process_mesh(&mesh(0.0), ScreenSize::new(0.0, 1080.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidScreen { .. }));
    }

    #[test]
    fn short_mesh_is_a_contract_error() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let err = engine
            .process_mesh(&mesh(0.0)[..3], ScreenSize::new(100.0, 100.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::MeshIndex { index: 3, len: 3 }));
    }

    #[test]
    fn stop_discards_the_session() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        let screen = ScreenSize::new(1000.0, 1000.0);
        for i in 0..5 {
            engine.process_mesh(&mesh(i as f64 * 0.01), screen).expect("frame");
        }
        assert!(engine.model().is_fitted());

        engine.stop();
        assert!(!engine.is_running());
        assert!(!engine.model().is_fitted());
        assert_eq!(engine.state(), CalibrationState::Idle);
        assert!(engine.last_output().is_none());

        engine.start();
        let out = engine.process_mesh(&mesh(0.0), screen).expect("frame").expect("output");
        assert_eq!(out.raw, Point2::ORIGIN);
    }

    #[test]
    fn visibility_is_reported_only() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        engine.set_visible(false);
        let out = engine
            .process_mesh(&mesh(0.0), ScreenSize::new(1000.0, 1000.0))
            .expect("frame")
            .expect("output");
        assert!(!out.cursor_visible);
        assert!(out.calibrating);
    }

    #[test]
    fn custom_sequence_from_config() {
        let config = EngineConfig {
            sequence: Some(vec![[0.1, 0.1], [0.9, 0.9]]),
            ..small_config()
        };
        let engine = GazeEngine::new(config).expect("engine");
        assert_eq!(engine.controller().sequence().len(), 2);

        let bad = EngineConfig {
            sequence: Some(vec![]),
            ..small_config()
        };
        assert!(matches!(GazeEngine::new(bad), Err(EngineError::EmptySequence)));
    }

    #[test]
    fn replacing_sequence_restarts_at_first_target() {
        let mut engine = GazeEngine::new(small_config()).expect("engine");
        engine.start();
        engine
            .set_calibration_sequence(vec![CalibrationTarget::new(0.5, 0.5), CalibrationTarget::new(0.0, 0.0)])
            .expect("sequence");
        let screen = ScreenSize::new(800.0, 600.0);
        assert_eq!(engine.current_target(screen), Some(Point2::new(400.0, 300.0)));
        assert!(engine.set_calibration_sequence(vec![]).is_err());
    }
}
