//! Frame driver
//!
//! Pulls frames from a [`FrameSource`], feeds them to a [`GazeEngine`] and
//! forwards the results to an output consumer over a crossbeam channel.
//! Control requests (recalibrate, cursor visibility, new sequence, stop)
//! arrive on a second channel and are applied between frames, so they never
//! interleave with frame processing.

mod frame;
mod replay;
mod simulated;
mod udp;

pub use frame::{parse_frame_message, Frame, FrameLandmarks};
pub use replay::ReplaySource;
pub use simulated::{SimulatedFace, SimulatedSource, MESH_POINTS};
pub use udp::{udp_frame_addr_from_env, UdpFrameSource};

use crate::config::DriverConfig;
use crate::model::{GazeModel, OnlineRegressor};
use crate::types::{CalibrationTarget, EngineEvent, GazeOutput, ScreenSize};
use crate::GazeEngine;
use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait on a silent source before re-checking the run flag
const POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// Anything that produces landmark frames
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source is exhausted
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Called with every engine output; lets closed-loop sources react
    fn observe(&mut self, _output: &GazeOutput) {}
}

/// Requests a consumer can make of a running driver
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Recalibrate,
    SetVisible(bool),
    SetSequence(Vec<CalibrationTarget>),
    Stop,
}

/// Fires once per calibrating -> tracking transition
#[derive(Debug, Default, Clone, Copy)]
pub struct CalibrationWatch {
    was_calibrating: bool,
}

impl CalibrationWatch {
    pub fn update(&mut self, calibrating: bool) -> bool {
        let finished = self.was_calibrating && !calibrating;
        self.was_calibrating = calibrating;
        finished
    }
}

pub struct Driver<S: FrameSource, M: GazeModel = OnlineRegressor> {
    engine: GazeEngine<M>,
    source: S,
    config: DriverConfig,
    output_tx: Option<Sender<EngineEvent>>,
    control_rx: Option<Receiver<ControlCommand>>,
    run: Arc<AtomicBool>,
    watch: CalibrationWatch,
}

impl<S: FrameSource, M: GazeModel> Driver<S, M> {
    pub fn new(engine: GazeEngine<M>, source: S, config: DriverConfig) -> Self {
        Self {
            engine,
            source,
            config,
            output_tx: None,
            control_rx: None,
            run: Arc::new(AtomicBool::new(true)),
            watch: CalibrationWatch::default(),
        }
    }

    /// Send gaze and calibration events to a consumer
    pub fn connect_output(&mut self, tx: Sender<EngineEvent>) {
        log::info!("Connecting gaze output consumer");
        self.output_tx = Some(tx);
    }

    pub fn connect_control(&mut self, rx: Receiver<ControlCommand>) {
        self.control_rx = Some(rx);
    }

    /// Shared flag; clearing it ends [`run`](Self::run) after the current frame
    pub fn run_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.run)
    }

    pub fn engine(&self) -> &GazeEngine<M> {
        &self.engine
    }

    /// Drive the engine until the source runs dry, a `Stop` arrives or the
    /// run flag is cleared. Returns the number of frames that produced output.
    ///
    /// Per-frame engine errors are logged and the frame dropped; only source
    /// failures end the loop with an error.
    pub async fn run(&mut self) -> Result<usize> {
        self.engine.start();
        self.watch = CalibrationWatch::default();
        let mut processed = 0usize;

        let outcome = loop {
            if !self.apply_controls() || !self.run.load(Ordering::SeqCst) {
                break Ok(());
            }

            let frame = match tokio::time::timeout(POLL_TIMEOUT, self.source.next_frame()).await {
                Err(_elapsed) => continue,
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => {
                    log::info!("Frame source exhausted");
                    break Ok(());
                }
                Ok(Err(e)) => break Err(e),
            };

            // a stop may have landed while we were waiting on the source
            if !self.run.load(Ordering::SeqCst) {
                break Ok(());
            }

            let screen = frame.screen.unwrap_or(self.config.screen);
            match self.process(&frame.landmarks, screen) {
                Ok(Some(output)) => {
                    processed += 1;
                    self.source.observe(&output);
                    self.emit(EngineEvent::Gaze(output));
                    if self.watch.update(output.calibrating) {
                        log::info!("Calibration complete after {processed} frames");
                        self.emit(EngineEvent::CalibrationComplete);
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Dropping frame: {e}"),
            }
        };

        self.engine.stop();
        outcome.map(|()| processed)
    }

    fn process(&mut self, landmarks: &FrameLandmarks, screen: ScreenSize) -> crate::Result<Option<GazeOutput>> {
        match landmarks {
            FrameLandmarks::Mesh(mesh) => self.engine.process_mesh(mesh, screen),
            FrameLandmarks::Eyes(face) => self.engine.process_frame(face, screen),
        }
    }

    /// Apply queued control commands. Returns `false` when asked to stop.
    fn apply_controls(&mut self) -> bool {
        let Some(rx) = self.control_rx.as_ref() else {
            return true;
        };

        loop {
            let cmd = match rx.try_recv() {
                Ok(cmd) => cmd,
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => {
                    log::debug!("Control channel closed");
                    self.control_rx = None;
                    return true;
                }
            };

            log::debug!("Control command: {cmd:?}");
            match cmd {
                ControlCommand::Recalibrate => self.engine.recalibrate(),
                ControlCommand::SetVisible(visible) => self.engine.set_visible(visible),
                ControlCommand::SetSequence(targets) => {
                    if let Err(e) = self.engine.set_calibration_sequence(targets) {
                        log::warn!("Rejected calibration sequence: {e}");
                    }
                }
                ControlCommand::Stop => {
                    log::info!("Stop requested");
                    return false;
                }
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.output_tx {
            if let Err(e) = tx.send(event) {
                log::warn!("Failed to deliver gaze event: {}", e);
            }
        }
    }
}
