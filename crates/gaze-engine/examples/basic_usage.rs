//! Example: drive the engine by hand with a synthetic face

use anyhow::Result;
use gaze_engine::driver::SimulatedFace;
use gaze_engine::{EngineConfig, GazeEngine, Point2, ScreenSize};

fn main() -> Result<()> {
    env_logger::init();

    let mut engine = GazeEngine::new(EngineConfig::default())?;
    let face = SimulatedFace::new(engine.landmark_indices().clone());
    let screen = ScreenSize::new(1920.0, 1080.0);

    engine.start();
    let mut frames = 0;
    while let Some(target) = engine.current_target(screen) {
        let looking_at = Point2::new(target.x / screen.width, target.y / screen.height);
        engine.process_mesh(&face.mesh_looking_at(looking_at), screen)?;
        frames += 1;
    }
    println!("Calibrated after {frames} frames ({} points)", engine.controller().completed_points());

    for gaze in [Point2::new(0.1, 0.9), Point2::new(0.5, 0.5), Point2::new(0.8, 0.3)] {
        let mut last = None;
        for _ in 0..30 {
            last = engine.process_mesh(&face.mesh_looking_at(gaze), screen)?;
        }
        if let Some(out) = last {
            println!(
                "looking at ({:.0}, {:.0}) -> gaze ({:.1}, {:.1})",
                gaze.x * screen.width,
                gaze.y * screen.height,
                out.point.x,
                out.point.y
            );
        }
    }

    engine.stop();
    Ok(())
}
