//! Gaze Engine CLI
//!
//! Runs the engine against a landmark source and prints one JSON event per
//! line on stdout. Control commands are read from stdin, one per line:
//! `recalibrate`, `show`, `hide`, `stop`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::Sender;
use gaze_engine::driver::{
    udp_frame_addr_from_env, ControlCommand, Driver, FrameSource, ReplaySource, SimulatedSource, UdpFrameSource,
};
use gaze_engine::{AppConfig, EngineEvent, GazeEngine, ScreenSize};
use log::LevelFilter;
use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

const DEFAULT_UDP_ADDR: &str = "127.0.0.1:5005";

#[derive(Parser)]
#[command(name = "gaze-engine")]
#[command(about = "Gaze estimation engine - facial landmarks in, screen coordinates out", long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Screen width in pixels, for frames that do not carry one
    #[arg(long)]
    width: Option<f64>,

    /// Screen height in pixels, for frames that do not carry one
    #[arg(long)]
    height: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded JSON-lines landmark file
    Replay {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Listen for landmark frames on a UDP socket
    ///
    /// Defaults to $GAZE_ENGINE_UDP_ADDR, then 127.0.0.1:5005.
    Udp {
        #[arg(value_name = "ADDR")]
        addr: Option<SocketAddr>,
    },

    /// Run against a synthetic face that looks at each calibration target
    Simulate {
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("Invalid config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(width) = cli.width {
        config.driver.screen.width = width;
    }
    if let Some(height) = cli.height {
        config.driver.screen.height = height;
    }

    let interval = Duration::from_millis(config.driver.frame_interval_ms);
    match cli.command {
        Commands::Replay { path } => {
            let source = ReplaySource::open(&path, interval).await?;
            run(source, config).await
        }
        Commands::Udp { addr } => {
            let addr = match addr.or_else(udp_frame_addr_from_env) {
                Some(addr) => addr,
                None => DEFAULT_UDP_ADDR.parse()?,
            };
            let source = UdpFrameSource::bind(addr).await?;
            run(source, config).await
        }
        Commands::Simulate { frames } => {
            let screen = config.driver.screen;
            let mut source = SimulatedSource::new(config.engine.landmarks.clone(), screen, interval);
            if let Some(frames) = frames {
                source = source.with_frame_limit(frames);
            }
            run(source, config).await
        }
    }
}

async fn run<S: FrameSource>(source: S, config: AppConfig) -> Result<()> {
    let ScreenSize { width, height } = config.driver.screen;
    log::info!("Default screen {width}x{height}");

    let engine = GazeEngine::new(config.engine)?;
    let mut driver = Driver::new(engine, source, config.driver);

    let (event_tx, event_rx) = crossbeam_channel::unbounded::<EngineEvent>();
    let (control_tx, control_rx) = crossbeam_channel::unbounded();
    driver.connect_output(event_tx);
    driver.connect_control(control_rx);

    let run_flag = driver.run_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        run_flag.store(false, Ordering::SeqCst);
    })?;

    spawn_control_reader(control_tx);

    let consumer = std::thread::spawn(move || {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for event in event_rx {
            match serde_json::to_string(&event) {
                Ok(line) => {
                    if writeln!(out, "{line}").is_err() {
                        break;
                    }
                }
                Err(e) => log::warn!("Failed to encode event: {e}"),
            }
        }
    });

    let result = driver.run().await;
    // closes the event channel so the consumer drains and exits
    drop(driver);
    if consumer.join().is_err() {
        log::error!("Output thread panicked");
    }

    let frames = result?;
    log::info!("Gaze engine finished after {frames} frames");
    Ok(())
}

/// Forward stdin lines as control commands. The thread is detached; it
/// ends with stdin or once the driver is gone.
fn spawn_control_reader(tx: Sender<ControlCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let cmd = match line.trim() {
                "" => continue,
                "recalibrate" => ControlCommand::Recalibrate,
                "show" => ControlCommand::SetVisible(true),
                "hide" => ControlCommand::SetVisible(false),
                "stop" => ControlCommand::Stop,
                other => {
                    log::warn!("Unknown command: {other}");
                    continue;
                }
            };
            if tx.send(cmd).is_err() {
                break;
            }
        }
    });
}
