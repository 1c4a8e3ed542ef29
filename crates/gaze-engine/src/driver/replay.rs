use super::frame::{parse_frame_message, Frame};
use super::FrameSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// Replays a recorded JSON-lines file, one frame per line
pub struct ReplaySource {
    lines: Lines<BufReader<File>>,
    interval: Duration,
    line_no: usize,
}

impl ReplaySource {
    pub async fn open(path: impl AsRef<Path>, interval: Duration) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open replay file {}", path.display()))?;
        log::info!("Replaying frames from {}", path.display());
        Ok(Self {
            lines: BufReader::new(file).lines(),
            interval,
            line_no: 0,
        })
    }
}

#[async_trait]
impl FrameSource for ReplaySource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }

        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            match parse_frame_message(&line) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping replay line {}: {e}", self.line_no),
            }
        }
        Ok(None)
    }
}
