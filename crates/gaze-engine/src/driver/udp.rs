use super::frame::{parse_frame_message, Frame};
use super::FrameSource;
use anyhow::Result;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Landmark frames are large (a full mesh is ~20 KiB of JSON)
const MAX_DATAGRAM: usize = 64 * 1024;

pub fn udp_frame_addr_from_env() -> Option<SocketAddr> {
    let raw = std::env::var("GAZE_ENGINE_UDP_ADDR").ok()?;
    raw.parse::<SocketAddr>().ok()
}

/// Receives one frame per datagram from an external landmark detector
pub struct UdpFrameSource {
    sock: UdpSocket,
    buf: Vec<u8>,
}

impl UdpFrameSource {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let sock = UdpSocket::bind(addr).await?;
        log::info!("UDP frame listener bound on {}", sock.local_addr()?);
        Ok(Self {
            sock,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.sock.local_addr()?)
    }
}

#[async_trait]
impl FrameSource for UdpFrameSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let (len, src) = match self.sock.recv_from(&mut self.buf).await {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("UDP frame recv error: {e}");
                    continue;
                }
            };

            let Ok(msg) = std::str::from_utf8(&self.buf[..len]) else {
                log::warn!("Dropping non-UTF-8 datagram from {src}");
                continue;
            };
            match parse_frame_message(msg) {
                Ok(Some(frame)) => return Ok(Some(frame)),
                Ok(None) => {}
                Err(e) => log::warn!("Dropping datagram from {src}: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FrameLandmarks;
    use crate::types::Point2;

    #[tokio::test]
    async fn receives_frames_and_skips_garbage() {
        let mut source = UdpFrameSource::bind("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("bind");
        let addr = source.local_addr().expect("addr");

        let sender = UdpSocket::bind("127.0.0.1:0").await.expect("bind sender");
        sender.send_to(b"not json", addr).await.expect("send");
        sender
            .send_to(br#"{"mesh":[[0.1,0.2],[0.3,0.4]]}"#, addr)
            .await
            .expect("send");

        let frame = source.next_frame().await.expect("recv").expect("frame");
        assert_eq!(
            frame.landmarks,
            FrameLandmarks::Mesh(vec![Point2::new(0.1, 0.2), Point2::new(0.3, 0.4)])
        );
    }
}
