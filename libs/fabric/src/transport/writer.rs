use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::transport::FrameSink;

fn frame_len(payload: &[u8]) -> Result<u32> {
    u32::try_from(payload.len()).map_err(|_| {
        Error::InvalidFrame(format!("Message too large: {} bytes", payload.len()))
    })
}

/// Prefix a payload with its 4-byte big-endian length
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = frame_len(payload)?;
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes length-prefixed frames to a byte stream
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        // Write length prefix (4 bytes, big-endian)
        let len = frame_len(payload)?;
        self.writer.write_u32(len).await?;

        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameSink for FrameWriter<W> {
    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.write_frame(payload).await
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
