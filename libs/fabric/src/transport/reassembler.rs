use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, Result};
use crate::transport::{FrameSource, FramingConfig};

const PREFIX_LEN: usize = 4;

/// Rebuilds length-prefixed frames from a byte stream
///
/// Each frame is a 4-byte big-endian length `N` followed by `N` payload
/// bytes. Both parts are accumulated across as many partial reads as the
/// stream delivers; a payload is only handed out once all `N` bytes arrived.
pub struct StreamReassembler<R> {
    reader: R,
    chunk: Vec<u8>,
    max_frame_len: usize,
}

impl<R: AsyncRead + Unpin + Send> StreamReassembler<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, FramingConfig::default())
    }

    fn with_config(reader: R, framing: FramingConfig) -> Self {
        Self {
            reader,
            chunk: vec![0; framing.chunk_limit.max(1)],
            max_frame_len: framing.max_frame_len,
        }
    }

    /// Replace the read limits
    pub fn with_framing(self, framing: FramingConfig) -> Self {
        Self::with_config(self.reader, framing)
    }

    /// Read the next complete frame payload
    ///
    /// A clean end of stream before any prefix byte is
    /// [`Error::ConnectionClosed`]; ending inside the prefix is
    /// [`Error::FrameLength`]; ending inside the payload is
    /// [`Error::ConnectionClosedMidFrame`].
    pub async fn next_frame(&mut self) -> Result<Vec<u8>> {
        let len = self.read_prefix().await?;

        if len > self.max_frame_len {
            return Err(Error::InvalidFrame(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        // Grows as bytes arrive; the declared length is not trusted up front
        let mut payload = Vec::with_capacity(len.min(self.chunk.len()));
        while payload.len() < len {
            let want = (len - payload.len()).min(self.chunk.len());
            let read = self.reader.read(&mut self.chunk[..want]).await?;
            if read == 0 {
                return Err(Error::ConnectionClosedMidFrame {
                    expected: len,
                    received: payload.len(),
                });
            }
            payload.extend_from_slice(&self.chunk[..read]);
            tracing::trace!(read, received = payload.len(), expected = len, "frame chunk");
        }

        Ok(payload)
    }

    async fn read_prefix(&mut self) -> Result<usize> {
        let mut prefix = [0u8; PREFIX_LEN];
        let mut filled = 0;

        while filled < PREFIX_LEN {
            let read = self.reader.read(&mut prefix[filled..]).await?;
            if read == 0 {
                return Err(if filled == 0 {
                    Error::ConnectionClosed
                } else {
                    Error::FrameLength { received: filled }
                });
            }
            filled += read;
        }

        Ok(u32::from_be_bytes(prefix) as usize)
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> FrameSource for StreamReassembler<R> {
    async fn receive(&mut self) -> Result<Vec<u8>> {
        self.next_frame().await
    }
}
