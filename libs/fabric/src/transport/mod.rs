use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

pub mod reassembler;
pub mod tcp;
pub mod writer;

pub use self::reassembler::StreamReassembler;
pub use self::tcp::{TcpTransport, TcpTransportBuilder, TcpTransportListener};
pub use self::writer::{encode_frame, FrameWriter};

/// Upper bound on a single read while reassembling a frame
pub const DEFAULT_CHUNK_LIMIT: usize = 64 * 1024;

/// Declared lengths above this are rejected (100MB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 100 * 1024 * 1024;

/// Read-side framing limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingConfig {
    pub chunk_limit: usize,
    pub max_frame_len: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Receiving half of a connection: yields one complete frame payload at a time
#[async_trait::async_trait]
pub trait FrameSource: Send {
    async fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Sending half of a connection: writes one length-prefixed frame per call
#[async_trait::async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Shut the write direction down
    async fn close(&mut self) -> Result<()>;
}

/// An established, framed, bidirectional connection
///
/// The two halves can be [split](Transport::split) so reading and writing run
/// on separate tasks.
pub struct Transport {
    source: Box<dyn FrameSource>,
    sink: Box<dyn FrameSink>,
}

impl Transport {
    pub fn new(source: impl FrameSource + 'static, sink: impl FrameSink + 'static) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
        }
    }

    /// Frame an arbitrary byte stream pair
    pub fn from_io<R, W>(reader: R, writer: W, framing: FramingConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::new(
            StreamReassembler::new(reader).with_framing(framing),
            FrameWriter::new(writer),
        )
    }

    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.sink.send(payload).await
    }

    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        self.source.receive().await
    }

    pub async fn close(&mut self) -> Result<()> {
        self.sink.close().await
    }

    pub fn split(self) -> (Box<dyn FrameSource>, Box<dyn FrameSink>) {
        (self.source, self.sink)
    }
}
