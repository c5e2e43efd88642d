use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Incomplete length prefix: got {received} of 4 bytes")]
    FrameLength { received: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Connection closed mid-frame: got {received} of {expected} bytes")]
    ConnectionClosedMidFrame { expected: usize, received: usize },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, Error>;
