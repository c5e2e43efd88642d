use thiserror::Error;

/// Everything the client reports
///
/// None of these abort the client; each ends only the operation that
/// produced it. They are logged and published on the error channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Incomplete length prefix: got {received} of 4 bytes")]
    FrameLength { received: usize },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Connection not ready")]
    NotReady,

    #[error("No endpoint at index {index} ({len} known)")]
    NoSuchEndpoint { index: usize, len: usize },

    #[error("Client has shut down")]
    Closed,
}

impl From<lossless_fabric::Error> for ClientError {
    fn from(error: lossless_fabric::Error) -> Self {
        use lossless_fabric::Error as Fabric;

        match error {
            Fabric::Encode(msg) => Self::Encode(msg),
            Fabric::Decode(msg) => Self::Decode(msg),
            Fabric::FrameLength { received } => Self::FrameLength { received },
            other => Self::Connection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
