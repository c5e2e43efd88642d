//! Lossless Fabric - framing, codec and transport layer
//!
//! Every message on the wire is a 4-byte big-endian length followed by that
//! many bytes of UTF-8 JSON. This crate turns byte streams into complete
//! frames ([`transport::StreamReassembler`]), frames back into byte streams
//! ([`transport::FrameWriter`]), and frame payloads into
//! [`lossless_core::Request`]/[`lossless_core::Response`] values
//! ([`codec::MessageCodec`]).
//!
//! # Example
//!
//! ```no_run
//! use lossless_core::Request;
//! use lossless_fabric::{codec::MessageCodec, transport::TcpTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let codec: MessageCodec = MessageCodec::default();
//! let addr = "127.0.0.1:8080".parse()?;
//! let mut transport = TcpTransport::connect(addr).await?.into_transport();
//!
//! transport.send(&codec.encode_request(&Request::Refresh)?).await?;
//! let response = codec.decode_response(&transport.receive().await?)?;
//! println!("{} Hz", response.current_sample_rate);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod transport;

// Re-exports for convenience
pub use error::{Error, Result};
pub use transport::Transport;
