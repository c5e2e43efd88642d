//! Lossless Remote - client for a Lossless Switcher on the local network
//!
//! Finds switchers advertised as `_lossless-switcher._tcp.local.`, keeps at
//! most one connection open, and exchanges [`Request`]s and [`Response`]s
//! with it.
//!
//! # Example
//!
//! ```no_run
//! use lossless_remote::{RemoteClient, RemoteConfig, Request};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RemoteClient::new(RemoteConfig::default())?;
//! let mut responses = client.subscribe_responses();
//!
//! // The first switcher found is connected to automatically
//! client.start_discovery()?;
//!
//! let response = responses.recv().await?;
//! println!("{} Hz / {} bit", response.current_sample_rate, response.current_bit_depth);
//!
//! client.send(Request::ToggleAutoSwitching)?;
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
mod events;
mod runtime;
pub mod state;

pub use client::RemoteClient;
pub use config::RemoteConfig;
pub use connection::{ConnectionState, Connector, TcpConnector};
pub use discovery::{BrowseEvent, BrowseStream, Browser, MdnsBrowser};
pub use error::{ClientError, Result};
pub use lossless_core::{AudioFormatDescriptor, EndpointId, Request, Response, ServiceEndpoint};
pub use state::RemoteState;
