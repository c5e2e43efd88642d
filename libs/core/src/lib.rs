//! Lossless Core - data model shared by the remote client and its peers
//!
//! Holds the values that travel over the wire: [`Request`] (with its
//! tag table), [`Response`], [`AudioFormatDescriptor`], plus the
//! [`ServiceEndpoint`] produced by discovery.

pub mod endpoint;
pub mod error;
pub mod format;
pub mod request;
pub mod response;
pub mod time;

pub use endpoint::{EndpointId, ServiceEndpoint};
pub use error::{Error, Result};
pub use format::AudioFormatDescriptor;
pub use request::{Request, RequestTag};
pub use response::Response;
