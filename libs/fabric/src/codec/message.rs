use lossless_core::time::timestamp_now;
use lossless_core::{Request, Response};
use serde::{Deserialize, Serialize};

use crate::codec::{Codec, JsonCodec};
use crate::error::Result;

/// Outgoing envelope: `{"request": {...}, "timeStamp": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub request: Request,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
}

impl ClientMessage {
    /// Wrap a request, stamped with the current local time
    pub fn new(request: Request) -> Self {
        Self {
            request,
            time_stamp: timestamp_now(),
        }
    }
}

/// Maps requests and responses to frame payloads
///
/// The client side encodes [`ClientMessage`]s and decodes [`Response`]s; the
/// peer side does the inverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageCodec<C = JsonCodec> {
    codec: C,
}

impl<C: Codec> MessageCodec<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Encode a request, stamping it now
    pub fn encode_request(&self, request: &Request) -> Result<Vec<u8>> {
        self.encode_message(&ClientMessage::new(*request))
    }

    pub fn encode_message(&self, message: &ClientMessage) -> Result<Vec<u8>> {
        self.codec.encode(message)
    }

    pub fn decode_response(&self, payload: &[u8]) -> Result<Response> {
        self.codec.decode(payload)
    }

    /// Peer side: decode an incoming envelope
    pub fn decode_request(&self, payload: &[u8]) -> Result<ClientMessage> {
        self.codec.decode(payload)
    }

    /// Peer side: encode a response
    pub fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        self.codec.encode(response)
    }
}
