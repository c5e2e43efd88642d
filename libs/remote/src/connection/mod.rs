//! Connection lifecycle: at most one handle, driven through
//! `Disconnected → Connecting → Ready` by completions from its tasks.
//!
//! Every task spawned for a handle (connect attempt, receive loop, writer)
//! reports back through the runtime queue tagged with the handle's
//! [`HandleId`]. Reports whose id is no longer current are dropped, so a
//! superseded connection can never affect state.

mod connector;

pub use connector::{Connector, TcpConnector};

use std::sync::Arc;

use lossless_core::{EndpointId, Request, Response, ServiceEndpoint};
use lossless_fabric::codec::MessageCodec;
use lossless_fabric::transport::{FrameSink, FrameSource};
use lossless_fabric::Transport;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::events::Publisher;
use crate::runtime::Event;

/// Externally visible connection state
///
/// A failed attempt is reported on the error channel and lands back in
/// `Disconnected`; a cancelled handle is indistinguishable from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

/// Completion reported by one of a handle's tasks
pub(crate) enum ConnectionEvent {
    Connected {
        id: HandleId,
        result: lossless_fabric::Result<Transport>,
    },
    Frame {
        id: HandleId,
        result: lossless_fabric::Result<Response>,
    },
    ReceiveEnded {
        id: HandleId,
        error: lossless_fabric::Error,
    },
    WriteFailed {
        id: HandleId,
        error: lossless_fabric::Error,
    },
}

enum Phase {
    Connecting {
        initial: Request,
    },
    Ready {
        writer: mpsc::UnboundedSender<Vec<u8>>,
        receiver: JoinHandle<()>,
    },
}

struct Handle {
    id: HandleId,
    endpoint: ServiceEndpoint,
    connect: JoinHandle<()>,
    phase: Phase,
}

impl Handle {
    /// Stop all further deliveries. Frames already queued to the writer are
    /// still flushed before it shuts the stream down.
    fn cancel(self) {
        self.connect.abort();
        if let Phase::Ready { writer, receiver } = self.phase {
            receiver.abort();
            drop(writer);
        }
        tracing::debug!(handle = self.id.0, endpoint = %self.endpoint.id(), "handle cancelled");
    }
}

pub(crate) struct ConnectionManager {
    connector: Arc<dyn Connector>,
    codec: MessageCodec,
    publisher: Arc<Publisher>,
    events: mpsc::UnboundedSender<Event>,
    current: Option<Handle>,
    next_id: u64,
}

impl ConnectionManager {
    pub(crate) fn new(
        connector: Arc<dyn Connector>,
        publisher: Arc<Publisher>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            connector,
            codec: MessageCodec::default(),
            publisher,
            events,
            current: None,
            next_id: 0,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        match &self.current {
            None => ConnectionState::Disconnected,
            Some(Handle {
                phase: Phase::Connecting { .. },
                ..
            }) => ConnectionState::Connecting,
            Some(Handle {
                phase: Phase::Ready { .. },
                ..
            }) => ConnectionState::Ready,
        }
    }

    pub(crate) fn current_endpoint(&self) -> Option<&EndpointId> {
        self.current.as_ref().map(|handle| handle.endpoint.id())
    }

    fn current_id(&self) -> Option<HandleId> {
        self.current.as_ref().map(|handle| handle.id)
    }

    fn publish_state(&self) {
        self.publisher.state(self.state());
    }

    /// Replace any current handle with a fresh attempt at `endpoint`
    ///
    /// `initial` is sent as soon as the stream is ready.
    pub(crate) fn connect(&mut self, endpoint: ServiceEndpoint, initial: Request) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }

        let id = HandleId(self.next_id);
        self.next_id += 1;

        let connector = Arc::clone(&self.connector);
        let events = self.events.clone();
        let target = endpoint.clone();
        let connect = tokio::spawn(async move {
            let result = connector.connect(&target).await;
            let _ = events.send(Event::Connection(ConnectionEvent::Connected { id, result }));
        });

        tracing::info!(handle = id.0, endpoint = %endpoint.id(), %initial, "connecting");
        self.current = Some(Handle {
            id,
            endpoint,
            connect,
            phase: Phase::Connecting { initial },
        });
        self.publish_state();
    }

    /// Cancel the current handle, if any; idempotent
    pub(crate) fn disconnect(&mut self) {
        if let Some(handle) = self.current.take() {
            tracing::info!(endpoint = %handle.endpoint.id(), "disconnecting");
            handle.cancel();
        }
        self.publish_state();
    }

    /// Encode, frame and queue `request` on the current connection
    ///
    /// Dropped (and reported) when there is no connection or it is not
    /// ready yet. Write failures surface later as [`ClientError::Write`].
    pub(crate) fn send(&mut self, request: &Request) {
        let writer = match &self.current {
            None => {
                self.publisher
                    .report_dropped(request, ClientError::NotConnected);
                return;
            }
            Some(Handle {
                phase: Phase::Connecting { .. },
                ..
            }) => {
                self.publisher.report_dropped(request, ClientError::NotReady);
                return;
            }
            Some(Handle {
                phase: Phase::Ready { writer, .. },
                ..
            }) => writer,
        };

        let payload = match self.codec.encode_request(request) {
            Ok(payload) => payload,
            Err(error) => {
                self.publisher.report(error.into());
                return;
            }
        };

        tracing::debug!(%request, bytes = payload.len(), "sending request");
        if writer.send(payload).is_err() {
            self.publisher
                .report(ClientError::Write("writer has stopped".to_string()));
        }
    }

    pub(crate) fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { id, result } => self.on_connected(id, result),
            ConnectionEvent::Frame { id, result } => {
                if self.current_id() != Some(id) {
                    tracing::trace!(handle = id.0, "frame from superseded handle discarded");
                    return;
                }
                match result {
                    Ok(response) => self.publisher.response(response),
                    // Frame dropped; the loop keeps reading
                    Err(error) => self.publisher.report(error.into()),
                }
            }
            ConnectionEvent::ReceiveEnded { id, error } => {
                if self.current_id() != Some(id) {
                    return;
                }
                tracing::info!(handle = id.0, %error, "receive loop ended");
                self.publisher.report(error.into());
            }
            ConnectionEvent::WriteFailed { id, error } => {
                if self.current_id() != Some(id) {
                    return;
                }
                self.publisher.report(ClientError::Write(error.to_string()));
            }
        }
    }

    fn on_connected(&mut self, id: HandleId, result: lossless_fabric::Result<Transport>) {
        let Some(handle) = self.current.as_mut().filter(|handle| handle.id == id) else {
            // Superseded while connecting; dropping the transport closes it
            tracing::debug!(handle = id.0, "late connection discarded");
            return;
        };

        let transport = match result {
            Ok(transport) => transport,
            Err(error) => {
                tracing::warn!(handle = id.0, endpoint = %handle.endpoint.id(), %error, "connection failed");
                self.current = None;
                self.publisher.report(ClientError::Connection(error.to_string()));
                self.publish_state();
                return;
            }
        };

        let Phase::Connecting { initial } = handle.phase else {
            return;
        };

        let (source, sink) = transport.split();
        let writer = spawn_writer(id, sink, self.events.clone());
        let receiver = tokio::spawn(receive_loop(id, source, self.codec, self.events.clone()));
        handle.phase = Phase::Ready { writer, receiver };

        tracing::info!(handle = id.0, endpoint = %handle.endpoint.id(), "connection ready");
        self.publish_state();
        self.send(&initial);
    }
}

fn spawn_writer(
    id: HandleId,
    mut sink: Box<dyn FrameSink>,
    events: mpsc::UnboundedSender<Event>,
) -> mpsc::UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if let Err(error) = sink.send(&payload).await {
                let _ = events.send(Event::Connection(ConnectionEvent::WriteFailed { id, error }));
            }
        }
        let _ = sink.close().await;
    });

    tx
}

/// One per handle: frame, decode, hand to the runtime, repeat
async fn receive_loop(
    id: HandleId,
    mut source: Box<dyn FrameSource>,
    codec: MessageCodec,
    events: mpsc::UnboundedSender<Event>,
) {
    loop {
        let event = match source.receive().await {
            Ok(payload) => ConnectionEvent::Frame {
                id,
                result: codec.decode_response(&payload),
            },
            Err(error) => {
                let _ = events.send(Event::Connection(ConnectionEvent::ReceiveEnded { id, error }));
                return;
            }
        };

        if events.send(Event::Connection(event)).is_err() {
            return;
        }
    }
}
