//! Outgoing notifications.
//!
//! Latest-value state (endpoint list, connection state) goes out on
//! `watch` channels; one-shot events (responses, errors) on `broadcast`.

use lossless_core::{Request, Response, ServiceEndpoint};
use tokio::sync::{broadcast, watch};

use crate::connection::ConnectionState;
use crate::error::ClientError;

/// Senders for everything the client publishes
pub(crate) struct Publisher {
    endpoints: watch::Sender<Vec<ServiceEndpoint>>,
    state: watch::Sender<ConnectionState>,
    responses: broadcast::Sender<Response>,
    errors: broadcast::Sender<ClientError>,
}

impl Publisher {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            endpoints: watch::channel(Vec::new()).0,
            state: watch::channel(ConnectionState::default()).0,
            responses: broadcast::channel(capacity).0,
            errors: broadcast::channel(capacity).0,
        }
    }

    pub(crate) fn endpoints(&self, endpoints: &[ServiceEndpoint]) {
        self.endpoints.send_replace(endpoints.to_vec());
    }

    pub(crate) fn state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            tracing::debug!(?previous, ?state, "connection state");
        }
    }

    pub(crate) fn response(&self, response: Response) {
        tracing::debug!(
            sample_rate = response.current_sample_rate,
            bit_depth = response.current_bit_depth,
            time_stamp = %response.time_stamp,
            "response received"
        );
        // No subscribers is fine
        let _ = self.responses.send(response);
    }

    pub(crate) fn report(&self, error: ClientError) {
        tracing::warn!(%error, "remote client error");
        let _ = self.errors.send(error);
    }

    /// Expected drops (e.g. sending while disconnected) are quieter
    pub(crate) fn report_dropped(&self, request: &Request, error: ClientError) {
        tracing::debug!(%request, %error, "request dropped");
        let _ = self.errors.send(error);
    }

    pub(crate) fn current_endpoints(&self) -> Vec<ServiceEndpoint> {
        self.endpoints.borrow().clone()
    }

    pub(crate) fn subscribe_endpoints(&self) -> watch::Receiver<Vec<ServiceEndpoint>> {
        self.endpoints.subscribe()
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) fn subscribe_responses(&self) -> broadcast::Receiver<Response> {
        self.responses.subscribe()
    }

    pub(crate) fn subscribe_errors(&self) -> broadcast::Receiver<ClientError> {
        self.errors.subscribe()
    }
}
