//! Consumer-side cache of the latest values.
//!
//! What a UI binds to: the last response's fields plus the endpoint list and
//! connection state. Only complete, decoded responses ever touch it.

use lossless_core::{AudioFormatDescriptor, Response, ServiceEndpoint};
use tokio::sync::{broadcast, watch};

use crate::client::RemoteClient;
use crate::connection::ConnectionState;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteState {
    pub current_sample_rate: f64,
    pub detected_sample_rate: f64,
    pub current_bit_depth: u32,
    pub detected_bit_depth: u32,
    pub auto_switching_enabled: bool,
    pub bit_depth_detection_enabled: bool,
    pub formats_with_current_bit_depth: Vec<AudioFormatDescriptor>,
    pub formats_with_current_sample_rate: Vec<AudioFormatDescriptor>,
    pub default_output_device_name: String,
    pub server_host_name: String,
    /// Timestamp of the response these values came from
    pub time_stamp: String,
    pub endpoints: Vec<ServiceEndpoint>,
    pub connection: ConnectionState,
}

impl RemoteState {
    pub fn apply_response(&mut self, response: &Response) {
        self.current_sample_rate = response.current_sample_rate;
        self.detected_sample_rate = response.detected_sample_rate;
        self.current_bit_depth = response.current_bit_depth;
        self.detected_bit_depth = response.detected_bit_depth;
        self.auto_switching_enabled = response.auto_switching_enabled;
        self.bit_depth_detection_enabled = response.bit_depth_detection_enabled;
        self.formats_with_current_bit_depth = response.formats_with_current_bit_depth.clone();
        self.formats_with_current_sample_rate = response.formats_with_current_sample_rate.clone();
        self.default_output_device_name = response.default_output_device_name.clone();
        self.server_host_name = response.server_host_name.clone();
        self.time_stamp = response.time_stamp.clone();
    }

    /// Keep a [`RemoteState`] in sync with `client` on a background task
    ///
    /// The task ends when the client shuts down or every receiver is dropped.
    pub fn mirror(client: &RemoteClient) -> watch::Receiver<RemoteState> {
        let mut responses = client.subscribe_responses();
        let mut endpoints = client.subscribe_endpoints();
        let mut connection = client.subscribe_state();

        let initial = RemoteState {
            endpoints: endpoints.borrow_and_update().clone(),
            connection: *connection.borrow_and_update(),
            ..RemoteState::default()
        };
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    received = responses.recv() => match received {
                        Ok(response) => tx.send_modify(|state| state.apply_response(&response)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "state mirror lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    changed = endpoints.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let list = endpoints.borrow_and_update().clone();
                        tx.send_modify(|state| state.endpoints = list);
                    }
                    changed = connection.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let current = *connection.borrow_and_update();
                        tx.send_modify(|state| state.connection = current);
                    }
                    _ = tx.closed() => break,
                }
            }
        });

        rx
    }
}
