use std::sync::Arc;

use lossless_core::{Request, Response, ServiceEndpoint};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::RemoteConfig;
use crate::connection::{ConnectionState, Connector, TcpConnector};
use crate::discovery::{Browser, MdnsBrowser};
use crate::error::{ClientError, Result};
use crate::events::Publisher;
use crate::runtime::{Command, Event, Runtime, Target};

/// Handle to a running remote client
///
/// Construct one explicitly and hand it to whatever drives the UI. All calls
/// are non-blocking: they queue a command for the client's runtime task and
/// return. Outcomes arrive through the `subscribe_*` channels; failures are
/// published on [`RemoteClient::subscribe_errors`].
///
/// Dropping the client stops its runtime, closing any connection.
pub struct RemoteClient {
    commands: mpsc::UnboundedSender<Event>,
    publisher: Arc<Publisher>,
    task: Option<JoinHandle<()>>,
}

impl RemoteClient {
    /// Client browsing with mDNS and connecting over TCP
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let browser = Arc::new(MdnsBrowser::new()?);
        let connector = Arc::new(TcpConnector::new(config.framing));
        Ok(Self::with_parts(config, browser, connector))
    }

    /// Client with caller-supplied discovery and transport
    pub fn with_parts(
        config: RemoteConfig,
        browser: Arc<dyn Browser>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let publisher = Arc::new(Publisher::new(config.event_capacity));
        let (sender, events) = mpsc::unbounded_channel();

        let runtime = Runtime::new(
            &config,
            browser,
            connector,
            Arc::clone(&publisher),
            sender.clone(),
            events,
        );
        let task = tokio::spawn(runtime.run());

        Self {
            commands: sender,
            publisher,
            task: Some(task),
        }
    }

    fn command(&self, command: Command) -> Result<()> {
        self.commands
            .send(Event::Command(command))
            .map_err(|_| ClientError::Closed)
    }

    /// Begin browsing from an empty endpoint set (restarts a running browse)
    pub fn start_discovery(&self) -> Result<()> {
        self.command(Command::StartDiscovery)
    }

    /// Cancel browsing and clear the endpoint set
    pub fn stop_discovery(&self) -> Result<()> {
        self.command(Command::StopDiscovery)
    }

    /// Connect to the `index`th discovered endpoint, sending `request` once
    /// ready. Any current connection is cancelled first.
    pub fn connect(&self, index: usize, request: Request) -> Result<()> {
        self.command(Command::Connect {
            target: Target::Index(index),
            request,
        })
    }

    /// Connect to an endpoint that did not come from discovery
    pub fn connect_to(&self, endpoint: ServiceEndpoint, request: Request) -> Result<()> {
        self.command(Command::Connect {
            target: Target::Endpoint(endpoint),
            request,
        })
    }

    pub fn disconnect(&self) -> Result<()> {
        self.command(Command::Disconnect)
    }

    /// Queue a request; dropped with an error event unless the connection is
    /// ready
    pub fn send(&self, request: Request) -> Result<()> {
        self.command(Command::Send(request))
    }

    /// App moved to the background: drop the connection and stop browsing
    pub fn suspend(&self) -> Result<()> {
        self.disconnect()?;
        self.stop_discovery()
    }

    /// App came back: browse again (auto-connect applies)
    pub fn resume(&self) -> Result<()> {
        self.start_discovery()
    }

    /// Snapshot of the discovered endpoints
    pub fn endpoints(&self) -> Vec<ServiceEndpoint> {
        self.publisher.current_endpoints()
    }

    /// Display name of the `index`th discovered endpoint
    pub fn host_name(&self, index: usize) -> Option<String> {
        self.endpoints()
            .get(index)
            .map(|endpoint| endpoint.host_name().to_string())
    }

    pub fn subscribe_endpoints(&self) -> watch::Receiver<Vec<ServiceEndpoint>> {
        self.publisher.subscribe_endpoints()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.publisher.subscribe_state()
    }

    pub fn subscribe_responses(&self) -> broadcast::Receiver<Response> {
        self.publisher.subscribe_responses()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<ClientError> {
        self.publisher.subscribe_errors()
    }

    /// Stop the runtime and wait for it to close the connection and browse
    pub async fn shutdown(mut self) {
        let _ = self.command(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("remote client runtime panicked: {e}");
            }
        }
    }
}

impl Drop for RemoteClient {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.command(Command::Shutdown);
        }
    }
}
