//! The client's single serial context.
//!
//! One task owns [`ServiceDiscovery`] and [`ConnectionManager`] and drains a
//! single queue. Caller commands, browse events and connection completions
//! all arrive on that queue, so endpoint and handle state are only ever
//! touched from here.

use std::sync::Arc;

use lossless_core::{Request, ServiceEndpoint};
use tokio::sync::mpsc;

use crate::config::RemoteConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, Connector};
use crate::discovery::{Applied, BrowseEvent, Browser, ServiceDiscovery};
use crate::error::ClientError;
use crate::events::Publisher;

/// Which endpoint a connect command targets
pub(crate) enum Target {
    /// Position in the current discovered list
    Index(usize),
    Endpoint(ServiceEndpoint),
}

pub(crate) enum Command {
    StartDiscovery,
    StopDiscovery,
    Connect { target: Target, request: Request },
    Disconnect,
    Send(Request),
    Shutdown,
}

pub(crate) enum Event {
    Command(Command),
    Discovery { generation: u64, event: BrowseEvent },
    DiscoveryEnded { generation: u64 },
    Connection(ConnectionEvent),
}

pub(crate) struct Runtime {
    discovery: ServiceDiscovery,
    connection: ConnectionManager,
    publisher: Arc<Publisher>,
    auto_connect: bool,
    sender: mpsc::UnboundedSender<Event>,
    events: mpsc::UnboundedReceiver<Event>,
}

impl Runtime {
    pub(crate) fn new(
        config: &RemoteConfig,
        browser: Arc<dyn Browser>,
        connector: Arc<dyn Connector>,
        publisher: Arc<Publisher>,
        sender: mpsc::UnboundedSender<Event>,
        events: mpsc::UnboundedReceiver<Event>,
    ) -> Self {
        Self {
            discovery: ServiceDiscovery::new(
                browser,
                config.browse_type(),
                Arc::clone(&publisher),
            ),
            connection: ConnectionManager::new(connector, Arc::clone(&publisher), sender.clone()),
            publisher,
            auto_connect: config.auto_connect,
            sender,
            events,
        }
    }

    pub(crate) async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                Event::Command(Command::Shutdown) => break,
                Event::Command(command) => self.handle_command(command),
                Event::Discovery { generation, event } => self.handle_discovery(generation, event),
                Event::DiscoveryEnded { generation } => {
                    if self.discovery.ended(generation) {
                        self.publisher
                            .report(ClientError::Discovery("browse ended unexpectedly".to_string()));
                    }
                }
                Event::Connection(event) => self.connection.handle_event(event),
            }
        }

        self.connection.disconnect();
        self.discovery.stop();
        tracing::debug!("remote client runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::StartDiscovery => {
                if let Err(error) = self.discovery.start(&self.sender) {
                    self.publisher.report(error);
                }
            }
            Command::StopDiscovery => self.discovery.stop(),
            Command::Connect { target, request } => {
                let endpoint = match target {
                    Target::Endpoint(endpoint) => endpoint,
                    Target::Index(index) => match self.discovery.endpoints().get(index) {
                        Some(endpoint) => endpoint.clone(),
                        None => {
                            self.publisher.report(ClientError::NoSuchEndpoint {
                                index,
                                len: self.discovery.endpoints().len(),
                            });
                            return;
                        }
                    },
                };
                self.connection.connect(endpoint, request);
            }
            Command::Disconnect => self.connection.disconnect(),
            Command::Send(request) => self.connection.send(&request),
            Command::Shutdown => {}
        }
    }

    fn handle_discovery(&mut self, generation: u64, event: BrowseEvent) {
        match self.discovery.apply(generation, event) {
            Applied::Ignored => {}
            Applied::Added { first } => {
                if let Some(endpoint) = first.filter(|_| self.auto_connect) {
                    tracing::info!(endpoint = %endpoint.id(), "only service known, connecting");
                    self.connection.connect(endpoint, Request::Refresh);
                }
            }
            Applied::Removed(id) => {
                if self.connection.current_endpoint() == Some(&id) {
                    self.connection.disconnect();
                }
            }
        }
    }
}
