//! Service discovery: the set of switchers currently visible on the network.
//!
//! Browsing itself sits behind the [`Browser`] trait; [`MdnsBrowser`] is the
//! DNS-SD implementation. [`ServiceDiscovery`] keeps the deduplicated
//! endpoint list and decides when a change should trigger auto-connect.

mod mdns;

pub use mdns::MdnsBrowser;

use std::sync::Arc;

use lossless_core::{EndpointId, ServiceEndpoint};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::events::Publisher;
use crate::runtime::Event;

/// One change reported by a browse
#[derive(Debug, Clone)]
pub enum BrowseEvent {
    Added(ServiceEndpoint),
    Removed(EndpointId),
}

/// Lazy, unbounded sequence of browse events; ends when the browse stops
pub type BrowseStream = mpsc::UnboundedReceiver<BrowseEvent>;

/// Source of browse events for one service type
pub trait Browser: Send + Sync {
    /// Begin browsing; must be called from within a tokio runtime
    fn browse(&self, service_type: &str) -> Result<BrowseStream>;

    /// Cancel a browse started with [`Browser::browse`]
    fn stop_browse(&self, service_type: &str);
}

/// What applying a browse event did to the endpoint set
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Applied {
    /// Event belonged to a stopped browse, or changed nothing
    Ignored,
    /// Endpoint appended; `first` is set on the 0 → 1 transition
    Added { first: Option<ServiceEndpoint> },
    Removed(EndpointId),
}

struct BrowseSession {
    generation: u64,
    forwarder: JoinHandle<()>,
}

pub(crate) struct ServiceDiscovery {
    browser: Arc<dyn Browser>,
    service_type: String,
    publisher: Arc<Publisher>,
    endpoints: Vec<ServiceEndpoint>,
    session: Option<BrowseSession>,
    next_generation: u64,
}

impl ServiceDiscovery {
    pub(crate) fn new(
        browser: Arc<dyn Browser>,
        service_type: String,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            browser,
            service_type,
            publisher,
            endpoints: Vec::new(),
            session: None,
            next_generation: 0,
        }
    }

    pub(crate) fn endpoints(&self) -> &[ServiceEndpoint] {
        &self.endpoints
    }

    /// Start (or restart) browsing from an empty set
    ///
    /// Events are forwarded into the runtime queue tagged with this browse's
    /// generation, so anything still in flight from an earlier browse is
    /// recognisable as stale.
    pub(crate) fn start(&mut self, events: &mpsc::UnboundedSender<Event>) -> Result<()> {
        self.stop();

        let mut stream = self.browser.browse(&self.service_type)?;
        let generation = self.next_generation;
        self.next_generation += 1;

        let events = events.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = stream.recv().await {
                if events.send(Event::Discovery { generation, event }).is_err() {
                    return;
                }
            }
            let _ = events.send(Event::DiscoveryEnded { generation });
        });

        tracing::info!(service_type = %self.service_type, generation, "browse started");
        self.session = Some(BrowseSession {
            generation,
            forwarder,
        });
        Ok(())
    }

    /// Cancel the browse and forget every known endpoint; idempotent
    pub(crate) fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.forwarder.abort();
            self.browser.stop_browse(&self.service_type);
            tracing::info!(generation = session.generation, "browse stopped");
        }

        if !self.endpoints.is_empty() {
            self.endpoints.clear();
            self.publisher.endpoints(&self.endpoints);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.generation == generation)
    }

    /// Fold one browse event into the set, publishing on change
    pub(crate) fn apply(&mut self, generation: u64, event: BrowseEvent) -> Applied {
        if !self.is_current(generation) {
            tracing::trace!(generation, "stale browse event discarded");
            return Applied::Ignored;
        }

        let applied = apply_event(&mut self.endpoints, event);
        if applied != Applied::Ignored {
            self.publisher.endpoints(&self.endpoints);
        }
        applied
    }

    /// The browse stream closed without being stopped
    pub(crate) fn ended(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.session = None;
        true
    }
}

fn apply_event(endpoints: &mut Vec<ServiceEndpoint>, event: BrowseEvent) -> Applied {
    match event {
        BrowseEvent::Added(endpoint) => {
            if endpoints.contains(&endpoint) {
                return Applied::Ignored;
            }
            tracing::info!(endpoint = %endpoint.id(), host = endpoint.host_name(), "service added");
            endpoints.push(endpoint);
            let first = (endpoints.len() == 1).then(|| endpoints[0].clone());
            Applied::Added { first }
        }
        BrowseEvent::Removed(id) => {
            let before = endpoints.len();
            endpoints.retain(|endpoint| endpoint.id() != &id);
            if endpoints.len() == before {
                return Applied::Ignored;
            }
            tracing::info!(endpoint = %id, "service removed");
            Applied::Removed(id)
        }
    }
}
