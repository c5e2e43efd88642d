use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

/// Identity of a discovered service instance (its full DNS-SD name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A reachable switcher instance
///
/// Two endpoints are equal when their [`EndpointId`]s are; addresses and
/// metadata do not take part in identity.
#[derive(Debug, Clone)]
pub struct ServiceEndpoint {
    id: EndpointId,
    addresses: Vec<SocketAddr>,
    metadata: Option<BTreeMap<String, String>>,
}

impl ServiceEndpoint {
    /// TXT record key carrying the server's display name
    pub const HOST_NAME_KEY: &'static str = "serverHostName";

    pub fn new(id: impl Into<String>, addresses: Vec<SocketAddr>) -> Self {
        Self {
            id: EndpointId::new(id),
            addresses,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn id(&self) -> &EndpointId {
        &self.id
    }

    pub fn addresses(&self) -> &[SocketAddr] {
        &self.addresses
    }

    pub fn metadata(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.as_ref()
    }

    /// Display name advertised by the server
    ///
    /// Empty when the record lacks the key, `"none"` when there is no record.
    pub fn host_name(&self) -> &str {
        match &self.metadata {
            Some(record) => record
                .get(Self::HOST_NAME_KEY)
                .map(String::as_str)
                .unwrap_or(""),
            None => "none",
        }
    }
}

impl PartialEq for ServiceEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceEndpoint {}

impl Hash for ServiceEndpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
