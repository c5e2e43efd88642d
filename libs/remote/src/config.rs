use lossless_fabric::transport::FramingConfig;

/// DNS-SD service type the switcher advertises
pub const SERVICE_TYPE: &str = "_lossless-switcher._tcp";

/// DNS-SD domain browsed
pub const SERVICE_DOMAIN: &str = "local";

/// Configuration for a [`RemoteClient`](crate::RemoteClient).
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub service_type: String,
    pub domain: String,
    /// Read-side framing limits for every connection
    pub framing: FramingConfig,
    /// Capacity of the response and error broadcast channels
    pub event_capacity: usize,
    /// Connect with a refresh as soon as the first service shows up
    pub auto_connect: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            service_type: SERVICE_TYPE.to_string(),
            domain: SERVICE_DOMAIN.to_string(),
            framing: FramingConfig::default(),
            event_capacity: 64,
            auto_connect: true,
        }
    }
}

impl RemoteConfig {
    /// Fully qualified browse type, e.g. `_lossless-switcher._tcp.local.`
    /// (mdns-sd requires the trailing dot)
    pub fn browse_type(&self) -> String {
        format!("{}.{}.", self.service_type, self.domain)
    }

    pub fn with_chunk_limit(mut self, chunk_limit: usize) -> Self {
        self.framing.chunk_limit = chunk_limit;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.framing.max_frame_len = max_frame_len;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }
}
