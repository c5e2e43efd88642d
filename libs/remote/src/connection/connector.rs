use lossless_core::ServiceEndpoint;
use lossless_fabric::transport::{FramingConfig, TcpTransport};
use lossless_fabric::{Error, Result, Transport};

/// Opens a framed stream to an endpoint
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &ServiceEndpoint) -> Result<Transport>;
}

/// Plain TCP, trying the endpoint's resolved addresses in order
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    framing: FramingConfig,
}

impl TcpConnector {
    pub fn new(framing: FramingConfig) -> Self {
        Self { framing }
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &ServiceEndpoint) -> Result<Transport> {
        if endpoint.addresses().is_empty() {
            return Err(Error::Custom(format!(
                "endpoint {} has no resolved address",
                endpoint.id()
            )));
        }

        let transport = TcpTransport::builder()
            .addresses(endpoint.addresses().iter().copied())
            .framing(self.framing)
            .nodelay(true)
            .connect()
            .await?;

        Ok(transport.into_transport())
    }
}
