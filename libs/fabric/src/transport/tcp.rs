use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::transport::{FramingConfig, Transport};

/// TCP connection with length-prefix framing
///
/// Messages are sent with a 4-byte big-endian length prefix. There are no
/// connect or receive timeouts; a stalled peer blocks until it goes away.
pub struct TcpTransport {
    stream: TcpStream,
    framing: FramingConfig,
}

impl TcpTransport {
    /// Connect to a remote TCP address with default framing
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::builder().address(addr).connect().await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> TcpTransportBuilder {
        TcpTransportBuilder::new()
    }

    /// Create from an existing TcpStream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            framing: FramingConfig::default(),
        }
    }

    /// Split into independently owned, framed read and write halves
    pub fn into_transport(self) -> Transport {
        let (reader, writer) = self.stream.into_split();
        Transport::from_io(reader, writer, self.framing)
    }
}

/// TCP listener for accepting incoming connections
pub struct TcpTransportListener {
    listener: TcpListener,
}

impl TcpTransportListener {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Accept an incoming connection
    pub async fn accept(&self) -> Result<(TcpTransport, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        Ok((TcpTransport::from_stream(stream), addr))
    }

    /// Get the local address this listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }
}

/// Builder for configuring TCP transport
#[derive(Default)]
pub struct TcpTransportBuilder {
    addresses: Vec<SocketAddr>,
    framing: FramingConfig,
    nodelay: bool,
}

impl TcpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address to try; addresses are tried in the order given
    pub fn address(mut self, addr: SocketAddr) -> Self {
        self.addresses.push(addr);
        self
    }

    pub fn addresses(mut self, addrs: impl IntoIterator<Item = SocketAddr>) -> Self {
        self.addresses.extend(addrs);
        self
    }

    /// Set the read-side framing limits
    pub fn framing(mut self, framing: FramingConfig) -> Self {
        self.framing = framing;
        self
    }

    /// Disable Nagle's algorithm on the connected socket
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Connect with the configured settings
    pub async fn connect(self) -> Result<TcpTransport> {
        if self.addresses.is_empty() {
            return Err(Error::Custom("Address not set".to_string()));
        }

        let stream = TcpStream::connect(&self.addresses[..]).await?;
        if self.nodelay {
            stream.set_nodelay(true)?;
        }

        tracing::debug!(peer = ?stream.peer_addr().ok(), "tcp connected");

        Ok(TcpTransport {
            stream,
            framing: self.framing,
        })
    }
}
