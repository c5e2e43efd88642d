//! mDNS/Bonjour browsing via `mdns-sd`.
//!
//! Resolved services become [`BrowseEvent::Added`] with their TXT record as
//! metadata; removals carry only the instance's full name, which is also the
//! endpoint identity.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use lossless_core::{EndpointId, ServiceEndpoint};
use mdns_sd::{ResolvedService, ServiceDaemon, ServiceEvent};
use tokio::sync::mpsc;

use super::{BrowseEvent, BrowseStream, Browser};
use crate::error::{ClientError, Result};

/// [`Browser`] backed by an mDNS service daemon
///
/// The daemon runs its own background thread; it is shut down on drop.
pub struct MdnsBrowser {
    daemon: ServiceDaemon,
}

impl MdnsBrowser {
    pub fn new() -> Result<Self> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| ClientError::Discovery(format!("mDNS daemon error: {e}")))?;
        Ok(Self { daemon })
    }
}

impl Browser for MdnsBrowser {
    fn browse(&self, service_type: &str) -> Result<BrowseStream> {
        let receiver = self
            .daemon
            .browse(service_type)
            .map_err(|e| ClientError::Discovery(format!("mDNS browse failed: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Ok(event) = receiver.recv_async().await {
                let event = match event {
                    ServiceEvent::ServiceResolved(info) => {
                        tracing::trace!(fullname = %info.fullname, "[mDNS] service resolved");
                        BrowseEvent::Added(endpoint_from_resolved(&info))
                    }
                    ServiceEvent::ServiceRemoved(_, fullname) => {
                        BrowseEvent::Removed(EndpointId::new(fullname))
                    }
                    _ => continue,
                };

                if tx.send(event).is_err() {
                    break;
                }
            }
            tracing::debug!("[mDNS] browse receiver closed");
        });

        Ok(rx)
    }

    fn stop_browse(&self, service_type: &str) {
        if let Err(e) = self.daemon.stop_browse(service_type) {
            tracing::warn!("[mDNS] Failed to stop browse: {:?}", e);
        }
    }
}

impl Drop for MdnsBrowser {
    fn drop(&mut self) {
        if let Err(e) = self.daemon.shutdown() {
            tracing::debug!("[mDNS] daemon shutdown: {:?}", e);
        }
    }
}

fn endpoint_from_resolved(info: &ResolvedService) -> ServiceEndpoint {
    build_endpoint(
        &info.fullname,
        info.addresses.iter().map(|addr| addr.to_ip_addr()),
        info.port,
        info.txt_properties
            .iter()
            .map(|property| (property.key().to_string(), property.val_str().to_string())),
    )
}

/// IPv4 addresses first; they are tried in order when connecting
fn build_endpoint(
    fullname: &str,
    ips: impl Iterator<Item = IpAddr>,
    port: u16,
    txt: impl Iterator<Item = (String, String)>,
) -> ServiceEndpoint {
    let mut addresses: Vec<SocketAddr> = ips.map(|ip| SocketAddr::new(ip, port)).collect();
    addresses.sort_by_key(|addr| addr.is_ipv6());

    let metadata: BTreeMap<String, String> = txt.collect();
    ServiceEndpoint::new(fullname, addresses).with_metadata(metadata)
}
