//! Host address discovery for the remote-access link.

use std::net::Ipv4Addr;

use get_if_addrs::{IfAddr, Interface, get_if_addrs};
use tracing::{debug, warn};

/// First non-loopback IPv4 address of this host, if any.
pub fn primary_ipv4() -> Option<Ipv4Addr> {
    let interfaces = match get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            warn!("Failed to list network interfaces: {}", err);
            return None;
        }
    };

    let ip = first_external_ipv4(&interfaces);
    debug!("Primary IPv4 address: {:?}", ip);
    ip
}

fn first_external_ipv4(interfaces: &[Interface]) -> Option<Ipv4Addr> {
    interfaces.iter().find_map(|iface| match &iface.addr {
        IfAddr::V4(v4) if !v4.ip.is_loopback() => Some(v4.ip),
        _ => None,
    })
}
