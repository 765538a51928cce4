//! Listen address parsing.

use anyhow::{anyhow, Context};
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

/// Address used when a project does not configure `mocks.host`.
pub const DEFAULT_HOST: &str = "127.0.0.1:8080";

/// Resolve a configured host into a socket address.
///
/// Accepts a full address (`127.0.0.1:8080`, `[::1]:8080`), a bare port
/// (`8080`) or `:8080`, both of which listen on all interfaces, and
/// `hostname:port`, which is resolved once.
pub fn parse_host(host: &str) -> anyhow::Result<SocketAddr> {
    let host = host.trim();
    if host.is_empty() {
        anyhow::bail!("Mock server host must not be empty");
    }

    if let Ok(addr) = host.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let port_only = host.strip_prefix(':').unwrap_or(host);
    if let Ok(port) = port_only.parse::<u16>() {
        return Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)));
    }

    host.to_socket_addrs()
        .with_context(|| format!("Invalid mock server host '{host}'"))?
        .next()
        .ok_or_else(|| anyhow!("Mock server host '{host}' did not resolve to an address"))
}
