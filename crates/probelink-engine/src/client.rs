use std::time::Duration;

use tracing::instrument;

use crate::error::{EngineError, Result};
use crate::proxy::Proxy;

/// Builds an HTTP client whose connection setup is routed through the given
/// proxy's own tunnel rather than a direct TCP dial. `reqwest` has no public
/// `DialContext`-style override, so the dial step is rebound by handing the
/// client builder a `reqwest::Proxy` constructed from the proxy itself; the
/// proxy is the thing deciding how the tunnel is actually established.
#[instrument(skip(proxy), fields(proxy = proxy.name()))]
pub fn build_probe_client(proxy: &dyn Proxy, timeout: Duration) -> Result<reqwest::Client> {
    let dial_proxy = proxy
        .dial_proxy()
        .map_err(|reason| EngineError::Other(format!("proxy {:?} configuration: {reason}", proxy.name())))?;

    reqwest::Client::builder()
        .proxy(dial_proxy)
        .timeout(timeout)
        .pool_max_idle_per_host(0)
        .build()
        .map_err(EngineError::Network)
}

/// Splits a `host:port` address, returning a zero port on parse failure
/// rather than erroring -- this mirrors a failed probe chunk rather than a
/// configuration error, since the caller always has a concrete host string.
pub fn split_host_port(addr: &str) -> (String, u16) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host.to_owned(), port.parse().unwrap_or(0)),
        None => (addr.to_owned(), 0),
    }
}
