use std::fmt;

use reqwest::Proxy as ReqwestProxy;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// The proxy kinds this engine knows how to keep. Anything else is dropped
/// silently while loading a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyKind {
    Shadowsocks,
    ShadowsocksR,
    Snell,
    Socks5,
    Http,
    Vmess,
    Vless,
    Trojan,
    Hysteria,
    Hysteria2,
    Wireguard,
    Tuic,
    Ssh,
    Mieru,
    Anytls,
    Sudoku,
}

impl ProxyKind {
    /// Matches the `type` field of a catalog entry against the supported kinds.
    /// Accepts both the `hysteria2` and `hysteria-2` spellings seen in the wild.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Some(match normalized.as_str() {
            "ss" | "shadowsocks" => Self::Shadowsocks,
            "ssr" | "shadowsocksr" => Self::ShadowsocksR,
            "snell" => Self::Snell,
            "socks5" => Self::Socks5,
            "http" => Self::Http,
            "vmess" => Self::Vmess,
            "vless" => Self::Vless,
            "trojan" => Self::Trojan,
            "hysteria" => Self::Hysteria,
            "hysteria2" | "hysteria-2" => Self::Hysteria2,
            "wireguard" => Self::Wireguard,
            "tuic" => Self::Tuic,
            "ssh" => Self::Ssh,
            "mieru" => Self::Mieru,
            "anytls" => Self::Anytls,
            "sudoku" => Self::Sudoku,
            _ => return None,
        })
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shadowsocks => "ss",
            Self::ShadowsocksR => "ssr",
            Self::Snell => "snell",
            Self::Socks5 => "socks5",
            Self::Http => "http",
            Self::Vmess => "vmess",
            Self::Vless => "vless",
            Self::Trojan => "trojan",
            Self::Hysteria => "hysteria",
            Self::Hysteria2 => "hysteria2",
            Self::Wireguard => "wireguard",
            Self::Tuic => "tuic",
            Self::Ssh => "ssh",
            Self::Mieru => "mieru",
            Self::Anytls => "anytls",
            Self::Sudoku => "sudoku",
        };
        f.write_str(s)
    }
}

/// The capability set the probe engine actually needs from a proxy: a name,
/// a kind (for display/filtering), the ability to establish a tunnel to a
/// destination, and its raw config tree (for server/port extraction and
/// pass-through on output). The real tunneling implementation is an
/// out-of-scope collaborator; this crate ships one concrete adapter,
/// [`ReqwestProxyDialer`], that treats the proxy's `server:port` as a
/// standard forward proxy reqwest already knows how to talk to.
pub trait Proxy: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ProxyKind;
    fn config(&self) -> &Value;

    /// Build a `reqwest::Proxy` that routes connections through this proxy.
    fn dial_proxy(&self) -> Result<ReqwestProxy, String>;
}

/// The one concrete [`Proxy`] implementation shipped with this crate: it
/// reads `server`/`port` (and optional `username`/`password`) out of the raw
/// config tree and builds a `reqwest::Proxy` pointed at that endpoint.
#[derive(Debug, Clone)]
pub struct ReqwestProxyDialer {
    name: String,
    kind: ProxyKind,
    config: Value,
}

impl ReqwestProxyDialer {
    pub fn new(name: String, kind: ProxyKind, config: Value) -> Self {
        Self { name, kind, config }
    }

    pub fn server(&self) -> Option<String> {
        self.config
            .get("server")
            .and_then(value_as_string)
    }

    pub fn port(&self) -> Option<u16> {
        self.config.get("port").and_then(|v| {
            v.as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        })
    }
}

impl Proxy for ReqwestProxyDialer {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProxyKind {
        self.kind
    }

    fn config(&self) -> &Value {
        &self.config
    }

    fn dial_proxy(&self) -> Result<ReqwestProxy, String> {
        let server = self.server().ok_or_else(|| "missing server".to_owned())?;
        let port = self.port().unwrap_or(0);
        let url = format!("http://{server}:{port}");
        let mut proxy = ReqwestProxy::all(&url).map_err(|e| format!("invalid proxy endpoint: {e}"))?;

        if let (Some(username), Some(password)) = (
            self.config.get("username").and_then(value_as_string),
            self.config.get("password").and_then(value_as_string),
        ) {
            proxy = proxy.basic_auth(&username, &password);
        }

        Ok(proxy)
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!(ProxyKind::parse("ss"), Some(ProxyKind::Shadowsocks));
        assert_eq!(ProxyKind::parse("Hysteria2"), Some(ProxyKind::Hysteria2));
        assert_eq!(ProxyKind::parse("hysteria-2"), Some(ProxyKind::Hysteria2));
        assert_eq!(ProxyKind::parse("wireguard"), Some(ProxyKind::Wireguard));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(ProxyKind::parse("quic-unknown"), None);
    }

    #[test]
    fn builds_dial_proxy_from_config() {
        let config: Value = serde_yaml::from_str("server: 1.2.3.4\nport: 443\n").unwrap();
        let dialer = ReqwestProxyDialer::new("node".to_owned(), ProxyKind::Trojan, config);
        assert_eq!(dialer.server().as_deref(), Some("1.2.3.4"));
        assert_eq!(dialer.port(), Some(443));
        assert!(dialer.dial_proxy().is_ok());
    }

    #[test]
    fn missing_server_is_an_error() {
        let config: Value = serde_yaml::from_str("port: 443\n").unwrap();
        let dialer = ReqwestProxyDialer::new("node".to_owned(), ProxyKind::Trojan, config);
        assert!(dialer.dial_proxy().is_err());
    }
}
