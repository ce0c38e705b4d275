use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::catalog::provider::{fetch_source, load_provider};
use crate::catalog::raw::{RawConfig, is_reserved_provider_name};
use crate::catalog::sanitize::sanitize_yaml;
use crate::config::CatalogConfig;
use crate::error::{EngineError, Result};
use crate::proxy::{Proxy, ProxyKind, ReqwestProxyDialer};

/// Normalizes an IPv4-mapped-in-IPv6 address (`::ffff:a.b.c.d`) down to its
/// plain 4-octet form; anything else passes through unchanged.
fn normalize_server(server: &str) -> String {
    server
        .strip_prefix("::ffff:")
        .filter(|rest| rest.parse::<std::net::Ipv4Addr>().is_ok())
        .map(str::to_owned)
        .unwrap_or_else(|| server.to_owned())
}

fn build_proxy(name_override: Option<&str>, entry: &Value) -> Option<(String, Arc<dyn Proxy>)> {
    let name = name_override
        .map(str::to_owned)
        .or_else(|| entry.get("name").and_then(|v| v.as_str()).map(str::to_owned))?;
    let kind_str = entry.get("type").and_then(|v| v.as_str())?;
    let kind = ProxyKind::parse(kind_str)?;

    let mut config = entry.clone();
    if let Value::Mapping(map) = &mut config {
        if let Some(Value::String(server)) = map.get(Value::String("server".into())).cloned() {
            map.insert(Value::String("server".into()), Value::String(normalize_server(&server)));
        }
    }

    Some((name.clone(), Arc::new(ReqwestProxyDialer::new(name, kind, config)) as Arc<dyn Proxy>))
}

/// Loads, merges, normalizes, and filters every proxy reachable from
/// `config.config_paths`. Mirrors the original loader's disposition table:
/// unreadable sources are skipped with a warning, parse failures and
/// duplicate names within one source are fatal, unsupported kinds are
/// dropped silently, and the first occurrence of a name wins across
/// sources.
pub async fn load_proxies(
    client: &reqwest::Client,
    config: &CatalogConfig,
    user_agent: &str,
) -> Result<HashMap<String, Arc<dyn Proxy>>> {
    let mut all_proxies: HashMap<String, Arc<dyn Proxy>> = HashMap::new();

    for source in config.config_paths.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let body = match fetch_source(client, source, user_agent).await {
            Ok(body) => body,
            Err(err) => {
                warn!(source, error = %err, "failed to load catalog source, skipping");
                continue;
            }
        };

        let sanitized = sanitize_yaml(&body);
        let raw: RawConfig = serde_yaml::from_str(&sanitized).map_err(|error| EngineError::CatalogParse {
            source: source.to_owned(),
            error,
        })?;

        let mut source_names = std::collections::HashSet::new();
        for entry in &raw.proxies {
            let Some((name, proxy)) = build_proxy(None, entry) else {
                continue;
            };
            if !source_names.insert(name.clone()) {
                return Err(EngineError::DuplicateProxy {
                    name,
                    source: source.to_owned(),
                });
            }
            all_proxies.entry(name).or_insert(proxy);
        }

        for (provider_name, provider_value) in &raw.proxy_providers {
            if is_reserved_provider_name(provider_name) {
                return Err(EngineError::ReservedProviderName {
                    name: provider_name.clone(),
                });
            }
            let Some(url) = provider_value.get("url").and_then(|v| v.as_str()) else {
                warn!(provider = provider_name, "missing url, skipping");
                continue;
            };

            let Some(provider_config) = load_provider(client, provider_name, url, user_agent).await else {
                continue;
            };

            for entry in &provider_config.proxies {
                let Some(raw_name) = entry.get("name").and_then(|v| v.as_str()) else {
                    continue;
                };
                if entry.get("server").is_none() {
                    continue;
                }
                let namespaced = format!("[{provider_name}] {raw_name}");
                let Some((name, proxy)) = build_proxy(Some(&namespaced), entry) else {
                    continue;
                };
                all_proxies.entry(name).or_insert(proxy);
            }
        }

        debug!(source, proxies = all_proxies.len(), "merged catalog source");
    }

    info!(total = all_proxies.len(), "loaded proxies from all sources");
    Ok(filter_proxies(all_proxies, config)?)
}

fn filter_proxies(
    proxies: HashMap<String, Arc<dyn Proxy>>,
    config: &CatalogConfig,
) -> Result<HashMap<String, Arc<dyn Proxy>>> {
    let include =
        Regex::new(&config.filter_regex).map_err(|e| EngineError::Other(format!("invalid filter regex: {e}")))?;

    let block_keywords: Vec<String> = config
        .block_regex
        .split('|')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(proxies
        .into_iter()
        .filter(|(name, _)| include.is_match(name))
        .filter(|(name, _)| {
            let lower = name.to_ascii_lowercase();
            !block_keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mapped_ipv4() {
        assert_eq!(normalize_server("::ffff:1.2.3.4"), "1.2.3.4");
        assert_eq!(normalize_server("1.2.3.4"), "1.2.3.4");
        assert_eq!(normalize_server("::1"), "::1");
    }

    #[test]
    fn builds_proxy_from_entry() {
        let entry: Value = serde_yaml::from_str("name: a\ntype: ss\nserver: 1.1.1.1\nport: 1\n").unwrap();
        let (name, proxy) = build_proxy(None, &entry).unwrap();
        assert_eq!(name, "a");
        assert_eq!(proxy.kind(), ProxyKind::Shadowsocks);
    }

    #[test]
    fn unsupported_kind_is_dropped() {
        let entry: Value = serde_yaml::from_str("name: a\ntype: quic-unknown\nserver: 1.1.1.1\nport: 1\n").unwrap();
        assert!(build_proxy(None, &entry).is_none());
    }

    #[test]
    fn filters_by_include_and_block() {
        let mut proxies: HashMap<String, Arc<dyn Proxy>> = HashMap::new();
        let entry: Value = serde_yaml::from_str("name: us-node\ntype: ss\nserver: 1.1.1.1\nport: 1\n").unwrap();
        let (name, proxy) = build_proxy(None, &entry).unwrap();
        proxies.insert(name, proxy);
        let entry2: Value = serde_yaml::from_str("name: jp-lag\ntype: ss\nserver: 1.1.1.1\nport: 1\n").unwrap();
        let (name2, proxy2) = build_proxy(None, &entry2).unwrap();
        proxies.insert(name2, proxy2);

        let config = CatalogConfig {
            config_paths: String::new(),
            filter_regex: ".*".to_owned(),
            block_regex: "lag".to_owned(),
        };
        let filtered = filter_proxies(proxies, &config).unwrap();
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("us-node"));
    }
}
