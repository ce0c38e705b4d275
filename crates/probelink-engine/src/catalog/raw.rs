use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// The untyped shape of a catalog document: a list of proxy mappings plus
/// named provider indirections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub proxies: Vec<Value>,

    #[serde(default, rename = "proxy-providers")]
    pub proxy_providers: HashMap<String, Value>,
}

/// Names a catalog (or provider) is not allowed to reuse for a provider,
/// since they would collide with reserved top-level behavior.
pub const RESERVED_PROVIDER_NAMES: &[&str] = &["default", "all", "direct", "reject"];

pub fn is_reserved_provider_name(name: &str) -> bool {
    RESERVED_PROVIDER_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let doc = "proxies:\n  - name: a\n    server: 1.1.1.1\n    port: 443\n    type: ss\n";
        let parsed: RawConfig = serde_yaml::from_str(doc).unwrap();
        assert_eq!(parsed.proxies.len(), 1);
        assert!(parsed.proxy_providers.is_empty());
    }

    #[test]
    fn reserved_names_are_case_insensitive() {
        assert!(is_reserved_provider_name("DIRECT"));
        assert!(!is_reserved_provider_name("my-provider"));
    }
}
