use tracing::warn;

use crate::catalog::raw::RawConfig;
use crate::catalog::sanitize::sanitize_yaml;
use crate::error::{EngineError, Result};

/// Fetches a single catalog source: an `http(s)://` URL is GETed, anything
/// else is read from the filesystem.
pub async fn fetch_source(client: &reqwest::Client, source: &str, user_agent: &str) -> Result<String> {
    if source.starts_with("http") {
        let response = client
            .get(source)
            .header(reqwest::header::USER_AGENT, user_agent)
            .send()
            .await?;
        let body = response.error_for_status()?.text().await?;
        Ok(body)
    } else {
        tokio::fs::read_to_string(source).await.map_err(EngineError::Io)
    }
}

/// Fetches and parses a provider's `url` as its own catalog document.
/// Initialization failures are logged and treated as "skip this provider"
/// by the caller, matching the loader's own disposition table.
pub async fn load_provider(
    client: &reqwest::Client,
    name: &str,
    url: &str,
    user_agent: &str,
) -> Option<RawConfig> {
    let body = match fetch_source(client, url, user_agent).await {
        Ok(body) => body,
        Err(err) => {
            warn!(provider = name, error = %err, "failed to fetch provider, skipping");
            return None;
        }
    };

    let sanitized = sanitize_yaml(&body);
    match serde_yaml::from_str::<RawConfig>(&sanitized) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(provider = name, error = %err, "failed to parse provider, skipping");
            None
        }
    }
}
