use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use serde_yaml::Value;
use tracing::warn;

use crate::config::{OutputConfig, SpeedMode};
use crate::error::{EngineError, Result};
use crate::output::{gist, repo};
use crate::rename::rename_node;
use crate::result::ProbeResult;

/// A trait for looking up a country code from a server address. The real
/// reverse-geolocation lookup is an out-of-scope collaborator; callers
/// that don't configure one get `None` back, which keeps the original name.
#[async_trait::async_trait]
pub trait GeoLookup: Send + Sync {
    async fn country_code(&self, server: &str) -> Option<String>;
}

#[derive(Serialize)]
struct OutputCatalog {
    proxies: Vec<Value>,
}

fn passes_thresholds(result: &ProbeResult, config: &OutputConfig, mode: SpeedMode) -> bool {
    if !config.max_latency.is_zero() && result.latency > config.max_latency {
        return false;
    }
    if result.packet_loss > config.max_packet_loss {
        return false;
    }
    if result.download_size > 0 && config.min_download_speed > 0.0 && result.download_speed < config.min_download_speed {
        return false;
    }
    if mode.upload_enabled() && config.min_upload_speed > 0.0 && result.upload_speed < config.min_upload_speed {
        return false;
    }
    true
}

/// Filters, optionally renames, and serializes the survivors into the
/// catalog YAML string that gets written to disk and/or published.
pub async fn build_output_yaml(
    results: &[ProbeResult],
    config: &OutputConfig,
    mode: SpeedMode,
    geo: Option<&dyn GeoLookup>,
) -> Result<String> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut proxies = Vec::new();

    for result in results {
        if !passes_thresholds(result, config, mode) {
            continue;
        }

        let Some(server) = result.server() else { continue };
        let mut entry = result.proxy_config.clone();
        let Value::Mapping(map) = &mut entry else { continue };
        if !map.contains_key(Value::String("name".into())) {
            continue;
        }

        if config.rename_nodes {
            let country_code = match geo {
                Some(geo) => geo.country_code(&server).await.unwrap_or_default(),
                None => String::new(),
            };
            if !country_code.is_empty() {
                let new_name = rename_node(
                    &country_code,
                    result.download_speed,
                    result.upload_speed,
                    &mut counts,
                    &config.rename_template,
                );
                map.insert(Value::String("name".into()), Value::String(new_name));
            }
        }

        proxies.push(entry);
    }

    let catalog = OutputCatalog { proxies };
    serde_yaml::to_string(&catalog).map_err(|e| EngineError::Output(e.to_string()))
}

/// Writes `yaml` to `path`, creating parent directories if needed.
pub async fn write_output_file(path: &str, yaml: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, yaml).await.map_err(EngineError::Io)
}

/// Publishes `yaml` to a gist and/or a repo, per whichever credentials are
/// configured. Publish failures are warnings, not fatal errors -- the local
/// file (if any) has already been written by the time this runs.
pub async fn publish(client: &reqwest::Client, config: &OutputConfig, yaml: &str) {
    if let (Some(token), Some(address)) = (&config.gist_token, &config.gist_address) {
        let filename = config
            .output_path
            .as_deref()
            .and_then(|p| Path::new(p).file_name())
            .and_then(|f| f.to_str())
            .unwrap_or("proxies.yaml");
        if let Err(err) = gist::update_gist_file(client, None, token, address, filename, yaml).await {
            warn!(error = %err, "failed to publish to gist");
        }
    }

    if let (Some(token), Some(address)) = (&config.repo_token, &config.repo_address) {
        let file_path = config.repo_file_path.as_deref().unwrap_or("proxies.yaml");
        let branch = config.repo_branch.as_deref().unwrap_or("");
        if let Err(err) = repo::update_repo_file(client, None, token, address, file_path, branch, yaml).await {
            warn!(error = %err, "failed to publish to repo");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_result(server: &str, latency_ms: u64) -> ProbeResult {
        ProbeResult {
            sequence: 0,
            proxy_name: "node".to_owned(),
            proxy_type: "ss".to_owned(),
            proxy_config: serde_yaml::from_str(&format!("name: node\nserver: {server}\nport: 443\n")).unwrap(),
            latency: Duration::from_millis(latency_ms),
            jitter: Duration::ZERO,
            packet_loss: 0.0,
            download_size: 1,
            download_time: Duration::ZERO,
            download_speed: 10.0,
            download_error: None,
            upload_size: 0,
            upload_time: Duration::ZERO,
            upload_speed: 0.0,
            upload_error: None,
        }
    }

    #[tokio::test]
    async fn filters_by_max_latency() {
        let mut config = OutputConfig::default();
        config.max_latency = Duration::from_millis(100);
        let results = vec![sample_result("1.1.1.1", 500)];
        let yaml = build_output_yaml(&results, &config, SpeedMode::Download, None).await.unwrap();
        assert!(yaml.contains("proxies: []") || !yaml.contains("1.1.1.1"));
    }

    #[tokio::test]
    async fn keeps_results_within_thresholds() {
        let config = OutputConfig::default();
        let results = vec![sample_result("1.1.1.1", 50)];
        let yaml = build_output_yaml(&results, &config, SpeedMode::Download, None).await.unwrap();
        assert!(yaml.contains("1.1.1.1"));
    }
}
