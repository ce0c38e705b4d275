use std::time::Duration;

use clap::Parser;

use probelink_engine::config::{CatalogConfig, EngineConfig, OutputConfig, ProbeConfig, SpeedMode};

/// Probes a catalog of outbound proxies for latency, jitter, packet loss,
/// and throughput, then emits a filtered catalog.
#[derive(Debug, Parser)]
#[command(name = "probelink", version, about)]
pub struct CliArgs {
    /// Configuration file path(s), comma-separated; also accepts http(s) urls.
    #[arg(short = 'c', long = "config", value_name = "PATHS")]
    pub config_paths: String,

    /// Filter proxies by name using a regex.
    #[arg(short = 'f', long = "filter", default_value = ".*")]
    pub filter_regex: String,

    /// Drop proxies whose name contains any of these pipe-separated keywords.
    #[arg(short = 'b', long = "block", default_value = "")]
    pub block_regex: String,

    /// The speed-test origin: a download-server base url or a direct-download url.
    #[arg(long = "server-url")]
    pub server_url: String,

    /// How thoroughly to probe: fast, download, or full.
    #[arg(long = "speed-mode", default_value = "full")]
    pub speed_mode: String,

    /// Shorthand for --speed-mode fast.
    #[arg(long = "fast", default_value_t = false)]
    pub fast: bool,

    /// Total bytes to download per proxy, split across --concurrent chunks.
    #[arg(long = "download-size", default_value = "100MB", value_parser = parse_size)]
    pub download_size: u64,

    /// Total bytes to upload per proxy, split across --concurrent chunks.
    #[arg(long = "upload-size", default_value = "20MB", value_parser = parse_size)]
    pub upload_size: u64,

    /// Per-request timeout.
    #[arg(long = "timeout", default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Number of concurrent chunks per phase.
    #[arg(long = "concurrent", default_value_t = 4)]
    pub concurrent: usize,

    /// Write the filtered catalog here.
    #[arg(long = "output")]
    pub output: Option<String>,

    /// Drop results with latency above this duration (0 disables).
    #[arg(long = "max-latency", default_value = "0s", value_parser = parse_duration)]
    pub max_latency: Duration,

    /// Drop results with packet loss above this percentage.
    #[arg(long = "max-packet-loss", default_value_t = 100.0)]
    pub max_packet_loss: f64,

    /// Drop results with download speed below this (bytes/sec, 0 disables).
    #[arg(long = "min-download-speed", default_value_t = 0.0)]
    pub min_download_speed: f64,

    /// Drop results with upload speed below this (bytes/sec, 0 disables).
    #[arg(long = "min-upload-speed", default_value_t = 0.0)]
    pub min_upload_speed: f64,

    /// Rename surviving proxies using --rename-template.
    #[arg(long = "rename", default_value_t = false)]
    pub rename: bool,

    /// Template for renamed proxies.
    #[arg(long = "rename-template", default_value = "{{Flag}} {{CountryCode}} {{Index}} | {{Direction}} {{Speed}}MB/s")]
    pub rename_template: String,

    /// User-Agent sent on every request.
    #[arg(long = "ua")]
    pub user_agent: Option<String>,

    /// Gist token (also read from GIST_TOKEN).
    #[arg(long = "gist-token", env = "GIST_TOKEN")]
    pub gist_token: Option<String>,

    /// Gist address to publish the output catalog to.
    #[arg(long = "gist-address")]
    pub gist_address: Option<String>,

    /// Repo token (also read from REPO_TOKEN).
    #[arg(long = "repo-token", env = "REPO_TOKEN")]
    pub repo_token: Option<String>,

    /// Repo address (owner/repo or a github.com url) to publish the output catalog to.
    #[arg(long = "repo-address")]
    pub repo_address: Option<String>,

    /// Path within the repo to write the output catalog to.
    #[arg(long = "repo-file-path")]
    pub repo_file_path: Option<String>,

    /// Branch to commit to.
    #[arg(long = "repo-branch")]
    pub repo_branch: Option<String>,

    /// Raise the log level to debug.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    InvalidArgument(String),
}

impl CliArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.config_paths.trim().is_empty() {
            return Err(CliError::InvalidArgument("-c/--config is required".to_owned()));
        }
        if self.server_url.trim().is_empty() {
            return Err(CliError::InvalidArgument("--server-url is required".to_owned()));
        }
        if self.concurrent == 0 {
            return Err(CliError::InvalidArgument("--concurrent must be at least 1".to_owned()));
        }
        Ok(())
    }

    pub fn speed_mode(&self) -> Result<SpeedMode, CliError> {
        if self.fast {
            return Ok(SpeedMode::Fast);
        }
        SpeedMode::parse(&self.speed_mode).map_err(CliError::InvalidArgument)
    }

    pub fn into_engine_config(self) -> Result<EngineConfig, CliError> {
        let mode = self.speed_mode()?;

        Ok(EngineConfig {
            catalog: CatalogConfig {
                config_paths: self.config_paths,
                filter_regex: self.filter_regex,
                block_regex: self.block_regex,
            },
            probe: ProbeConfig {
                server_url: self.server_url,
                mode,
                download_size: self.download_size,
                upload_size: self.upload_size,
                timeout: self.timeout,
                concurrent: self.concurrent,
                user_agent: self
                    .user_agent
                    .unwrap_or_else(|| probelink_engine::config::DEFAULT_USER_AGENT.to_owned()),
            },
            output: OutputConfig {
                output_path: self.output,
                max_latency: self.max_latency,
                max_packet_loss: self.max_packet_loss,
                min_download_speed: self.min_download_speed,
                min_upload_speed: self.min_upload_speed,
                rename_nodes: self.rename,
                rename_template: self.rename_template,
                gist_token: self.gist_token,
                gist_address: self.gist_address,
                repo_token: self.repo_token,
                repo_address: self.repo_address,
                repo_file_path: self.repo_file_path,
                repo_branch: self.repo_branch,
            },
        })
    }
}

/// Parses human-friendly byte sizes like `100MB`/`1GiB`/`2048`.
fn parse_size(input: &str) -> Result<u64, String> {
    let trimmed = input.trim();
    let split_at = trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split_at);
    let value: u64 = digits.parse().map_err(|_| format!("invalid size {input:?}"))?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "kb" | "k" => 1024,
        "mb" | "m" => 1024 * 1024,
        "gb" | "g" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit {other:?} in {input:?}")),
    };

    Ok(value * multiplier)
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    humantime::parse_duration(input).map_err(|e| format!("invalid duration {input:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_megabyte_sizes() {
        assert_eq!(parse_size("100MB").unwrap(), 100 * 1024 * 1024);
        assert_eq!(parse_size("2048").unwrap(), 2048);
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(parse_size("10XB").is_err());
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
    }
}
