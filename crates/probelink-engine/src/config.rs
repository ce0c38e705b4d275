use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("probelink/", env!("CARGO_PKG_VERSION"));

/// How thoroughly a proxy is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    /// Latency/jitter/packet-loss only.
    Fast,
    /// Latency plus a download throughput phase.
    Download,
    /// Latency plus download and upload throughput phases.
    Full,
}

impl SpeedMode {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "download" => Ok(Self::Download),
            "full" => Ok(Self::Full),
            other => Err(format!("unsupported speed mode {other:?}")),
        }
    }

    pub fn is_fast(self) -> bool {
        matches!(self, Self::Fast)
    }

    pub fn upload_enabled(self) -> bool {
        matches!(self, Self::Full)
    }
}

/// Where proxies come from and which ones are eligible.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Comma-separated local paths and/or http(s) URLs.
    pub config_paths: String,
    /// Keep proxies whose name matches this regex.
    pub filter_regex: String,
    /// Pipe-separated, case-insensitive substrings; drop matching names.
    pub block_regex: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            config_paths: String::new(),
            filter_regex: ".*".to_owned(),
            block_regex: String::new(),
        }
    }
}

/// Controls a single probe run against the filtered catalog.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub server_url: String,
    pub mode: SpeedMode,
    pub download_size: u64,
    pub upload_size: u64,
    pub timeout: Duration,
    pub concurrent: usize,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            mode: SpeedMode::Full,
            download_size: 100 * 1024 * 1024,
            upload_size: 20 * 1024 * 1024,
            timeout: Duration::from_secs(5),
            concurrent: 4,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

/// Threshold filter and destination for the emitted catalog.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub output_path: Option<String>,
    pub max_latency: Duration,
    pub max_packet_loss: f64,
    pub min_download_speed: f64,
    pub min_upload_speed: f64,
    pub rename_nodes: bool,
    pub rename_template: String,
    pub gist_token: Option<String>,
    pub gist_address: Option<String>,
    pub repo_token: Option<String>,
    pub repo_address: Option<String>,
    pub repo_file_path: Option<String>,
    pub repo_branch: Option<String>,
}

pub const DEFAULT_RENAME_TEMPLATE: &str = "{{Flag}} {{CountryCode}} {{Index}} | {{Direction}} {{Speed}}MB/s";

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            max_latency: Duration::from_secs(0),
            // A no-op threshold: see DESIGN.md's "maxPacketLoss semantics" decision.
            max_packet_loss: 100.0,
            min_download_speed: 0.0,
            min_upload_speed: 0.0,
            rename_nodes: false,
            rename_template: DEFAULT_RENAME_TEMPLATE.to_owned(),
            gist_token: None,
            gist_address: None,
            repo_token: None,
            repo_address: None,
            repo_file_path: None,
            repo_branch: None,
        }
    }
}

/// Aggregates the sub-configs needed to run one end-to-end probe pass.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub catalog: CatalogConfig,
    pub probe: ProbeConfig,
    pub output: OutputConfig,
}
