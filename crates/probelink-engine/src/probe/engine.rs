use tracing::{debug, instrument};

use crate::client::build_probe_client;
use crate::config::{OutputConfig, ProbeConfig, SpeedMode};
use crate::probe::latency::probe_latency;
use crate::probe::transfer::{run_download, run_upload};
use crate::proxy::Proxy;
use crate::result::ProbeResult;
use crate::server_target::{ServerTarget, resolve};

/// Drives the full latency → download → upload probe pipeline for one
/// proxy at a time. Holds the resolved [`ServerTarget`] and the (possibly
/// mode-downgraded) [`SpeedMode`] once, computed from `config.server_url`.
pub struct ProbeEngine {
    config: ProbeConfig,
    target: ServerTarget,
    mode: SpeedMode,
}

impl ProbeEngine {
    pub fn new(config: ProbeConfig) -> crate::error::Result<Self> {
        let (target, mode) = resolve(&config.server_url, config.mode)?;
        Ok(Self { config, target, mode })
    }

    pub fn mode(&self) -> SpeedMode {
        self.mode
    }

    /// Probes a single proxy, early-terminating against `thresholds` (the
    /// output filter config, when an output path was actually requested) to
    /// avoid spending download/upload budget on proxies that will be
    /// filtered out anyway.
    #[instrument(skip(self, proxy, thresholds), fields(proxy = proxy.name()))]
    pub async fn test_proxy(&self, proxy: &dyn Proxy, thresholds: Option<&OutputConfig>) -> ProbeResult {
        let mut result = ProbeResult {
            sequence: 0,
            proxy_name: proxy.name().to_owned(),
            proxy_type: proxy.kind().to_string(),
            proxy_config: proxy.config().clone(),
            latency: std::time::Duration::ZERO,
            jitter: std::time::Duration::ZERO,
            packet_loss: 0.0,
            download_size: 0,
            download_time: std::time::Duration::ZERO,
            download_speed: 0.0,
            download_error: None,
            upload_size: 0,
            upload_time: std::time::Duration::ZERO,
            upload_speed: 0.0,
            upload_error: None,
        };

        let client = match build_probe_client(proxy, self.config.timeout) {
            Ok(client) => client,
            Err(err) => {
                result.download_error = Some(err.to_string());
                return result;
            }
        };

        let probe_url = latency_probe_url(&self.target);
        let latency_probe = probe_latency(&client, &probe_url).await;
        result.latency = latency_probe.latency;
        result.jitter = latency_probe.jitter;
        result.packet_loss = latency_probe.packet_loss;

        if self.mode.is_fast() || latency_probe.packet_loss >= 100.0 {
            return result;
        }

        if let Some(thresholds) = thresholds {
            if exceeds_latency_or_loss(&result, thresholds) {
                return result;
            }
        }

        result.download_size = self.config.download_size;
        let download_summary = run_download(&client, &self.target, self.config.download_size, self.config.concurrent).await;
        result.download_time = download_summary.average_duration();
        result.download_speed = download_summary.speed();
        result.download_error = download_summary.error();

        if let Some(thresholds) = thresholds {
            if thresholds.min_download_speed > 0.0 && result.download_speed < thresholds.min_download_speed {
                return result;
            }
        }

        if self.mode.upload_enabled() {
            if let ServerTarget::DownloadServer { base_url } = &self.target {
                let up_url = format!("{base_url}/__up");
                result.upload_size = self.config.upload_size;
                let upload_summary = run_upload(&client, &up_url, self.config.upload_size, self.config.concurrent).await;
                result.upload_time = upload_summary.average_duration();
                result.upload_speed = upload_summary.speed();
                result.upload_error = upload_summary.error();
            }
        }

        debug!(download_speed = result.download_speed, "probe complete");
        result
    }
}

fn latency_probe_url(target: &ServerTarget) -> String {
    match target {
        ServerTarget::DownloadServer { base_url } => format!("{base_url}/__down?bytes=0"),
        ServerTarget::DirectDownload { download_url } => download_url.clone(),
    }
}

fn exceeds_latency_or_loss(result: &ProbeResult, thresholds: &OutputConfig) -> bool {
    let latency_exceeded = !thresholds.max_latency.is_zero() && result.latency > thresholds.max_latency;
    let loss_exceeded = result.packet_loss > thresholds.max_packet_loss;
    latency_exceeded || loss_exceeded
}
