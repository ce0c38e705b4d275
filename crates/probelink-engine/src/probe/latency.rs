use std::time::{Duration, Instant};

use tracing::debug;

const PROBE_ATTEMPTS: u32 = 6;
const PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// Outcome of the latency/jitter/packet-loss phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyProbe {
    pub latency: Duration,
    pub jitter: Duration,
    pub packet_loss: f64,
}

/// Issues `PROBE_ATTEMPTS` HEAD requests against `url`, 100ms apart,
/// deriving latency (mean round-trip), jitter (population standard
/// deviation of the samples), and packet loss (failure ratio).
pub async fn probe_latency(client: &reqwest::Client, url: &str) -> LatencyProbe {
    let mut samples = Vec::with_capacity(PROBE_ATTEMPTS as usize);
    let mut failures = 0u32;

    for attempt in 0..PROBE_ATTEMPTS {
        let start = Instant::now();
        match client.head(url).send().await {
            Ok(response) if response.status().is_success() => {
                samples.push(start.elapsed());
            }
            Ok(response) => {
                debug!(status = %response.status(), "latency probe returned non-success");
                failures += 1;
            }
            Err(err) => {
                debug!(error = %err, "latency probe request failed");
                failures += 1;
            }
        }

        if attempt + 1 < PROBE_ATTEMPTS {
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    }

    let packet_loss = (failures as f64 / PROBE_ATTEMPTS as f64) * 100.0;

    if samples.is_empty() {
        return LatencyProbe {
            latency: Duration::ZERO,
            jitter: Duration::ZERO,
            packet_loss,
        };
    }

    let mean_nanos = samples.iter().map(Duration::as_nanos).sum::<u128>() / samples.len() as u128;
    let latency = Duration::from_nanos(mean_nanos as u64);

    let variance = samples
        .iter()
        .map(|s| {
            let diff = s.as_nanos() as f64 - mean_nanos as f64;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    let jitter = Duration::from_nanos(variance.sqrt() as u64);

    LatencyProbe {
        latency,
        jitter,
        packet_loss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_probe_is_zeroed() {
        let probe = LatencyProbe::default();
        assert_eq!(probe.latency, Duration::ZERO);
        assert_eq!(probe.packet_loss, 0.0);
    }
}
