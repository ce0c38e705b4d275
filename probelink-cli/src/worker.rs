use std::sync::Arc;

use probelink_engine::config::OutputConfig;
use probelink_engine::proxy::Proxy;
use probelink_engine::result::ProbeResult;
use probelink_engine::ProbeEngine;
use tokio::sync::mpsc;

/// Probes every proxy in `proxies`, one at a time, sending each finished
/// [`ProbeResult`] down `tx` as soon as it's ready. Closes `tx` by dropping
/// it once the last proxy has been probed -- that's how a consumer (the TUI
/// or the TSV collector) knows the run is complete.
pub async fn run(
    engine: Arc<ProbeEngine>,
    proxies: Vec<(String, Arc<dyn Proxy>)>,
    thresholds: Option<OutputConfig>,
    tx: mpsc::Sender<ProbeResult>,
) {
    for (_, proxy) in proxies {
        let result = engine.test_proxy(proxy.as_ref(), thresholds.as_ref()).await;
        if tx.send(result).await.is_err() {
            // Receiver gone (TUI quit early); stop probing the rest.
            break;
        }
    }
}
