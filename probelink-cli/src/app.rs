use std::io::IsTerminal;
use std::sync::Arc;

use probelink_engine::catalog::load_proxies;
use probelink_engine::config::{EngineConfig, SpeedMode};
use probelink_engine::output::{build_output_yaml, publish, write_output_file};
use probelink_engine::result::{self, ProbeResult, ResultStore};
use probelink_engine::ProbeEngine;
use tokio::sync::mpsc;
use tracing::info;

use crate::worker;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] probelink_engine::EngineError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("no proxies matched the catalog filters")]
    EmptyCatalog,
}

/// Loads the catalog, probes every surviving proxy, renders either the
/// interactive TUI or a TSV table depending on whether stdout is a
/// terminal, then writes/publishes the filtered output catalog.
pub async fn run(config: EngineConfig) -> Result<(), AppError> {
    let catalog_client = reqwest::Client::builder().user_agent(config.probe.user_agent.clone()).build()?;

    let proxies = load_proxies(&catalog_client, &config.catalog, &config.probe.user_agent).await?;
    if proxies.is_empty() {
        return Err(AppError::EmptyCatalog);
    }
    info!(count = proxies.len(), "catalog loaded");

    let engine = Arc::new(ProbeEngine::new(config.probe.clone())?);
    let mode = engine.mode();
    let thresholds = config.output.output_path.is_some().then(|| config.output.clone());

    let mut entries: Vec<(String, Arc<dyn probelink_engine::Proxy>)> = proxies.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let total = entries.len();

    let (tx, rx) = mpsc::channel(total.max(1));
    let worker_engine = engine.clone();
    let worker_handle = tokio::spawn(worker::run(worker_engine, entries, thresholds, tx));

    let results = if std::io::stdout().is_terminal() {
        crate::tui::run_tui(mode, total, rx).await?
    } else {
        collect_all(rx, mode).await
    };
    let _ = worker_handle.await;

    if !std::io::stdout().is_terminal() {
        crate::tsv::write_tsv(&mut std::io::stdout(), &results, mode)?;
    }

    if let Some(output_path) = &config.output.output_path {
        let yaml = build_output_yaml(&results, &config.output, mode, None).await?;
        write_output_file(output_path, &yaml).await?;
        info!(path = output_path, "wrote output catalog");
        publish(&catalog_client, &config.output, &yaml).await;
    }

    Ok(())
}

/// Drains every result off `rx`, then sorts and deduplicates them the same
/// way the TUI's live table does, so a piped run and an interactive run
/// produce the same row order.
async fn collect_all(mut rx: mpsc::Receiver<ProbeResult>, mode: SpeedMode) -> Vec<ProbeResult> {
    let mut store = ResultStore::new();
    while let Some(result) = rx.recv().await {
        store.push(result);
    }
    let (column, ascending) = result::default_sort(mode);
    store.sort_by(column, ascending);
    store.dedup_by_endpoint();
    store.into_vec()
}
