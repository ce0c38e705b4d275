use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use probelink_engine::probe::latency::probe_latency;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spins up a minimal HTTP/1.1 server that answers each HEAD request with
/// the next status in `statuses` (in connection order, falling back to 200
/// once exhausted), enough to exercise `probe_latency`'s success/failure
/// accounting without a real proxy.
async fn spawn_status_server(statuses: Vec<u16>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let statuses = statuses.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await.unwrap_or(0);
                let index = counter.fetch_add(1, Ordering::SeqCst);
                let status = statuses.get(index).copied().unwrap_or(200);
                let reason = if status == 200 { "OK" } else { "Internal Server Error" };
                let header =
                    format!("HTTP/1.1 {status} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_latency_counts_only_2xx_as_success() {
    let base_url = spawn_status_server(vec![200, 200, 200, 200, 500, 500]).await;
    let client = reqwest::Client::new();

    let probe = probe_latency(&client, &format!("{base_url}/")).await;

    assert!(probe.latency > std::time::Duration::ZERO);
    assert!((probe.packet_loss - (2.0 / 6.0 * 100.0)).abs() < 0.01);
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_latency_redirect_counts_as_failure() {
    let base_url = spawn_status_server(vec![200, 200, 200, 302, 302, 302]).await;
    let client = reqwest::Client::new();

    let probe = probe_latency(&client, &format!("{base_url}/")).await;

    assert!((probe.packet_loss - (3.0 / 6.0 * 100.0)).abs() < 0.01);
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_latency_all_failures_yields_zero_latency_and_full_loss() {
    let base_url = spawn_status_server(vec![500, 500, 500, 500, 500, 500]).await;
    let client = reqwest::Client::new();

    let probe = probe_latency(&client, &format!("{base_url}/")).await;

    assert_eq!(probe.latency, std::time::Duration::ZERO);
    assert_eq!(probe.jitter, std::time::Duration::ZERO);
    assert_eq!(probe.packet_loss, 100.0);
}
