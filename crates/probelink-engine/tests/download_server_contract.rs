use probelink_engine::probe::transfer::run_download;
use probelink_engine::server_target::ServerTarget;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spins up a minimal HTTP/1.1 server implementing just enough of the
/// `/__down?bytes=N` contract (200, `Content-Length`, N zero bytes) to
/// exercise the download phase end-to-end without a real proxy.
async fn spawn_download_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let bytes = request
                    .lines()
                    .next()
                    .and_then(|line| line.split("bytes=").nth(1))
                    .and_then(|rest| rest.split_whitespace().next())
                    .and_then(|n| n.parse::<usize>().ok())
                    .unwrap_or(0);

                let body = vec![0u8; bytes];
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread")]
async fn download_phase_aggregates_chunks_from_a_real_server() {
    let base_url = spawn_download_server().await;
    let client = reqwest::Client::new();
    let target = ServerTarget::DownloadServer { base_url };

    let summary = run_download(&client, &target, 4096, 4).await;

    assert_eq!(summary.success_count(), 4);
    assert_eq!(summary.total_bytes(), 4096);
    assert!(summary.error().is_none());
    assert!(summary.speed() >= 0.0);
}
