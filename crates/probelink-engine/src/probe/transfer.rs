use std::time::Instant;

use tokio::task::JoinSet;

use crate::result::{ChunkOutcome, TransferSummary};
use crate::server_target::ServerTarget;
use crate::zero_source::ZeroSource;

/// Runs the download phase: `concurrent` parallel chunk GETs, joined into a
/// single [`TransferSummary`]. Each chunk measures only the time to drain
/// its own response body, not connection setup.
pub async fn run_download(
    client: &reqwest::Client,
    target: &ServerTarget,
    total_size: u64,
    concurrent: usize,
) -> TransferSummary {
    let mut summary = TransferSummary::new();
    let chunk_size = if concurrent == 0 { 0 } else { total_size / concurrent as u64 };
    if chunk_size == 0 {
        return summary;
    }

    let mut tasks = JoinSet::new();
    for _ in 0..concurrent {
        let client = client.clone();
        let url = download_chunk_url(target, chunk_size);
        let use_range = matches!(target, ServerTarget::DirectDownload { .. });
        tasks.spawn(async move { download_chunk(&client, &url, chunk_size, use_range).await });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => summary.add(outcome),
            Err(err) => summary.add(ChunkOutcome::Error(format!("download task panicked: {err}"))),
        }
    }

    summary
}

/// Runs the upload phase: `concurrent` parallel chunk POSTs of zero-filled
/// bodies, joined into a single [`TransferSummary`].
pub async fn run_upload(client: &reqwest::Client, up_url: &str, total_size: u64, concurrent: usize) -> TransferSummary {
    let mut summary = TransferSummary::new();
    let chunk_size = if concurrent == 0 { 0 } else { total_size / concurrent as u64 };
    if chunk_size == 0 {
        return summary;
    }

    let mut tasks = JoinSet::new();
    for _ in 0..concurrent {
        let client = client.clone();
        let url = up_url.to_owned();
        tasks.spawn(async move { upload_chunk(&client, &url, chunk_size).await });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => summary.add(outcome),
            Err(err) => summary.add(ChunkOutcome::Error(format!("upload task panicked: {err}"))),
        }
    }

    summary
}

fn download_chunk_url(target: &ServerTarget, chunk_size: u64) -> String {
    match target {
        ServerTarget::DownloadServer { base_url } => format!("{base_url}/__down?bytes={chunk_size}"),
        ServerTarget::DirectDownload { download_url } => download_url.clone(),
    }
}

async fn download_chunk(client: &reqwest::Client, url: &str, chunk_size: u64, use_range: bool) -> ChunkOutcome {
    let start = Instant::now();
    let mut request = client.get(url);
    if use_range {
        request = request.header(reqwest::header::RANGE, format!("bytes=0-{}", chunk_size.saturating_sub(1)));
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) => return ChunkOutcome::Error(format!("download request to {url} failed: {err}")),
    };

    let status = response.status();
    if !(status.as_u16() == 200 || status.as_u16() == 206) {
        return ChunkOutcome::Error(format!(
            "download response from {url} returned {status}, spent {:?}",
            start.elapsed()
        ));
    }

    let mut bytes = 0u64;
    let mut stream = response;
    loop {
        match stream.chunk().await {
            Ok(Some(chunk)) => bytes += chunk.len() as u64,
            Ok(None) => break,
            Err(err) => return ChunkOutcome::Error(format!("download body from {url} failed: {err}")),
        }
    }

    ChunkOutcome::Success {
        bytes,
        duration: start.elapsed(),
    }
}

async fn upload_chunk(client: &reqwest::Client, url: &str, chunk_size: u64) -> ChunkOutcome {
    let start = Instant::now();
    let mut source = ZeroSource::new(chunk_size);
    let mut body = Vec::with_capacity(chunk_size as usize);
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = source.fill(&mut buf);
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }

    let response = match client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => return ChunkOutcome::Error(format!("upload request to {url} failed: {err}")),
    };

    if response.status().as_u16() != 200 {
        return ChunkOutcome::Error(format!("upload response from {url} returned {}", response.status()));
    }

    ChunkOutcome::Success {
        bytes: chunk_size,
        duration: start.elapsed(),
    }
}
