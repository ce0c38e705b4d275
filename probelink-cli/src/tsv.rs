use std::io::Write;

use probelink_engine::config::SpeedMode;
use probelink_engine::result::ProbeResult;

/// Writes results as a tab-separated table to `out`, header first. Used
/// whenever stdout isn't a terminal, so piping to a file or another tool
/// produces plain, scriptable text instead of the interactive TUI.
pub fn write_tsv<W: Write>(out: &mut W, results: &[ProbeResult], mode: SpeedMode) -> std::io::Result<()> {
    writeln!(out, "{}", probelink_engine::output::format::headers(mode).join("\t"))?;
    for (index, result) in results.iter().enumerate() {
        let row = probelink_engine::output::format::format_row(result, mode, index);
        writeln!(out, "{}", row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use serde_yaml::Value;

    fn sample() -> ProbeResult {
        ProbeResult {
            sequence: 0,
            proxy_name: "node".to_owned(),
            proxy_type: "ss".to_owned(),
            proxy_config: Value::Null,
            latency: Duration::from_millis(50),
            jitter: Duration::from_millis(5),
            packet_loss: 0.0,
            download_size: 1,
            download_time: Duration::from_secs(1),
            download_speed: 1024.0 * 1024.0,
            download_error: None,
            upload_size: 0,
            upload_time: Duration::ZERO,
            upload_speed: 0.0,
            upload_error: None,
        }
    }

    #[test]
    fn writes_header_and_one_row_per_result() {
        let mut buf = Vec::new();
        write_tsv(&mut buf, &[sample()], SpeedMode::Download).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap().split('\t').count(), 7);
        assert!(lines.next().unwrap().contains("node"));
    }
}
