use probelink_engine::config::SpeedMode;
use probelink_engine::result::ProbeResult;

fn format_latency(value: std::time::Duration) -> String {
    if value.is_zero() {
        "N/A".to_owned()
    } else {
        format!("{}ms", value.as_millis())
    }
}

/// Builds the detail panel's line-wrapped content for one result, growing
/// from a minimal latency-only view in fast mode up to download/upload
/// speed and error text in full mode.
pub fn build_detail_content(result: &ProbeResult, width: usize, mode: SpeedMode) -> Vec<String> {
    let mut lines = vec![
        format!("Node: {}", result.proxy_name),
        format!("Type: {}", result.proxy_type),
        String::new(),
        format!("Latency: {}", format_latency(result.latency)),
    ];

    if !mode.is_fast() {
        lines.push(format!("Jitter: {}", format_latency(result.jitter)));
        lines.push(format!("Packet Loss: {:.1}%", result.packet_loss));
        lines.push(String::new());
        lines.push(format!("Download: {:.2}MB/s", result.download_speed / (1024.0 * 1024.0)));
        append_wrapped_value(&mut lines, "Download Error:", result.format_download_error(), width);

        if mode.upload_enabled() {
            lines.push(String::new());
            lines.push(format!("Upload: {:.2}MB/s", result.upload_speed / (1024.0 * 1024.0)));
            append_wrapped_value(&mut lines, "Upload Error:", result.format_upload_error(), width);
        }
    }

    lines.push(String::new());
    lines.push("Press ESC to close details.".to_owned());
    lines
}

fn append_wrapped_value(lines: &mut Vec<String>, label: &str, value: &str, width: usize) {
    let prefix = format!("{label} ");
    let wrap_width = width.saturating_sub(prefix.chars().count()).max(10);
    let wrapped = wrap_text(value, wrap_width);
    for (i, line) in wrapped.iter().enumerate() {
        if i == 0 {
            lines.push(format!("{prefix}{line}"));
        } else {
            lines.push(format!("{}{line}", " ".repeat(prefix.chars().count())));
        }
    }
}

fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_owned()];
    }
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        let words: Vec<&str> = raw_line.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = words[0].to_owned();
        for word in &words[1..] {
            if current.chars().count() + 1 + word.chars().count() > width {
                lines.push(current);
                current = (*word).to_owned();
                continue;
            }
            current.push(' ');
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;
    use std::time::Duration;

    fn sample() -> ProbeResult {
        ProbeResult {
            sequence: 0,
            proxy_name: "node".to_owned(),
            proxy_type: "ss".to_owned(),
            proxy_config: Value::Null,
            latency: Duration::from_millis(100),
            jitter: Duration::from_millis(5),
            packet_loss: 0.0,
            download_size: 1,
            download_time: Duration::ZERO,
            download_speed: 5.0 * 1024.0 * 1024.0,
            download_error: None,
            upload_size: 0,
            upload_time: Duration::ZERO,
            upload_speed: 0.0,
            upload_error: Some("connection reset by peer while uploading a fairly long error message".to_owned()),
        }
    }

    #[test]
    fn fast_mode_omits_throughput_lines() {
        let lines = build_detail_content(&sample(), 60, SpeedMode::Fast);
        assert!(!lines.iter().any(|l| l.starts_with("Download:")));
    }

    #[test]
    fn full_mode_wraps_long_error_text() {
        let lines = build_detail_content(&sample(), 30, SpeedMode::Full);
        let error_lines: Vec<&String> = lines.iter().filter(|l| l.contains("reset") || l.trim_start().starts_with("while")).collect();
        assert!(!error_lines.is_empty());
    }

    #[test]
    fn wrap_text_never_exceeds_width_per_word() {
        let wrapped = wrap_text("a bb ccc dddd eeeee", 5);
        assert!(wrapped.iter().all(|l| l.chars().count() <= 6));
    }
}
