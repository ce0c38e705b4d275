use crate::config::SpeedMode;
use crate::result::ProbeResult;

/// Column headers for a given mode, in the order [`format_row`] emits them.
pub fn headers(mode: SpeedMode) -> Vec<&'static str> {
    if mode.is_fast() {
        vec!["Index", "Name", "Type", "Latency"]
    } else {
        let mut cols = vec!["Index", "Name", "Type", "Latency", "Jitter", "Loss", "Download"];
        if mode.upload_enabled() {
            cols.push("Upload");
        }
        cols
    }
}

/// Formats one result as a row of display strings, matching [`headers`]'s
/// column order for the same mode.
pub fn format_row(result: &ProbeResult, mode: SpeedMode, index: usize) -> Vec<String> {
    let index_str = format!("{}.", index + 1);
    let latency = format_latency(result.latency);

    if mode.is_fast() {
        return vec![index_str, result.proxy_name.clone(), result.proxy_type.clone(), latency];
    }

    let mut row = vec![
        index_str,
        result.proxy_name.clone(),
        result.proxy_type.clone(),
        latency,
        format_latency(result.jitter),
        format!("{:.1}%", result.packet_loss),
        result.format_download_speed(),
    ];
    if mode.upload_enabled() {
        row.push(result.format_upload_speed());
    }
    row
}

fn format_latency(latency: std::time::Duration) -> String {
    if latency.is_zero() {
        "N/A".to_owned()
    } else {
        format!("{}ms", latency.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_mode_has_four_columns() {
        assert_eq!(headers(SpeedMode::Fast).len(), 4);
    }

    #[test]
    fn full_mode_has_eight_columns() {
        assert_eq!(headers(SpeedMode::Full).len(), 8);
    }
}
