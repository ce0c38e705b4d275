use std::time::Duration;

/// Formats an elapsed duration as `MM:SS`, or `HH:MM:SS` once it runs past an hour.
pub fn format_duration(value: Duration) -> String {
    let seconds = value.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{remaining:02}")
    } else {
        format!("{minutes:02}:{remaining:02}")
    }
}

/// Projects remaining time from progress-so-far; `N/A` until there's at
/// least one completed proxy to extrapolate from.
pub fn format_eta(elapsed: Duration, current: usize, total: usize) -> String {
    if current == 0 || total == 0 {
        return "N/A".to_owned();
    }
    let progress = current as f64 / total as f64;
    if progress <= 0.0 {
        return "N/A".to_owned();
    }
    let estimated_total = elapsed.div_f64(progress);
    let remaining = estimated_total.saturating_sub(elapsed);
    format_duration(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_short_durations_as_mm_ss() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
    }

    #[test]
    fn formats_long_durations_with_hours() {
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn eta_is_not_available_before_any_progress() {
        assert_eq!(format_eta(Duration::from_secs(10), 0, 10), "N/A");
    }

    #[test]
    fn eta_extrapolates_from_current_progress() {
        let eta = format_eta(Duration::from_secs(10), 5, 10);
        assert_eq!(eta, "00:10");
    }
}
