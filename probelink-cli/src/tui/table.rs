use std::time::Duration;

use probelink_engine::config::SpeedMode;
use probelink_engine::result::ProbeResult;
use ratatui::style::Color;

const COLUMN_PADDING: u16 = 2;

/// Appends a sort-direction glyph to the active column, and a neutral
/// "either way" glyph to the rest -- matches the clickable-header affordance
/// of the original table.
pub fn headers_with_sort_indicator(headers: &[&str], sort_column: usize, ascending: bool) -> Vec<String> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == sort_column {
                let arrow = if ascending { "\u{2191}" } else { "\u{2193}" };
                format!("{h} {arrow}")
            } else {
                format!("{h} \u{21c5}")
            }
        })
        .collect()
}

/// Computes per-column widths for the current terminal width, shrinking the
/// widest/least essential columns first so the table never needs horizontal
/// scrolling.
pub fn column_widths(width: u16, mode: SpeedMode) -> Vec<u16> {
    let column_count: u16 = if mode.is_fast() {
        4
    } else if mode.upload_enabled() {
        8
    } else {
        7
    };

    if width == 0 {
        return if mode.is_fast() {
            vec![6, 30, 12, 10]
        } else if mode.upload_enabled() {
            vec![6, 30, 12, 10, 10, 10, 16, 16]
        } else {
            vec![6, 30, 12, 10, 10, 10, 16]
        };
    }

    let available = width.saturating_sub(column_count * COLUMN_PADDING);

    if mode.is_fast() {
        let (index_w, type_w, latency_w) = (6u16, 12u16, 10u16);
        let fixed = index_w + type_w + latency_w;
        let name_w = available.saturating_sub(fixed).max(4);
        let widths = vec![index_w, name_w, type_w, latency_w];
        let mins = vec![4, 4, 6, 6];
        let shrink_order = [1, 3, 2, 0];
        return shrink_to_fit(width, &widths, &mins, &shrink_order);
    }

    let (index_w, type_w, latency_w, jitter_w, loss_w, download_w, upload_w) = (6u16, 12u16, 10u16, 10u16, 10u16, 16u16, 16u16);

    if mode.upload_enabled() {
        let fixed = index_w + type_w + latency_w + jitter_w + loss_w + download_w + upload_w;
        let name_w = available.saturating_sub(fixed).max(4);
        let widths = vec![index_w, name_w, type_w, latency_w, jitter_w, loss_w, download_w, upload_w];
        let mins = vec![4, 4, 6, 6, 6, 6, 6, 6];
        let shrink_order = [1, 6, 7, 4, 5, 3, 2, 0];
        shrink_to_fit(width, &widths, &mins, &shrink_order)
    } else {
        let fixed = index_w + type_w + latency_w + jitter_w + loss_w + download_w;
        let name_w = available.saturating_sub(fixed).max(4);
        let widths = vec![index_w, name_w, type_w, latency_w, jitter_w, loss_w, download_w];
        let mins = vec![4, 4, 6, 6, 6, 6, 6];
        let shrink_order = [1, 6, 4, 5, 3, 2, 0];
        shrink_to_fit(width, &widths, &mins, &shrink_order)
    }
}

fn shrink_to_fit(window_width: u16, widths: &[u16], mins: &[u16], shrink_order: &[usize]) -> Vec<u16> {
    let mut widths = widths.to_vec();
    let padding = COLUMN_PADDING * widths.len() as u16;
    let max_total = window_width.saturating_sub(padding);
    let total: u16 = widths.iter().sum();
    let mut overflow = total as i32 - max_total as i32;

    while overflow > 0 {
        let mut shrunk = false;
        for &idx in shrink_order {
            if idx >= widths.len() {
                continue;
            }
            if widths[idx] > mins[idx] {
                widths[idx] -= 1;
                overflow -= 1;
                shrunk = true;
                if overflow == 0 {
                    break;
                }
            }
        }
        if !shrunk {
            break;
        }
    }
    widths
}

/// Color threshold for latency/jitter: green under 800ms, yellow under
/// 1500ms, red otherwise (and red outright when unmeasured).
pub fn duration_color(value: Duration) -> Color {
    if value.is_zero() {
        return Color::Red;
    }
    if value < Duration::from_millis(800) {
        Color::Green
    } else if value < Duration::from_millis(1500) {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn packet_loss_color(percent: f64) -> Color {
    if percent < 10.0 {
        Color::Green
    } else if percent < 20.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn download_speed_color(bytes_per_sec: f64) -> Color {
    let mbps = bytes_per_sec / (1024.0 * 1024.0);
    if mbps >= 10.0 {
        Color::Green
    } else if mbps >= 5.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn upload_speed_color(bytes_per_sec: f64) -> Color {
    let mbps = bytes_per_sec / (1024.0 * 1024.0);
    if mbps >= 5.0 {
        Color::Green
    } else if mbps >= 2.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Per-cell colors for one row, in the same column order as [`crate::tsv`]'s
/// `format_row`/`headers`. `None` means "use the default style".
pub fn row_colors(result: &ProbeResult, mode: SpeedMode) -> Vec<Option<Color>> {
    let mut colors = vec![None, None, None, Some(duration_color(result.latency))];
    if mode.is_fast() {
        return colors;
    }
    colors.push(Some(duration_color(result.jitter)));
    colors.push(Some(packet_loss_color(result.packet_loss)));
    colors.push(Some(download_speed_color(result.download_speed)));
    if mode.upload_enabled() {
        colors.push(Some(upload_speed_color(result.upload_speed)));
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_mode_has_four_columns() {
        assert_eq!(column_widths(120, SpeedMode::Fast).len(), 4);
    }

    #[test]
    fn shrinks_name_column_first_when_narrow() {
        let wide = column_widths(200, SpeedMode::Download);
        let narrow = column_widths(40, SpeedMode::Download);
        assert!(narrow[1] <= wide[1]);
    }

    #[test]
    fn sort_indicator_marks_active_column() {
        let headers = ["Index", "Name"];
        let marked = headers_with_sort_indicator(&headers, 1, true);
        assert!(marked[1].ends_with('\u{2191}'));
        assert!(marked[0].ends_with('\u{21c5}'));
    }

    #[test]
    fn zero_latency_is_red() {
        assert_eq!(duration_color(Duration::ZERO), Color::Red);
    }
}
