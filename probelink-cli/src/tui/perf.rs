use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
struct PerfStats {
    count: u64,
    total: Duration,
    max: Duration,
    last: Duration,
    items_total: u64,
    items_max: usize,
}

/// Lightweight timing instrumentation, enabled only when
/// `PROBELINK_TUI_PERF` is set -- mirrors the original's opt-in sampling so
/// a normal run pays no overhead recording redraw costs.
pub struct PerfTracker {
    enabled: bool,
    log_every: u64,
    stats: HashMap<&'static str, PerfStats>,
}

pub const EVENT_SORT: &str = "sort_results";
pub const EVENT_ROWS: &str = "update_table_rows";
pub const EVENT_LAYOUT: &str = "update_table_layout";

impl PerfTracker {
    pub fn new() -> Self {
        let enabled = std::env::var("PROBELINK_TUI_PERF").map(|v| !v.trim().is_empty()).unwrap_or(false);
        let log_every = std::env::var("PROBELINK_TUI_PERF_LOG_EVERY")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(50);
        Self {
            enabled,
            log_every,
            stats: HashMap::new(),
        }
    }

    pub fn record(&mut self, event: &'static str, items: usize, start: Instant) {
        if !self.enabled {
            return;
        }
        let duration = start.elapsed();
        let stats = self.stats.entry(event).or_default();
        stats.count += 1;
        stats.total += duration;
        stats.last = duration;
        if duration > stats.max {
            stats.max = duration;
        }
        stats.items_total += items as u64;
        if items > stats.items_max {
            stats.items_max = items;
        }

        if self.log_every > 0 && stats.count % self.log_every == 0 {
            let avg = stats.total / stats.count as u32;
            debug!(
                event,
                count = stats.count,
                last = ?stats.last,
                avg = ?avg,
                max = ?stats.max,
                items_total = stats.items_total,
                items_max = stats.items_max,
                "tui-perf"
            );
        }
    }
}

impl Default for PerfTracker {
    fn default() -> Self {
        Self::new()
    }
}
