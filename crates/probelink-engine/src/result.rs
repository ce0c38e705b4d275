use std::cmp::Ordering;
use std::time::Duration;

use serde_yaml::Value;

use crate::config::SpeedMode;

/// Commutative aggregation of a probe phase's chunk outcomes: successful
/// chunks accumulate bytes/duration, failures accumulate a deduplicated,
/// insertion-ordered set of error strings. The reported speed is forced to
/// zero the moment any error has been recorded, even if other chunks
/// succeeded.
#[derive(Debug, Clone, Default)]
pub struct TransferSummary {
    total_bytes: u64,
    total_duration: Duration,
    success_count: u32,
    errors: Vec<String>,
}

pub enum ChunkOutcome {
    Success { bytes: u64, duration: Duration },
    Error(String),
}

impl TransferSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: ChunkOutcome) {
        match outcome {
            ChunkOutcome::Success { bytes, duration } => {
                self.total_bytes += bytes;
                self.total_duration += duration;
                self.success_count += 1;
            }
            ChunkOutcome::Error(message) => {
                if !self.errors.contains(&message) {
                    self.errors.push(message);
                }
            }
        }
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn average_duration(&self) -> Duration {
        if self.success_count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.success_count
        }
    }

    /// The raw, error-independent speed value -- used by detail views that
    /// want the number regardless of whether any chunk also failed.
    pub fn speed_value(&self) -> f64 {
        let average = self.average_duration();
        if self.success_count == 0 || average.is_zero() {
            0.0
        } else {
            self.total_bytes as f64 / average.as_secs_f64()
        }
    }

    /// The speed as it should be displayed in a compact row: zero whenever
    /// any chunk error was recorded, regardless of successful chunks.
    pub fn speed(&self) -> f64 {
        if self.errors.is_empty() {
            self.speed_value()
        } else {
            0.0
        }
    }

    pub fn error(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.join("; "))
        }
    }
}

/// A single proxy's aggregated measurement. Carries its own insertion-order
/// `sequence`, assigned by [`ResultStore::push`], rather than relying on
/// identity comparisons to track "the same result" across re-sorts.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub sequence: u64,
    pub proxy_name: String,
    pub proxy_type: String,
    pub proxy_config: Value,
    pub latency: Duration,
    pub jitter: Duration,
    pub packet_loss: f64,
    pub download_size: u64,
    pub download_time: Duration,
    pub download_speed: f64,
    pub download_error: Option<String>,
    pub upload_size: u64,
    pub upload_time: Duration,
    pub upload_speed: f64,
    pub upload_error: Option<String>,
}

impl ProbeResult {
    /// The table-row formatter: prefers the error string over the numeric
    /// speed whenever an error is present.
    pub fn format_download_speed(&self) -> String {
        match &self.download_error {
            Some(err) if self.download_speed == 0.0 => err.clone(),
            _ => format!("{:.2}MB/s", self.download_speed / (1024.0 * 1024.0)),
        }
    }

    pub fn format_upload_speed(&self) -> String {
        match &self.upload_error {
            Some(err) if self.upload_speed == 0.0 => err.clone(),
            _ => format!("{:.2}MB/s", self.upload_speed / (1024.0 * 1024.0)),
        }
    }

    pub fn format_download_error(&self) -> &str {
        self.download_error.as_deref().unwrap_or("N/A")
    }

    pub fn format_upload_error(&self) -> &str {
        self.upload_error.as_deref().unwrap_or("N/A")
    }

    pub fn server(&self) -> Option<String> {
        self.proxy_config.get("server").and_then(|v| v.as_str().map(str::to_owned))
    }

    pub fn port(&self) -> Option<String> {
        self.proxy_config.get("port").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.as_u64().map(|n| n.to_string()).unwrap_or_default(),
        })
    }
}

/// Sort columns, matching the original table's column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Sequence = 0,
    Name = 1,
    Type = 2,
    Latency = 3,
    Jitter = 4,
    Loss = 5,
    Download = 6,
    Upload = 7,
}

impl SortColumn {
    /// Columns where a higher value is better default to descending order.
    pub fn default_ascending(self) -> bool {
        !matches!(self, SortColumn::Download | SortColumn::Upload)
    }
}

/// The default sort column/direction for a freshly started run: latency
/// ascending in fast mode, download speed descending otherwise. Mirrors the
/// original table's initial sort order.
pub fn default_sort(mode: SpeedMode) -> (SortColumn, bool) {
    if mode.is_fast() {
        (SortColumn::Latency, true)
    } else {
        (SortColumn::Download, false)
    }
}

/// A zero `Duration` is treated as "no signal" and sorts as if it were the
/// largest possible duration, so unmeasured proxies sink to the bottom of
/// an ascending sort instead of floating to the top.
fn duration_sort_value(value: Duration) -> Duration {
    if value.is_zero() {
        Duration::MAX
    } else {
        value
    }
}

fn compare_results(a: &ProbeResult, b: &ProbeResult, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Sequence => a.sequence.cmp(&b.sequence),
        SortColumn::Name => a.proxy_name.cmp(&b.proxy_name),
        SortColumn::Type => a.proxy_type.cmp(&b.proxy_type),
        SortColumn::Latency => duration_sort_value(a.latency).cmp(&duration_sort_value(b.latency)),
        SortColumn::Jitter => duration_sort_value(a.jitter).cmp(&duration_sort_value(b.jitter)),
        SortColumn::Loss => a.packet_loss.partial_cmp(&b.packet_loss).unwrap_or(Ordering::Equal),
        SortColumn::Download => a.download_speed.partial_cmp(&b.download_speed).unwrap_or(Ordering::Equal),
        SortColumn::Upload => a.upload_speed.partial_cmp(&b.upload_speed).unwrap_or(Ordering::Equal),
    }
}

/// Append-only collection of results with stable, column-driven sorting and
/// server:port deduplication.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Vec<ProbeResult>,
    next_sequence: u64,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a result, assigning it the next sequence number.
    pub fn push(&mut self, mut result: ProbeResult) {
        result.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter()
    }

    /// Sorts (stably) by `column`, then flips order if `ascending` is false.
    pub fn sort_by(&mut self, column: SortColumn, ascending: bool) {
        self.results.sort_by(|a, b| {
            let ordering = compare_results(a, b, column);
            if ascending { ordering } else { ordering.reverse() }
        });
    }

    /// Deduplicates by `(server, port)`, keeping the first occurrence.
    /// Results missing either field are never deduplicated against anything.
    pub fn dedup_by_endpoint(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.results.retain(|result| {
            match (result.server(), result.port()) {
                (Some(server), Some(port)) => seen.insert((server, port)),
                _ => true,
            }
        });
    }

    pub fn into_vec(self) -> Vec<ProbeResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(sequence: u64, latency_ms: u64) -> ProbeResult {
        ProbeResult {
            sequence,
            proxy_name: format!("node-{sequence}"),
            proxy_type: "ss".to_owned(),
            proxy_config: Value::Null,
            latency: Duration::from_millis(latency_ms),
            jitter: Duration::ZERO,
            packet_loss: 0.0,
            download_size: 0,
            download_time: Duration::ZERO,
            download_speed: 0.0,
            download_error: None,
            upload_size: 0,
            upload_time: Duration::ZERO,
            upload_speed: 0.0,
            upload_error: None,
        }
    }

    #[test]
    fn transfer_summary_aggregates_like_the_original() {
        let mut summary = TransferSummary::new();
        summary.add(ChunkOutcome::Error("E1".to_owned()));
        summary.add(ChunkOutcome::Error("E1".to_owned()));
        summary.add(ChunkOutcome::Error("E2".to_owned()));
        summary.add(ChunkOutcome::Success {
            bytes: 100,
            duration: Duration::from_secs(1),
        });
        summary.add(ChunkOutcome::Success {
            bytes: 50,
            duration: Duration::from_secs(2),
        });

        assert_eq!(summary.success_count(), 2);
        assert_eq!(summary.total_bytes(), 150);
        assert_eq!(summary.average_duration(), Duration::from_millis(1500));
        assert_eq!(summary.speed(), 0.0);
        assert_eq!(summary.error().as_deref(), Some("E1; E2"));
    }

    #[test]
    fn duration_sort_treats_zero_as_infinity() {
        let mut store = ResultStore::new();
        for (seq, ms) in [(0, 500), (1, 100), (2, 300), (3, 0)] {
            store.push(result_with(seq, ms));
        }
        store.sort_by(SortColumn::Latency, true);
        let order: Vec<u64> = store.iter().map(|r| r.sequence).collect();
        assert_eq!(order, vec![1, 2, 0, 3]);
    }

    #[test]
    fn dedup_keeps_first_occurrence_by_endpoint() {
        let mut store = ResultStore::new();
        let mut a = result_with(0, 100);
        a.proxy_config = serde_yaml::from_str("server: 1.1.1.1\nport: 443\n").unwrap();
        let mut b = result_with(1, 200);
        b.proxy_config = serde_yaml::from_str("server: 1.1.1.1\nport: 443\n").unwrap();
        store.push(a);
        store.push(b);
        store.dedup_by_endpoint();
        assert_eq!(store.len(), 1);
        assert_eq!(store.iter().next().unwrap().sequence, 0);
    }

    #[test]
    fn default_sort_picks_latency_for_fast_and_download_for_others() {
        assert_eq!(default_sort(SpeedMode::Fast), (SortColumn::Latency, true));
        assert_eq!(default_sort(SpeedMode::Download), (SortColumn::Download, false));
        assert_eq!(default_sort(SpeedMode::Full), (SortColumn::Download, false));
    }

    #[test]
    fn format_download_speed_prefers_error_over_value() {
        let mut result = result_with(0, 100);
        result.download_error = Some("timeout".to_owned());
        result.download_speed = 0.0;
        assert_eq!(result.format_download_speed(), "timeout");
    }
}
