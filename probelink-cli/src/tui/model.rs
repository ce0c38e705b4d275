use std::time::Instant;

use probelink_engine::config::SpeedMode;
use probelink_engine::result::{self, ProbeResult, ResultStore, SortColumn};
use ratatui::layout::Rect;
use ratatui::widgets::TableState;

use super::perf::{EVENT_ROWS, EVENT_SORT, PerfTracker};
use super::table;

/// Gap ratatui's `Table` widget leaves between adjacent columns by default.
const COLUMN_SPACING: u16 = 1;

const SORT_COLUMNS_FAST: [SortColumn; 4] = [SortColumn::Sequence, SortColumn::Name, SortColumn::Type, SortColumn::Latency];
const SORT_COLUMNS_FULL: [SortColumn; 8] = [
    SortColumn::Sequence,
    SortColumn::Name,
    SortColumn::Type,
    SortColumn::Latency,
    SortColumn::Jitter,
    SortColumn::Loss,
    SortColumn::Download,
    SortColumn::Upload,
];

/// Owns every piece of mutable TUI state: the accumulating result store, the
/// current sort/selection, the detail panel, and the progress clock. All
/// input handling in [`super::run_tui`] goes through this struct's methods.
pub struct App {
    pub mode: SpeedMode,
    pub store: ResultStore,
    pub total_proxies: usize,
    pub current_proxy: usize,
    pub testing: bool,
    pub sort_column_index: usize,
    pub sort_ascending: bool,
    pub table_state: TableState,
    pub detail_visible: bool,
    pub start_time: Instant,
    /// The table's last-rendered screen area, refreshed every frame by
    /// `draw_table` -- lets mouse handling map screen coordinates back to a
    /// header column or a data row without duplicating the draw layout.
    pub table_area: Rect,
    dirty: bool,
    perf: PerfTracker,
}

impl App {
    pub fn new(mode: SpeedMode, total_proxies: usize) -> Self {
        let (sort_column_index, sort_ascending) = default_sort_state(mode);
        Self {
            mode,
            store: ResultStore::new(),
            total_proxies,
            current_proxy: 0,
            testing: true,
            sort_column_index,
            sort_ascending,
            table_state: TableState::default(),
            detail_visible: false,
            start_time: Instant::now(),
            table_area: Rect::default(),
            dirty: false,
            perf: PerfTracker::new(),
        }
    }

    fn sort_columns(&self) -> &'static [SortColumn] {
        if self.mode.is_fast() {
            &SORT_COLUMNS_FAST
        } else {
            &SORT_COLUMNS_FULL
        }
    }

    pub fn push_result(&mut self, result: ProbeResult) {
        self.store.push(result);
        self.current_proxy += 1;
        self.dirty = true;
    }

    pub fn mark_done(&mut self) {
        self.testing = false;
        self.flush_if_dirty();
    }

    /// Re-sorts, deduplicates by `(server, port)`, and refreshes row state
    /// if new results arrived since the last flush. Called on a throttling
    /// tick rather than on every single result, so a fast burst of results
    /// doesn't re-sort the whole table once per item.
    pub fn flush_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        let start = Instant::now();
        let column = self.sort_columns()[self.sort_column_index.min(self.sort_columns().len() - 1)];
        self.store.sort_by(column, self.sort_ascending);
        self.store.dedup_by_endpoint();
        self.perf.record(EVENT_SORT, self.store.len(), start);

        let rows_start = Instant::now();
        self.sync_selection();
        self.perf.record(EVENT_ROWS, self.store.len(), rows_start);
        self.dirty = false;
    }

    pub fn results(&self) -> Vec<&ProbeResult> {
        self.store.iter().collect()
    }

    pub fn selected(&self) -> Option<&ProbeResult> {
        self.table_state.selected().and_then(|i| self.results().into_iter().nth(i))
    }

    pub fn select_next(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let next = match self.table_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.table_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.store.is_empty() {
            return;
        }
        let previous = match self.table_state.selected() {
            Some(i) if i > 0 => i - 1,
            Some(_) => 0,
            None => 0,
        };
        self.table_state.select(Some(previous));
    }

    fn sync_selection(&mut self) {
        let len = self.store.len();
        match self.table_state.selected() {
            Some(i) if i >= len && len > 0 => self.table_state.select(Some(len - 1)),
            Some(_) if len == 0 => self.table_state.select(None),
            None if len > 0 => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn toggle_detail(&mut self) {
        if self.table_state.selected().is_none() {
            return;
        }
        self.detail_visible = !self.detail_visible;
    }

    pub fn close_detail(&mut self) {
        self.detail_visible = false;
    }

    /// Cycles to the next sort column, restarting at column 0's default
    /// direction once past the last column (mirrors header-click cycling).
    pub fn cycle_sort_column(&mut self, forward: bool) {
        let count = self.sort_columns().len();
        if forward {
            self.sort_column_index = (self.sort_column_index + 1) % count;
        } else {
            self.sort_column_index = (self.sort_column_index + count - 1) % count;
        }
        self.sort_ascending = default_sort_ascending(self.sort_columns()[self.sort_column_index]);
        self.dirty = true;
    }

    pub fn reverse_sort(&mut self) {
        self.sort_ascending = !self.sort_ascending;
        self.dirty = true;
    }

    /// Handles a left-click at `x` on the header row: switches to the
    /// column under the cursor, or flips direction if it's already the
    /// active sort column. A click outside any column is a no-op.
    pub fn handle_header_click(&mut self, x: u16) {
        let widths = table::column_widths(self.table_area.width, self.mode);
        let Some(col) = column_at_x(&widths, self.table_area.x, x) else {
            return;
        };
        if col >= self.sort_columns().len() {
            return;
        }
        if col == self.sort_column_index {
            self.sort_ascending = !self.sort_ascending;
        } else {
            self.sort_column_index = col;
            self.sort_ascending = default_sort_ascending(self.sort_columns()[col]);
        }
        self.dirty = true;
    }

    /// Index of the first data row currently visible in the table, given
    /// the selection and the last-rendered table area. Mirrors the
    /// original's cursor/height-based viewport windowing so a click maps to
    /// the same result whether or not the table is scrolled.
    pub fn visible_start(&self) -> usize {
        let visible_rows = self.table_area.height.saturating_sub(2) as usize;
        table_start_index(self.table_state.selected(), visible_rows, self.store.len())
    }
}

/// Maps a screen x-coordinate to a column index, given each column's
/// rendered width and the area's left edge. Accounts for the single-cell
/// gap ratatui's `Table` leaves between columns.
fn column_at_x(widths: &[u16], start_x: u16, x: u16) -> Option<usize> {
    if x < start_x {
        return None;
    }
    let mut cursor = start_x;
    for (i, width) in widths.iter().enumerate() {
        let end = cursor + width;
        if x >= cursor && x < end {
            return Some(i);
        }
        cursor = end + COLUMN_SPACING;
    }
    None
}

/// Windows `selected` within `visible_rows` out of `total` rows, keeping the
/// cursor on screen with the minimal scroll needed -- the same policy the
/// original table used to compute its first visible row.
fn table_start_index(selected: Option<usize>, visible_rows: usize, total: usize) -> usize {
    if visible_rows == 0 || total <= visible_rows {
        return 0;
    }
    let max_start = total - visible_rows;
    match selected {
        None => 0,
        Some(cursor) if cursor < visible_rows => 0,
        Some(cursor) => (cursor + 1 - visible_rows).min(max_start),
    }
}

fn default_sort_state(mode: SpeedMode) -> (usize, bool) {
    let (column, ascending) = result::default_sort(mode);
    let columns: &[SortColumn] = if mode.is_fast() { &SORT_COLUMNS_FAST } else { &SORT_COLUMNS_FULL };
    let index = columns.iter().position(|c| *c == column).unwrap_or(0);
    (index, ascending)
}

fn default_sort_ascending(column: SortColumn) -> bool {
    column.default_ascending()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_mode_defaults_to_latency_ascending() {
        let app = App::new(SpeedMode::Fast, 1);
        assert_eq!(app.sort_column_index, 3);
        assert!(app.sort_ascending);
    }

    #[test]
    fn full_mode_defaults_to_download_descending() {
        let app = App::new(SpeedMode::Full, 1);
        assert_eq!(app.sort_column_index, 6);
        assert!(!app.sort_ascending);
    }

    #[test]
    fn selection_clamps_within_bounds() {
        let mut app = App::new(SpeedMode::Full, 1);
        app.select_next();
        assert_eq!(app.table_state.selected(), None);
    }

    #[test]
    fn header_click_switches_column_then_flips_direction() {
        let mut app = App::new(SpeedMode::Fast, 1);
        app.table_area = Rect::new(0, 1, 80, 1);
        let widths = table::column_widths(80, SpeedMode::Fast);
        let name_col_x = widths[0] + COLUMN_SPACING;

        app.handle_header_click(name_col_x);
        assert_eq!(app.sort_column_index, 1);
        assert_eq!(app.sort_ascending, SortColumn::Name.default_ascending());

        app.handle_header_click(name_col_x);
        assert_eq!(app.sort_column_index, 1);
        assert_eq!(app.sort_ascending, !SortColumn::Name.default_ascending());
    }

    #[test]
    fn header_click_past_last_column_is_ignored() {
        let mut app = App::new(SpeedMode::Fast, 1);
        app.table_area = Rect::new(0, 1, 80, 1);
        let before = (app.sort_column_index, app.sort_ascending);
        app.handle_header_click(u16::MAX);
        assert_eq!((app.sort_column_index, app.sort_ascending), before);
    }

    #[test]
    fn column_at_x_accounts_for_column_spacing() {
        let widths = vec![6u16, 10u16];
        assert_eq!(column_at_x(&widths, 0, 0), Some(0));
        assert_eq!(column_at_x(&widths, 0, 5), Some(0));
        assert_eq!(column_at_x(&widths, 0, 6), None);
        assert_eq!(column_at_x(&widths, 0, 7), Some(1));
        assert_eq!(column_at_x(&widths, 0, 16), Some(1));
        assert_eq!(column_at_x(&widths, 0, 17), None);
    }

    #[test]
    fn table_start_index_keeps_cursor_in_view() {
        assert_eq!(table_start_index(Some(0), 5, 20), 0);
        assert_eq!(table_start_index(Some(4), 5, 20), 0);
        assert_eq!(table_start_index(Some(5), 5, 20), 1);
        assert_eq!(table_start_index(Some(19), 5, 20), 15);
        assert_eq!(table_start_index(None, 5, 20), 0);
        assert_eq!(table_start_index(Some(2), 5, 3), 0);
    }
}
