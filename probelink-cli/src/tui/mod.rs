mod detail;
mod help;
mod layout;
mod model;
mod perf;
mod table;

use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use probelink_engine::result::ProbeResult;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table};
use tokio::sync::mpsc;
use tokio::time::interval;

use model::App;

const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the interactive TUI until the probe worker finishes and the user
/// quits (or until the user quits early). Returns every result collected so
/// far, in display order, for the caller to feed into output emission.
pub async fn run_tui(
    mode: probelink_engine::config::SpeedMode,
    total_proxies: usize,
    mut results_rx: mpsc::Receiver<ProbeResult>,
) -> io::Result<Vec<ProbeResult>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::event::EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(mode, total_proxies.max(1));
    let mut events = EventStream::new();
    let mut flush_tick = interval(FLUSH_INTERVAL);
    let mut channel_open = true;

    let result = loop {
        terminal.draw(|frame| draw(frame, &mut app))?;

        tokio::select! {
            maybe_result = results_rx.recv(), if channel_open => {
                match maybe_result {
                    Some(result) => app.push_result(result),
                    None => {
                        channel_open = false;
                        app.mark_done();
                    }
                }
            }
            _ = flush_tick.tick() => {
                app.flush_if_dirty();
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => {
                        if let Some(quit) = handle_event(&mut app, event) {
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Err(err)) => break Err(err),
                    None => break Ok(()),
                }
            }
        }

        if !channel_open && !app.testing {
            // Keep rendering after completion so the user can still browse
            // results; only the event/channel polling above ever exits.
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    Ok(app.store.into_vec())
}

fn handle_event(app: &mut App, event: Event) -> Option<bool> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') => return Some(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Some(true),
            KeyCode::Esc => {
                if app.detail_visible {
                    app.close_detail();
                } else {
                    return Some(true);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Enter | KeyCode::Char(' ') => app.toggle_detail(),
            KeyCode::Left | KeyCode::Char('h') => app.cycle_sort_column(false),
            KeyCode::Right | KeyCode::Char('l') => app.cycle_sort_column(true),
            KeyCode::Char('s') => app.reverse_sort(),
            _ => {}
        },
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.select_previous(),
            MouseEventKind::ScrollDown => app.select_next(),
            MouseEventKind::Down(MouseButton::Left) => {
                if mouse.row == app.table_area.y {
                    app.handle_header_click(mouse.column);
                } else if let Some(row_index) = row_at_y(app, mouse.row) {
                    app.table_state.select(Some(row_index));
                    app.toggle_detail();
                }
            }
            _ => {}
        },
        _ => {}
    }
    None
}

/// Maps a click's screen row to an absolute result index, accounting for
/// the header row and the table's current scroll offset.
fn row_at_y(app: &App, y: u16) -> Option<usize> {
    let data_start_y = app.table_area.y.saturating_add(1);
    if y < data_start_y {
        return None;
    }
    let visible_row = (y - data_start_y) as usize;
    let row_index = app.visible_start() + visible_row;
    if row_index >= app.store.len() {
        return None;
    }
    Some(row_index)
}

fn draw(frame: &mut ratatui::Frame<'_>, app: &mut App) {
    let detail_height = if app.detail_visible && app.selected().is_some() { 10 } else { 0 };
    let constraints = vec![
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(detail_height),
        Constraint::Length(1),
    ];
    let chunks = Layout::default().direction(Direction::Vertical).constraints(constraints).split(frame.area());

    draw_progress(frame, chunks[0], app);
    draw_table(frame, chunks[1], app);
    if detail_height > 0 {
        draw_detail(frame, chunks[2], app);
    }
    draw_help(frame, chunks[3], app);
}

fn draw_progress(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let elapsed = app.start_time.elapsed();
    let eta = layout::format_eta(elapsed, app.current_proxy, app.total_proxies);
    let state = if app.testing { "Testing" } else { "Completed" };
    let ratio = (app.current_proxy as f64 / app.total_proxies.max(1) as f64).clamp(0.0, 1.0);
    let label = format!(
        "{state} {}/{} | Elapsed {} | ETA {eta}",
        app.current_proxy,
        app.total_proxies,
        layout::format_duration(elapsed)
    );
    let gauge = Gauge::default().ratio(ratio).label(label).gauge_style(Style::default());
    frame.render_widget(gauge, area);
}

fn draw_table(frame: &mut ratatui::Frame<'_>, area: Rect, app: &mut App) {
    app.table_area = area;
    let mode = app.mode;
    let base_headers = probelink_engine::output::format::headers(mode);
    let headers = table::headers_with_sort_indicator(&base_headers, app.sort_column_index, app.sort_ascending);
    let widths = table::column_widths(area.width, mode);

    let header_row = Row::new(headers.into_iter().map(Cell::from)).style(Style::default().add_modifier(Modifier::BOLD));

    let results = app.results();
    let rows: Vec<Row> = results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            let cells = probelink_engine::output::format::format_row(result, mode, i);
            let colors = table::row_colors(result, mode);
            Row::new(cells.into_iter().zip(colors).map(|(text, color)| {
                let mut cell = Cell::from(text);
                if let Some(color) = color {
                    cell = cell.style(Style::default().fg(color));
                }
                cell
            }))
        })
        .collect();

    let constraints: Vec<Constraint> = widths.into_iter().map(Constraint::Length).collect();
    let table_widget = Table::new(rows, constraints)
        .header(header_row)
        .block(Block::default().borders(Borders::BOTTOM))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(table_widget, area, &mut app.table_state);
}

fn draw_detail(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let Some(result) = app.selected() else { return };
    let width = area.width.saturating_sub(2) as usize;
    let lines = detail::build_detail_content(result, width.max(10), app.mode);
    let text: Vec<Line> = lines.into_iter().map(Line::from).collect();
    let block = Block::default().borders(Borders::ALL).title("Details");
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_help(frame: &mut ratatui::Frame<'_>, area: Rect, app: &App) {
    let text = help::short_help(app.detail_visible);
    frame.render_widget(Paragraph::new(Span::raw(text)), area);
}
