use crate::app_state::{AppState, Focus, ViewState};
use crate::config::Backdrop;
use crate::form::{EntryDraft, Field};
use crate::popup;
use color_eyre::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Position, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Block, Borders, Clear, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    time::{Duration, Instant},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(450);
const FORM_VALUE_WIDTH: usize = 34;

pub enum Action {
    AddEntryAt { latitude: f64, longitude: f64 },
    SelectEntry(String),
    ClosePopup,
    CancelForm,
    SubmitForm,
    Form(FormInput),
    Pan { d_lon: f64, d_lat: f64 },
    ZoomIn,
    ZoomOut,
    Locate,
    Refresh,
    Quit,
}

pub enum FormInput {
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    NextField,
    PrevField,
    RatingUp,
    RatingDown,
}

pub struct Ui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    backdrop: Backdrop,
    cursor_visible: bool,
    last_cursor_update: Instant,
    last_click: Option<(Instant, u16, u16)>,
    map_area: Rect,
    overlay_area: Option<Rect>,
}

impl Ui {
    pub fn new(backdrop: Backdrop) -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;
        stdout().execute(EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Ui {
            terminal,
            backdrop,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
            last_click: None,
            map_area: Rect::default(),
            overlay_area: None,
        })
    }

    pub fn display(&mut self, state: &AppState) -> Result<()> {
        let now = Instant::now();
        if now.duration_since(self.last_cursor_update) >= Duration::from_millis(500) {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_update = now;
        }

        let backdrop = self.backdrop;
        let cursor_visible = self.cursor_visible;
        let mut map_area = Rect::default();
        let mut overlay_area = None;

        self.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(2),
                        Constraint::Min(0),
                        Constraint::Length(1),
                    ]
                    .as_ref(),
                )
                .split(f.area());

            f.render_widget(header(state), chunks[0]);
            draw_map(f, state, backdrop, cursor_visible, chunks[1]);
            f.render_widget(footer(state), chunks[2]);
            map_area = chunks[1];

            match &state.focus {
                Focus::EntrySelected { .. } => {
                    if let Some(entry) = state.selected_entry() {
                        let lines = popup::entry_lines(entry);
                        let area = centered_rect(44, lines.len() as u16 + 2, chunks[1]);
                        f.render_widget(Clear, area);
                        f.render_widget(
                            Paragraph::new(lines)
                                .wrap(Wrap { trim: false })
                                .block(Block::default().borders(Borders::ALL).title("Travel Log")),
                            area,
                        );
                        overlay_area = Some(area);
                    }
                }
                Focus::LocationPending { location, draft } => {
                    let lines = form_lines(draft, cursor_visible);
                    let area = centered_rect(52, lines.len() as u16 + 2, chunks[1]);
                    f.render_widget(Clear, area);
                    f.render_widget(
                        Paragraph::new(lines).block(
                            Block::default()
                                .borders(Borders::ALL)
                                .title(popup::format_coords(location.latitude, location.longitude)),
                        ),
                        area,
                    );
                    overlay_area = Some(area);
                }
                Focus::Idle => {}
            }

            if state.loading {
                let area = centered_rect(14, 3, chunks[1]);
                f.render_widget(Clear, area);
                f.render_widget(
                    Paragraph::new("Loading…")
                        .alignment(Alignment::Center)
                        .block(Block::default().borders(Borders::ALL)),
                    area,
                );
            }
        })?;

        self.map_area = map_area;
        self.overlay_area = overlay_area;

        Ok(())
    }

    pub fn handle_input(&mut self, state: &AppState) -> Result<Option<Action>> {
        if !event::poll(Duration::from_millis(100))? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(self.key_action(key, state)),
            Event::Mouse(mouse) => Ok(self.mouse_action(mouse, state)),
            _ => Ok(None),
        }
    }

    fn key_action(&mut self, key: KeyEvent, state: &AppState) -> Option<Action> {
        if let Focus::LocationPending { draft, .. } = &state.focus {
            return form_key(key, draft);
        }
        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Esc => match state.focus {
                Focus::EntrySelected { .. } => Some(Action::ClosePopup),
                _ => None,
            },
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('g') => Some(Action::Locate),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::ZoomIn),
            KeyCode::Char('-') => Some(Action::ZoomOut),
            KeyCode::Left => Some(pan_action(state, -1.0, 0.0)),
            KeyCode::Right => Some(pan_action(state, 1.0, 0.0)),
            KeyCode::Up => Some(pan_action(state, 0.0, 1.0)),
            KeyCode::Down => Some(pan_action(state, 0.0, -1.0)),
            _ => None,
        }
    }

    fn mouse_action(&mut self, mouse: MouseEvent, state: &AppState) -> Option<Action> {
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Action::ZoomIn),
            MouseEventKind::ScrollDown => Some(Action::ZoomOut),
            MouseEventKind::Down(MouseButton::Left) => {
                self.click_action(mouse.column, mouse.row, state)
            }
            _ => None,
        }
    }

    fn click_action(&mut self, column: u16, row: u16, state: &AppState) -> Option<Action> {
        let position = Position::new(column, row);
        if let Some(overlay) = self.overlay_area {
            if overlay.contains(position) {
                self.last_click = None;
                return None;
            }
        }
        let inner = self.map_area.inner(Margin {
            horizontal: 1,
            vertical: 1,
        });
        if !inner.contains(position) {
            self.last_click = None;
            return None;
        }

        // a marker click is a selection, never half of a double-click
        if let Some(id) = marker_at(&state.viewport, inner, column, row, state) {
            self.last_click = None;
            return Some(Action::SelectEntry(id));
        }

        let now = Instant::now();
        if let Some((at, c, r)) = self.last_click.take() {
            if now.duration_since(at) <= DOUBLE_CLICK_WINDOW
                && c.abs_diff(column) <= 1
                && r.abs_diff(row) <= 1
            {
                let (latitude, longitude) = cell_to_coord(&state.viewport, inner, column, row);
                return Some(Action::AddEntryAt {
                    latitude,
                    longitude,
                });
            }
        }
        self.last_click = Some((now, column, row));
        None
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        stdout().execute(DisableMouseCapture).unwrap();
        stdout().execute(LeaveAlternateScreen).unwrap();
        disable_raw_mode().unwrap();
    }
}

fn pan_action(state: &AppState, x: f64, y: f64) -> Action {
    let step = lon_span(state.viewport.zoom) * 0.1;
    Action::Pan {
        d_lon: x * step,
        d_lat: y * step * 0.5,
    }
}

fn header(state: &AppState) -> Paragraph<'static> {
    let count = state.entries.len();
    let places = if count == 1 { "Place" } else { "Places" };
    let title = Line::from(vec![
        Span::styled(
            "Travel Logger",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{count} {places}"),
            Style::default().fg(Color::Yellow),
        ),
    ]);

    let banner = if let Some(error) = &state.error {
        Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
    } else if let Some(notice) = &state.notice {
        Line::from(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::default()
    };

    Paragraph::new(vec![title, banner]).alignment(Alignment::Center)
}

fn footer(state: &AppState) -> Paragraph<'static> {
    let help = match state.focus {
        Focus::LocationPending { .. } => {
            "Tab: next field, ←/→: move/adjust, Enter: create, Esc: cancel"
        }
        Focus::EntrySelected { .. } => "Esc: close, click: select marker, double-click: new entry",
        Focus::Idle => {
            "double-click: add entry, click: view marker, arrows: pan, +/-: zoom, g: locate, r: refresh, q: quit"
        }
    };
    Paragraph::new(help)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn draw_map(f: &mut Frame, state: &AppState, backdrop: Backdrop, blink: bool, area: Rect) {
    let inner = area.inner(Margin {
        horizontal: 1,
        vertical: 1,
    });
    let (x_bounds, y_bounds) = map_bounds(&state.viewport, inner);
    let selected_id = match &state.focus {
        Focus::EntrySelected { id } => Some(id.as_str()),
        _ => None,
    };

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{}  z{:.1}",
            popup::format_coords(state.viewport.latitude, state.viewport.longitude),
            state.viewport.zoom
        )))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            let resolution = match backdrop {
                Backdrop::High => Some(MapResolution::High),
                Backdrop::Low => Some(MapResolution::Low),
                Backdrop::Off => None,
            };
            if let Some(resolution) = resolution {
                ctx.draw(&Map {
                    resolution,
                    color: Color::DarkGray,
                });
                ctx.layer();
            }

            for entry in &state.entries {
                let selected = selected_id == Some(entry.id.as_str());
                let (glyph, color) = if selected {
                    ("◉", Color::Yellow)
                } else {
                    ("●", Color::Cyan)
                };
                ctx.print(
                    entry.longitude,
                    entry.latitude,
                    Span::styled(glyph, Style::default().fg(color)),
                );
            }

            if let Some(pending) = state.pending_location() {
                if blink {
                    ctx.print(
                        pending.longitude,
                        pending.latitude,
                        Span::styled(
                            "▼",
                            Style::default()
                                .fg(Color::Magenta)
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
            }
        });

    f.render_widget(canvas, area);
}

fn form_lines(draft: &EntryDraft, cursor_visible: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        "Add New Travel Log",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .centered()];

    if let Some(error) = &draft.submit_error {
        lines.push(
            Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .centered(),
        );
    }
    lines.push(Line::default());

    for field in Field::ORDER {
        let active = field == draft.field;
        let label_style = if active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let value = match field {
            Field::Rating => rating_value(draft),
            Field::ApiKey => "•".repeat(draft.api_key.chars().count()),
            _ => draft.value(field).to_string(),
        };
        let shown = if active && field != Field::Rating {
            with_cursor(&value, draft.cursor, cursor_visible)
        } else {
            value
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", format!("{}:", field.label())), label_style),
            Span::raw(fit_tail(&shown, FORM_VALUE_WIDTH)),
        ]));

        if let Some(message) = draft.errors.get(field) {
            lines.push(Line::from(Span::styled(
                format!("            {message}"),
                Style::default().fg(Color::Red),
            )));
        }
    }

    lines.push(Line::default());
    let button = if draft.submitting {
        "[ Creating... ]"
    } else {
        "[ Create Entry ]"
    };
    lines.push(
        Line::from(Span::styled(
            button,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
        .centered(),
    );

    lines
}

fn rating_value(draft: &EntryDraft) -> String {
    let filled = usize::from(draft.rating);
    format!(
        "{}{} {}/10",
        "★".repeat(filled),
        "☆".repeat(10 - filled),
        draft.rating
    )
}

fn with_cursor(value: &str, cursor: usize, visible: bool) -> String {
    if !visible {
        return value.to_string();
    }
    let mut shown = value.to_string();
    let at = shown
        .char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(shown.len());
    shown.insert(at, '|');
    shown
}

// Long values (image URLs mostly) keep their tail visible while editing.
fn fit_tail(value: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(value) <= max_width {
        return value.to_string();
    }
    let mut tail = Vec::new();
    let mut width = 0;
    for c in value.chars().rev() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        tail.push(c);
        width += w;
    }
    let mut out = String::from("…");
    out.extend(tail.iter().rev());
    out
}

fn form_key(key: KeyEvent, draft: &EntryDraft) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelForm),
        KeyCode::Enter => Some(Action::SubmitForm),
        KeyCode::Tab | KeyCode::Down => Some(Action::Form(FormInput::NextField)),
        KeyCode::BackTab | KeyCode::Up => Some(Action::Form(FormInput::PrevField)),
        KeyCode::Left => Some(Action::Form(if draft.field == Field::Rating {
            FormInput::RatingDown
        } else {
            FormInput::Left
        })),
        KeyCode::Right => Some(Action::Form(if draft.field == Field::Rating {
            FormInput::RatingUp
        } else {
            FormInput::Right
        })),
        KeyCode::Backspace => Some(Action::Form(FormInput::Backspace)),
        KeyCode::Delete => Some(Action::Form(FormInput::Delete)),
        KeyCode::Char(c) if draft.field != Field::Rating => {
            Some(Action::Form(FormInput::Insert(c)))
        }
        _ => None,
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn lon_span(zoom: f64) -> f64 {
    720.0 / 2f64.powf(zoom)
}

// Terminal cells are about twice as tall as they are wide, so a row covers
// roughly twice the degrees a column does.
fn spans(view: &ViewState, width: u16, height: u16) -> (f64, f64) {
    let lon = lon_span(view.zoom);
    let lat = if width == 0 {
        lon
    } else {
        (lon * 2.0 * f64::from(height) / f64::from(width)).min(170.0)
    };
    (lon, lat)
}

fn map_bounds(view: &ViewState, area: Rect) -> ([f64; 2], [f64; 2]) {
    let (lon_span, lat_span) = spans(view, area.width, area.height);
    let x = [
        view.longitude - lon_span / 2.0,
        view.longitude + lon_span / 2.0,
    ];
    let mut y0 = view.latitude - lat_span / 2.0;
    let mut y1 = view.latitude + lat_span / 2.0;
    let over = (y1 - 90.0).max(0.0);
    y0 -= over;
    y1 -= over;
    let under = (-90.0 - y0).max(0.0);
    y0 += under;
    y1 += under;
    (x, [y0, y1])
}

fn cell_to_coord(view: &ViewState, area: Rect, column: u16, row: u16) -> (f64, f64) {
    let ([x0, x1], [y0, y1]) = map_bounds(view, area);
    let fx = (f64::from(column.saturating_sub(area.x)) + 0.5) / f64::from(area.width.max(1));
    let fy = (f64::from(row.saturating_sub(area.y)) + 0.5) / f64::from(area.height.max(1));
    let longitude = x0 + fx * (x1 - x0);
    let latitude = y1 - fy * (y1 - y0);
    (latitude, longitude)
}

fn coord_to_cell(
    view: &ViewState,
    area: Rect,
    latitude: f64,
    longitude: f64,
) -> Option<(u16, u16)> {
    let ([x0, x1], [y0, y1]) = map_bounds(view, area);
    if x1 <= x0 || y1 <= y0 || area.width == 0 || area.height == 0 {
        return None;
    }
    let fx = (longitude - x0) / (x1 - x0);
    let fy = (y1 - latitude) / (y1 - y0);
    if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
        return None;
    }
    let column = area.x + (fx * f64::from(area.width)) as u16;
    let row = area.y + (fy * f64::from(area.height)) as u16;
    Some((
        column.min(area.x + area.width - 1),
        row.min(area.y + area.height - 1),
    ))
}

fn marker_at(
    view: &ViewState,
    area: Rect,
    column: u16,
    row: u16,
    state: &AppState,
) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for entry in &state.entries {
        let Some((c, r)) = coord_to_cell(view, area, entry.latitude, entry.longitude) else {
            continue;
        };
        let dc = c.abs_diff(column);
        let dr = r.abs_diff(row);
        if dc > 1 || dr > 1 {
            continue;
        }
        let distance = u32::from(dc) * u32::from(dc) + u32::from(dr) * u32::from(dr);
        if best.map_or(true, |(d, _)| distance < d) {
            best = Some((distance, &entry.id));
        }
    }
    best.map(|(_, id)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_entry::LogEntry;

    fn view() -> ViewState {
        ViewState {
            longitude: 2.2945,
            latitude: 48.8584,
            zoom: 8.0,
        }
    }

    fn area() -> Rect {
        Rect::new(1, 3, 100, 30)
    }

    #[test]
    fn zooming_in_halves_the_visible_span() {
        assert_eq!(lon_span(3.0), 90.0);
        assert_eq!(lon_span(4.0), 45.0);
    }

    #[test]
    fn cell_coordinate_mapping_round_trips() {
        let view = view();
        let area = area();
        let (latitude, longitude) = cell_to_coord(&view, area, 50, 17);
        let (column, row) = coord_to_cell(&view, area, latitude, longitude).unwrap();
        assert!(column.abs_diff(50) <= 1);
        assert!(row.abs_diff(17) <= 1);
    }

    #[test]
    fn center_cell_is_near_viewport_center() {
        let view = view();
        let area = area();
        let (latitude, longitude) = cell_to_coord(
            &view,
            area,
            area.x + area.width / 2,
            area.y + area.height / 2,
        );
        let (lon_span, lat_span) = spans(&view, area.width, area.height);
        assert!((longitude - view.longitude).abs() < lon_span / 10.0);
        assert!((latitude - view.latitude).abs() < lat_span / 10.0);
    }

    #[test]
    fn bounds_never_cross_the_poles() {
        let view = ViewState {
            longitude: 0.0,
            latitude: 84.0,
            zoom: 2.0,
        };
        let (_, [y0, y1]) = map_bounds(&view, area());
        assert!(y1 <= 90.0);
        assert!(y0 >= -90.0);
    }

    #[test]
    fn off_screen_coordinates_have_no_cell() {
        let view = view();
        assert_eq!(coord_to_cell(&view, area(), -33.8688, 151.2093), None);
    }

    #[test]
    fn click_near_marker_finds_nearest_entry() {
        let view = view();
        let area = area();
        let mut state = AppState::new();
        let mut entry = LogEntry {
            id: "a".to_string(),
            title: "Eiffel Tower".to_string(),
            description: None,
            comments: None,
            image: None,
            rating: 9.0,
            latitude: view.latitude,
            longitude: view.longitude,
            visit_date: "2024-05-01".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let (column, row) = coord_to_cell(&view, area, entry.latitude, entry.longitude).unwrap();
        state.set_entries(vec![entry.clone()]);
        assert_eq!(
            marker_at(&view, area, column, row, &state),
            Some("a".to_string())
        );

        entry.id = "far".to_string();
        entry.longitude += lon_span(view.zoom) / 4.0;
        state.set_entries(vec![entry]);
        assert_eq!(marker_at(&view, area, column, row, &state), None);
    }

    #[test]
    fn fit_tail_keeps_the_end_of_long_values() {
        assert_eq!(fit_tail("short", 10), "short");
        let fitted = fit_tail("https://example.com/a/very/long/path/tower.jpg", 12);
        assert!(fitted.starts_with('…'));
        assert!(fitted.ends_with("tower.jpg"));
        assert!(UnicodeWidthStr::width(fitted.as_str()) <= 12);
    }

    #[test]
    fn cursor_is_inserted_at_the_active_position() {
        assert_eq!(with_cursor("abc", 1, true), "a|bc");
        assert_eq!(with_cursor("abc", 3, true), "abc|");
        assert_eq!(with_cursor("abc", 1, false), "abc");
    }
}
