use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use home_price_estimator::{
    count_saved_estimates, format_inr, save_estimate, validate_form, FormInput, OfflineBackend,
    Prediction, Predictor, PriceQuery, PriceSource, RngSource, SavedEstimate, ShareCard,
    MAX_AREA_SQFT, MIN_AREA_SQFT,
};
use rand::rngs::ThreadRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;

const AREA_STEP: f64 = 50.0;
const MAX_ROOMS: u32 = 5;
const DEFAULT_AREA: &str = "1000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Location,
    Area,
    Bhk,
    Bath,
}

impl Field {
    pub fn next(&self) -> Self {
        match self {
            Field::Location => Field::Area,
            Field::Area => Field::Bhk,
            Field::Bhk => Field::Bath,
            Field::Bath => Field::Location,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Field::Location => Field::Bath,
            Field::Area => Field::Location,
            Field::Bhk => Field::Area,
            Field::Bath => Field::Bhk,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Field::Location => "Location",
            Field::Area => "Total Sqft",
            Field::Bhk => "BHK",
            Field::Bath => "Bathrooms",
        }
    }
}

/// Last estimate shown in the result panel
#[derive(Debug, Clone)]
pub struct Shown {
    pub query: PriceQuery,
    pub prediction: Prediction,
}

impl Shown {
    fn share_card(&self) -> ShareCard {
        ShareCard::new(
            self.query.location.clone(),
            self.query.area_sqft,
            self.query.bedrooms,
            self.query.bathrooms,
            self.prediction.display_price(),
        )
    }
}

pub struct App<R: home_price_estimator::RandomSource = RngSource<ThreadRng>> {
    pub predictor: Predictor<OfflineBackend>,
    pub conn: Connection,
    pub rng: R,
    pub locations: Vec<String>,
    pub location_state: TableState,
    pub area_input: String,
    pub bhk: u32,
    pub bath: u32,
    pub focus: Field,
    pub shown: Option<Shown>,
    pub show_share: bool,
    pub saved_count: usize,
    pub message: Option<String>,
}

fn read_saved_count(conn: &Connection) -> Result<usize> {
    let count = count_saved_estimates(conn)?;
    Ok(usize::try_from(count).unwrap_or(0))
}

impl App {
    pub fn new(predictor: Predictor<OfflineBackend>, conn: Connection) -> Self {
        Self::with_rng(predictor, conn, RngSource::thread())
    }
}

impl<R: home_price_estimator::RandomSource> App<R> {
    pub fn with_rng(predictor: Predictor<OfflineBackend>, conn: Connection, rng: R) -> Self {
        let locations = predictor.locations();
        let mut message = if locations.from_backend {
            None
        } else {
            Some("Could not load locations from server. Using sample data.".to_string())
        };

        let saved_count = match read_saved_count(&conn) {
            Ok(count) => count,
            Err(e) => {
                message = Some(format!("Could not read saved estimates: {}", e));
                0
            }
        };

        Self {
            predictor,
            conn,
            rng,
            locations: locations.names,
            location_state: TableState::default(),
            area_input: DEFAULT_AREA.to_string(),
            bhk: 2,
            bath: 2,
            focus: Field::Location,
            shown: None,
            show_share: false,
            saved_count,
            message,
        }
    }

    pub fn selected_location(&self) -> Option<&String> {
        self.location_state.selected().and_then(|i| self.locations.get(i))
    }

    pub fn form_input(&self) -> FormInput {
        FormInput {
            location: self.selected_location().cloned().unwrap_or_default(),
            total_sqft: self.area_input.trim().parse().ok(),
            bhk: self.bhk,
            bath: self.bath,
        }
    }

    pub fn next_location(&mut self) {
        let len = self.locations.len();
        if len == 0 {
            return;
        }
        let i = match self.location_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.location_state.select(Some(i));
    }

    pub fn previous_location(&mut self) {
        let len = self.locations.len();
        if len == 0 {
            return;
        }
        let i = match self.location_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.location_state.select(Some(i));
    }

    /// Up/Down on the focused field
    pub fn step(&mut self, up: bool) {
        match self.focus {
            Field::Location => {
                if up {
                    self.previous_location()
                } else {
                    self.next_location()
                }
            }
            Field::Area => {
                let current: f64 = self.area_input.trim().parse().unwrap_or(MIN_AREA_SQFT);
                let next = if up { current + AREA_STEP } else { current - AREA_STEP };
                self.area_input = next.clamp(MIN_AREA_SQFT, MAX_AREA_SQFT).to_string();
            }
            Field::Bhk => self.bhk = step_rooms(self.bhk, up),
            Field::Bath => self.bath = step_rooms(self.bath, up),
        }
    }

    pub fn type_char(&mut self, c: char) {
        if self.focus == Field::Area && (c.is_ascii_digit() || (c == '.' && !self.area_input.contains('.'))) {
            self.area_input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == Field::Area {
            self.area_input.pop();
        }
    }

    pub fn submit(&mut self) {
        match validate_form(&self.form_input()) {
            Ok(query) => {
                let prediction = self.predictor.predict(&query, &mut self.rng);
                self.message = if prediction.source == PriceSource::Fallback {
                    Some("Server is not responding. Showing mock estimate for demonstration.".to_string())
                } else {
                    None
                };
                self.shown = Some(Shown { query, prediction });
                self.show_share = false;
            }
            Err(errors) => {
                // first problem only, like the form's alert
                self.message = errors.first().map(|e| e.message.clone());
                if let Some(err) = errors.first() {
                    self.focus = match err.field.as_str() {
                        "location" => Field::Location,
                        "total_sqft" => Field::Area,
                        "bhk" => Field::Bhk,
                        _ => Field::Bath,
                    };
                }
            }
        }
    }

    pub fn save(&mut self) {
        let Some(shown) = &self.shown else {
            self.message = Some("Nothing to save yet - press Enter to estimate".to_string());
            return;
        };

        let estimate = SavedEstimate::new(
            shown.prediction.display_price(),
            shown.query.location.clone(),
            shown.query.area_sqft,
            shown.query.bedrooms,
            shown.query.bathrooms,
        );

        self.message = match save_estimate(&self.conn, &estimate) {
            Ok(_) => match read_saved_count(&self.conn) {
                Ok(count) => {
                    self.saved_count = count;
                    Some("Saved!".to_string())
                }
                Err(e) => Some(format!("Saved, but could not count saved estimates: {}", e)),
            },
            Err(e) => Some(format!("Could not save estimate: {}", e)),
        };
    }

    pub fn toggle_share(&mut self) {
        if self.shown.is_some() {
            self.show_share = !self.show_share;
        }
    }

    pub fn reset(&mut self) {
        self.location_state.select(None);
        self.area_input = DEFAULT_AREA.to_string();
        self.bhk = 2;
        self.bath = 2;
        self.focus = Field::Location;
        self.shown = None;
        self.show_share = false;
        self.message = None;
    }
}

fn step_rooms(value: u32, up: bool) -> u32 {
    if up {
        (value + 1).min(MAX_ROOMS)
    } else {
        value.saturating_sub(1).max(1)
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.submit(),
                KeyCode::Tab => app.focus = app.focus.next(),
                KeyCode::BackTab => app.focus = app.focus.previous(),
                KeyCode::Up | KeyCode::Char('k') => app.step(true),
                KeyCode::Down | KeyCode::Char('j') => app.step(false),
                KeyCode::Char('s') => app.save(),
                KeyCode::Char('c') => app.toggle_share(),
                KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => app.reset(),
                KeyCode::Char(c) => app.type_char(c),
                KeyCode::Backspace => app.backspace(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + result
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_locations(f, body[0], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(body[1]);

    render_form(f, right[0], app);
    render_result(f, right[1], app);

    render_status_bar(f, chunks[2], app);
}

fn focus_style(app: &App, field: Field) -> Style {
    if app.focus == field {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let spans = vec![
        Span::styled(
            "🏠 Bangalore Home Price Predictor",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Locations: {}", app.locations.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Saved: {}", app.saved_count),
            Style::default().fg(Color::Green),
        ),
    ];

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_locations(f: &mut Frame, area: Rect, app: &mut App) {
    let table_rates = app.predictor.estimator().table();

    let header = Row::new(["Location", "₹/sqft"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = app
        .locations
        .iter()
        .map(|name| {
            Row::new(vec![
                Cell::from(name.clone()),
                Cell::from(format!("{:.0}", table_rates.rate_for(name))),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Min(18), Constraint::Length(8)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app, Field::Location))
                .title(" Location "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.location_state);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let field_line = |field: Field, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<12}", field.title()), focus_style(app, field)),
            Span::raw(value),
        ])
    };

    let lines = vec![
        field_line(
            Field::Location,
            app.selected_location().cloned().unwrap_or_else(|| "(select)".to_string()),
        ),
        field_line(Field::Area, format!("{} sq. ft.", app.area_input)),
        field_line(Field::Bhk, format!("{} BHK", app.bhk)),
        field_line(Field::Bath, app.bath.to_string()),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Home Details "),
    );

    f.render_widget(form, area);
}

fn render_result(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();

    if let Some(message) = &app.message {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Yellow))));
        lines.push(Line::from(""));
    }

    match &app.shown {
        Some(shown) if app.show_share => {
            for text in shown.share_card().share_text().lines() {
                lines.push(Line::from(text.to_string()));
            }
        }
        Some(shown) => {
            let color = match shown.prediction.source {
                PriceSource::Backend => Color::Green,
                PriceSource::Fallback => Color::Magenta,
            };
            lines.push(Line::from(vec![
                Span::raw("Estimated Price: "),
                Span::styled(
                    shown.prediction.display_price(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Location:  {}", shown.query.location)));
            lines.push(Line::from(format!("Size:      {} sq. ft.", shown.query.area_sqft)));
            lines.push(Line::from(format!("BHK:       {} BHK", shown.query.bedrooms)));
            lines.push(Line::from(format!("Bathrooms: {}", shown.query.bathrooms)));
            if shown.prediction.source == PriceSource::Fallback {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("(mock estimate, {} ± 10%)", format_inr(shown.prediction.price_rupees)),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Fill in the form and press Enter",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    let title = if app.show_share { " Share " } else { " Estimate " };
    let result = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        );

    f.render_widget(result, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.focus.title()),
        Style::default().fg(Color::Cyan),
    )];

    for (key, label) in [
        ("Tab", " Field | "),
        ("↑/↓", " Change | "),
        ("Enter", " Estimate | "),
        ("s", " Save | "),
        ("c", " Share | "),
        ("Ctrl+r", " Reset | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use home_price_estimator::{setup_store, MockEstimator};

    fn test_app() -> App<fn() -> f64> {
        let conn = Connection::open_in_memory().unwrap();
        setup_store(&conn).unwrap();
        let predictor = Predictor::new(OfflineBackend, MockEstimator::default());
        App::with_rng(predictor, conn, (|| 0.5) as fn() -> f64)
    }

    #[test]
    fn test_starts_with_sample_locations() {
        let app = test_app();

        assert_eq!(app.locations.len(), 10);
        assert!(app.message.is_some());
        assert_eq!(app.selected_location(), None);
    }

    #[test]
    fn test_submit_without_location_focuses_it() {
        let mut app = test_app();
        app.focus = Field::Bath;

        app.submit();

        assert!(app.shown.is_none());
        assert_eq!(app.focus, Field::Location);
        assert_eq!(app.message.as_deref(), Some("Please select a location"));
    }

    #[test]
    fn test_submit_fallback_estimate() {
        let mut app = test_app();
        // Koramangala is sixth in the sample list
        for _ in 0..6 {
            app.next_location();
        }
        assert_eq!(app.selected_location().map(String::as_str), Some("Koramangala"));

        app.submit();

        let shown = app.shown.as_ref().unwrap();
        assert_eq!(shown.prediction.price_rupees, 9_817_500);
        assert_eq!(shown.prediction.source, PriceSource::Fallback);
    }

    #[test]
    fn test_area_editing_and_steps() {
        let mut app = test_app();
        app.focus = Field::Area;

        app.backspace();
        app.backspace();
        app.backspace();
        app.backspace();
        app.type_char('x');
        app.type_char('2');
        app.type_char('5');
        app.type_char('0');
        assert_eq!(app.area_input, "250");

        // stepping clamps into the valid range
        app.step(true);
        assert_eq!(app.area_input, "300");
        app.step(true);
        assert_eq!(app.area_input, "350");
        app.step(false);
        app.step(false);
        assert_eq!(app.area_input, "300");
    }

    #[test]
    fn test_room_steps_bounded() {
        let mut app = test_app();
        app.focus = Field::Bhk;
        for _ in 0..10 {
            app.step(true);
        }
        assert_eq!(app.bhk, MAX_ROOMS);

        app.focus = Field::Bath;
        for _ in 0..10 {
            app.step(false);
        }
        assert_eq!(app.bath, 1);
    }

    #[test]
    fn test_save_increments_count() {
        let mut app = test_app();
        app.save();
        assert_eq!(app.saved_count, 0);

        app.next_location();
        app.submit();
        app.save();

        assert_eq!(app.saved_count, 1);
        assert_eq!(app.message.as_deref(), Some("Saved!"));
    }

    #[test]
    fn test_unreadable_store_reported() {
        // no setup_store: the table is missing
        let conn = Connection::open_in_memory().unwrap();
        let predictor = Predictor::new(OfflineBackend, MockEstimator::default());
        let app = App::with_rng(predictor, conn, (|| 0.5) as fn() -> f64);

        assert_eq!(app.saved_count, 0);
        assert!(app
            .message
            .as_deref()
            .unwrap()
            .starts_with("Could not read saved estimates"));
    }

    #[test]
    fn test_reset() {
        let mut app = test_app();
        app.next_location();
        app.submit();
        app.toggle_share();
        assert!(app.show_share);

        app.reset();

        assert!(app.shown.is_none());
        assert!(!app.show_share);
        assert_eq!(app.area_input, DEFAULT_AREA);
    }
}
