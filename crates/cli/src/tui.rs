use anyhow::Result;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::{cursor, execute, terminal};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::{Frame, Terminal};
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, warn};
use tradewatch_render::{Cell, Metric, Panel, SectionBody, StatusCard, Theme, Tone};

use crate::app::App;

const TICK: Duration = Duration::from_millis(50);

/// Run the interactive view until the user quits.
pub async fn run(app: &App) -> Result<()> {
    terminal::enable_raw_mode()?;
    let _restore = OnDrop(restore_terminal);
    execute!(stdout(), terminal::EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    event_loop(&mut terminal, app).await
}

/// Runs its closure when dropped, on every exit path.
struct OnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

fn restore_terminal() {
    if let Err(e) = terminal::disable_raw_mode() {
        warn!(error = %e, "Failed to leave raw mode");
    }
    if let Err(e) = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show) {
        warn!(error = %e, "Failed to restore the terminal screen");
    }
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> Result<()> {
    let mut frames = app.feed.store().subscribe();
    let mut state = app.feed.subscribe_state();
    let mut theme = app.theme.subscribe();
    let mut dirty = true;

    loop {
        if dirty {
            let panel = app.panel();
            terminal.draw(|f| draw(f, &panel))?;
            dirty = false;
        }

        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char('t') => {
                        let next = app.theme.toggle();
                        debug!(theme = %next, "Theme toggled");
                    }
                    _ => {}
                },
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(TICK) => {}
            Ok(()) = frames.changed() => dirty = true,
            Ok(()) = state.changed() => dirty = true,
            Ok(()) = theme.changed() => dirty = true,
        }
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

struct Palette {
    background: Color,
    text: Color,
    muted: Color,
    border: Color,
    affirmative: Color,
    negative: Color,
    caution: Color,
    info: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::Reset,
                text: Color::Reset,
                muted: Color::DarkGray,
                border: Color::Gray,
                affirmative: Color::Green,
                negative: Color::Red,
                caution: Color::Yellow,
                info: Color::Blue,
            },
            Theme::Dark => Self {
                background: Color::Black,
                text: Color::White,
                muted: Color::Gray,
                border: Color::DarkGray,
                affirmative: Color::LightGreen,
                negative: Color::LightRed,
                caution: Color::LightYellow,
                info: Color::LightBlue,
            },
        }
    }

    fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Affirmative => self.affirmative,
            Tone::Negative => self.negative,
            Tone::Caution => self.caution,
            Tone::Info => self.info,
            Tone::Neutral => self.text,
        }
    }

    fn style(&self, cell: &Cell) -> Style {
        let style = Style::default().fg(self.tone(cell.tone));
        if cell.strong {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    fn block<'a>(&self, title: impl Into<Line<'a>>) -> Block<'a> {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.border))
            .title(title)
    }
}

pub(crate) fn draw(f: &mut Frame, panel: &Panel) {
    let palette = Palette::for_theme(panel.theme);
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.background).fg(palette.text)),
        area,
    );

    let mut constraints = Vec::new();
    if panel.status.is_some() {
        constraints.push(Constraint::Length(4));
    }
    if !panel.summary.is_empty() {
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Min(5));
    constraints.push(Constraint::Length(1));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut chunks = chunks.iter().copied();
    let mut next = || chunks.next().unwrap_or_default();

    if let Some(card) = &panel.status {
        draw_status(f, next(), panel, card, &palette);
    }
    if !panel.summary.is_empty() {
        draw_summary(f, next(), &panel.summary, &palette);
    }
    draw_section(f, next(), panel, &palette);

    let footer = match &panel.footer {
        Some(updated) => format!("{} | q quit | t theme", updated),
        None => format!("{} ({}) | q quit | t theme", panel.title, panel.connection),
    };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(palette.muted)),
        next(),
    );
}

fn draw_status(f: &mut Frame, area: Rect, panel: &Panel, card: &StatusCard, palette: &Palette) {
    let mut spans = vec![
        Span::styled(card.connection.text.clone(), palette.style(&card.connection)),
        Span::raw("   "),
        Span::styled(card.venue.text.clone(), palette.style(&card.venue)),
    ];
    if let Some(balance) = &card.balance {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(balance.text.clone(), palette.style(balance)));
    }

    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(
            format!("Status: {}", card.session_status),
            Style::default().fg(palette.muted),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines).block(palette.block(panel.title)),
        area,
    );
}

fn draw_summary(f: &mut Frame, area: Rect, summary: &[Metric], palette: &Palette) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, summary.len() as u32); summary.len()])
        .split(area);

    for (metric, column) in summary.iter().zip(columns.iter()) {
        let value = Paragraph::new(Span::styled(
            metric.value.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .block(palette.block(metric.label));
        f.render_widget(value, *column);
    }
}

fn draw_section(f: &mut Frame, area: Rect, panel: &Panel, palette: &Palette) {
    let block = palette.block(panel.section.title);

    match &panel.section.body {
        SectionBody::Placeholder(cell) => {
            let text = Paragraph::new(Span::styled(cell.text.clone(), palette.style(cell)))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(text, area);
        }
        SectionBody::Table(table) => {
            let widths: Vec<Constraint> = table
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let widest = table
                        .rows
                        .iter()
                        .filter_map(|row| row.get(i))
                        .map(|cell| cell.text.chars().count())
                        .fold(header.chars().count(), usize::max);
                    Constraint::Length(widest as u16)
                })
                .collect();

            let header = Row::new(table.headers.iter().copied())
                .style(Style::default().fg(palette.muted).add_modifier(Modifier::BOLD));
            let rows = table.rows.iter().map(|row| {
                Row::new(row.iter().map(|cell| {
                    ratatui::widgets::Cell::from(cell.text.clone()).style(palette.style(cell))
                }))
            });

            let widget = Table::new(rows, widths)
                .header(header)
                .column_spacing(2)
                .block(block);
            f.render_widget(widget, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use tradewatch_core::{ConnectionState, Snapshot};
    use tradewatch_render::{ViewInput, ViewKind};

    fn screen(kind: ViewKind, snapshot: &Snapshot, theme: Theme) -> String {
        let panel = kind.render(&ViewInput {
            connection: ConnectionState::Connected,
            snapshot,
            updated_at: None,
            theme,
        });
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| draw(f, &panel)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_monitor_screen_shows_positions() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"status":"Active","mt5_status":{"connected":true,"balance":1000.5},
            "open_positions":[{"symbol":"EURUSD","direction":"BUY","status":"Active","volume":1.0,
            "price":1.2345,"deal_id":"D1","timestamp":"2024-01-15 10:00:00.000","mt5_mirrored":true}],
            "closed_positions":[]}"#,
        )
        .unwrap();
        let screen = screen(ViewKind::Monitor, &snapshot, Theme::Dark);

        assert!(screen.contains("Connected to Monitor"));
        assert!(screen.contains("$1000.50"));
        assert!(screen.contains("Active Positions"));
        assert!(screen.contains("EURUSD"));
        assert!(screen.contains("10:00:00"));
        assert!(screen.contains("Mirrored"));
    }

    #[test]
    fn test_restore_runs_when_setup_fails() {
        let restored = std::cell::Cell::new(0);
        let setup = |fail: bool| -> Result<()> {
            let _restore = OnDrop(|| restored.set(restored.get() + 1));
            if fail {
                anyhow::bail!("alternate screen unavailable");
            }
            Ok(())
        };

        assert!(setup(true).is_err());
        assert_eq!(restored.get(), 1);
        assert!(setup(false).is_ok());
        assert_eq!(restored.get(), 2);
    }

    #[test]
    fn test_history_screen_placeholder() {
        let screen = screen(ViewKind::History, &Snapshot::default(), Theme::Light);

        assert!(screen.contains("Trade History"));
        assert!(screen.contains("No closed positions"));
        assert!(!screen.contains("Open Positions"));
    }
}
