use groovebox::{GrooveBox, PlaybackState};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::grid::draw_step_grid;
use super::mode::TuiState;

const HELP: &str =
    "arrows/hjkl move  space toggle  p play  tab instrument  +/- tempo  [/] volume  d demo  c clear  q quit";

pub fn render(frame: &mut Frame, area: Rect, gb: &GrooveBox, ts: &TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport screen
            Constraint::Min(5),    // step grid
            Constraint::Length(2), // status + help
        ])
        .split(area);

    draw_screen(frame, sections[0], gb);

    let playhead = gb.is_playing().then(|| gb.cursor());
    draw_step_grid(
        frame,
        sections[1],
        &gb.pattern(),
        gb.active_instrument(),
        (ts.row, ts.col),
        playhead,
    );

    draw_status(frame, sections[2], ts);
}

fn draw_screen(frame: &mut Frame, area: Rect, gb: &GrooveBox) {
    let (state, color) = match gb.state() {
        PlaybackState::Playing => ("▶ playing", Color::Green),
        PlaybackState::Stopped => ("■ stopped", Color::DarkGray),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {state} "), Style::default().fg(color)),
        Span::raw(format!(
            " {} bpm  vol {:.2}  step {:>2}  ",
            gb.tempo(),
            gb.volume(),
            gb.cursor().index() + 1
        )),
        Span::styled(
            if gb.output_ready() { "audio on" } else { "audio idle" },
            Style::default().fg(Color::Gray),
        ),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" groovebox ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_status(frame: &mut Frame, area: Rect, ts: &TuiState) {
    let status = match &ts.last_error {
        Some(e) => Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))),
        None => Line::from(""),
    };
    let help = Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray)));
    frame.render_widget(Paragraph::new(vec![status, help]), area);
}
