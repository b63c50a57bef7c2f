use groovebox::pipeline::pattern::Pattern;
use groovebox::shared::{Instrument, STEP_COUNT, Step};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

const LABEL_WIDTH: usize = 7;

// one line per track of the active instrument, one cell per step
pub fn draw_step_grid(
    frame: &mut Frame,
    area: Rect,
    pattern: &Pattern,
    instrument: Instrument,
    edit: (usize, usize),
    playhead: Option<Step>,
) {
    let (edit_row, edit_col) = edit;
    let lines: Vec<Line> = instrument
        .tracks()
        .into_iter()
        .enumerate()
        .map(|(row, address)| {
            let mut spans = vec![Span::styled(
                format!("{:<LABEL_WIDTH$}", address.label()),
                Style::default().fg(Color::Gray),
            )];
            for step in Step::all() {
                let on = pattern.is_set(address, step);
                let under_playhead = playhead == Some(step);
                let under_cursor = row == edit_row && step.index() == edit_col;

                let mut style = match (on, under_playhead) {
                    (true, true) => Style::default().fg(Color::Black).bg(Color::LightMagenta),
                    (true, false) => Style::default().fg(Color::LightMagenta),
                    (false, true) => Style::default().bg(Color::DarkGray),
                    (false, false) => Style::default().fg(Color::DarkGray),
                };
                if under_cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                let glyph = if on { "■" } else { "·" };
                spans.push(Span::styled(format!(" {glyph}"), style));
                // beat separator
                if step.index() % 4 == 3 && step.index() != STEP_COUNT - 1 {
                    spans.push(Span::raw(" "));
                }
            }
            Line::from(spans)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {instrument} "));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
