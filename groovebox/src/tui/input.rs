use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::InputEvent;

const TEMPO_STEP: i32 = 5;
const VOLUME_STEP: f32 = 0.05;

// poll for a key press and resolve it into input events for the engine side
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],

        // edit cursor
        KeyCode::Up | KeyCode::Char('k') => vec![InputEvent::Up],
        KeyCode::Down | KeyCode::Char('j') => vec![InputEvent::Down],
        KeyCode::Left | KeyCode::Char('h') => vec![InputEvent::Left],
        KeyCode::Right | KeyCode::Char('l') => vec![InputEvent::Right],

        KeyCode::Char(' ') | KeyCode::Enter => vec![InputEvent::ToggleStep],
        KeyCode::Char('p') => vec![InputEvent::PlayPress],
        KeyCode::Tab => vec![InputEvent::NextInstrument],

        // knobs
        KeyCode::Char('+') | KeyCode::Char('=') => vec![InputEvent::AdjustTempo(TEMPO_STEP)],
        KeyCode::Char('-') => vec![InputEvent::AdjustTempo(-TEMPO_STEP)],
        KeyCode::Char(']') => vec![InputEvent::AdjustVolume(VOLUME_STEP)],
        KeyCode::Char('[') => vec![InputEvent::AdjustVolume(-VOLUME_STEP)],

        KeyCode::Char('d') => vec![InputEvent::LoadDemo],
        KeyCode::Char('c') => vec![InputEvent::Clear],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_keys_match_arrows() {
        assert_eq!(handle_key(KeyCode::Char('k')), handle_key(KeyCode::Up));
        assert_eq!(handle_key(KeyCode::Char('j')), handle_key(KeyCode::Down));
        assert_eq!(handle_key(KeyCode::Char('h')), handle_key(KeyCode::Left));
        assert_eq!(handle_key(KeyCode::Char('l')), handle_key(KeyCode::Right));
    }

    #[test]
    fn knobs() {
        assert_eq!(handle_key(KeyCode::Char('+')), vec![InputEvent::AdjustTempo(5)]);
        assert_eq!(handle_key(KeyCode::Char('-')), vec![InputEvent::AdjustTempo(-5)]);
        assert_eq!(handle_key(KeyCode::Char(']')), vec![InputEvent::AdjustVolume(0.05)]);
    }

    #[test]
    fn unmapped_keys_do_nothing() {
        assert!(handle_key(KeyCode::Char('z')).is_empty());
        assert!(handle_key(KeyCode::F(1)).is_empty());
    }
}
