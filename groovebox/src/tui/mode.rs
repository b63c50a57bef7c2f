use groovebox::GrooveBox;
use groovebox::shared::{DrumTrack, Instrument, RowRef, STEP_COUNT};

use super::InputEvent;

// the tempo knob stops here; the engine itself takes any positive tempo
const KNOB_MAX_TEMPO: u32 = 1000;

// state local to the tui: where the edit cursor sits and the last thing that
// went wrong. Everything else is read from the engine each frame.
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub row: usize,
    pub col: usize,
    pub last_error: Option<String>,
}

// drums are addressed by name, everything else by row number
fn row_ref(instrument: Instrument, row: usize) -> RowRef<'static> {
    match instrument {
        Instrument::Drums => RowRef::Drum(DrumTrack::ALL[row.min(DrumTrack::ALL.len() - 1)]),
        _ => RowRef::Index(row),
    }
}

impl TuiState {
    /// Applies one event to the engine. Returns false once the user asked to quit.
    pub fn apply(&mut self, gb: &mut GrooveBox, event: InputEvent) -> bool {
        let rows = gb.active_instrument().rows();
        let result = match event {
            InputEvent::Quit => return false,
            InputEvent::Up => {
                self.row = self.row.saturating_sub(1);
                Ok(())
            }
            InputEvent::Down => {
                self.row = (self.row + 1).min(rows - 1);
                Ok(())
            }
            InputEvent::Left => {
                self.col = (self.col + STEP_COUNT - 1) % STEP_COUNT;
                Ok(())
            }
            InputEvent::Right => {
                self.col = (self.col + 1) % STEP_COUNT;
                Ok(())
            }
            InputEvent::ToggleStep => {
                let instrument = gb.active_instrument();
                gb.toggle_step(instrument, row_ref(instrument, self.row), self.col)
            }
            InputEvent::PlayPress => gb.toggle_playback().map(|_| ()),
            InputEvent::NextInstrument => {
                let next = gb.cycle_instrument();
                self.row = self.row.min(next.rows() - 1);
                Ok(())
            }
            InputEvent::AdjustTempo(delta) => {
                let bpm = (gb.tempo() as i64 + delta as i64).clamp(1, KNOB_MAX_TEMPO as i64);
                gb.set_tempo(bpm as u32)
            }
            InputEvent::AdjustVolume(delta) => {
                // snap to the knob grid so repeated presses land on round values
                let v = ((gb.volume() + delta) * 100.0).round() / 100.0;
                gb.set_volume(v.clamp(0.0, 1.0))
            }
            InputEvent::LoadDemo => gb.load_demo(),
            InputEvent::Clear => gb.clear(),
        };

        match result {
            Ok(()) => {
                // movement alone keeps the last error on screen
                if !matches!(
                    event,
                    InputEvent::Up | InputEvent::Down | InputEvent::Left | InputEvent::Right
                ) {
                    self.last_error = None;
                }
            }
            Err(e) => {
                tracing::warn!("{e}");
                self.last_error = Some(e.to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use groovebox::audio::HeadlessBackend;
    use groovebox::clock::ManualScheduler;
    use groovebox::shared::{Step, TrackAddress};
    use groovebox::synth::ToneSynth;
    use groovebox::GrooveConfig;

    use super::*;

    fn groovebox(instrument: Instrument) -> GrooveBox {
        let config = GrooveConfig {
            instrument,
            ..GrooveConfig::default()
        };
        GrooveBox::with_parts(
            &config,
            Box::new(HeadlessBackend::default()),
            Box::new(ManualScheduler::new()),
            Arc::new(ToneSynth),
        )
        .unwrap()
    }

    #[test]
    fn cursor_stays_on_the_grid() {
        let mut gb = groovebox(Instrument::Drums);
        let mut ts = TuiState::default();
        for _ in 0..10 {
            ts.apply(&mut gb, InputEvent::Down);
        }
        assert_eq!(ts.row, 2);
        ts.apply(&mut gb, InputEvent::Left);
        assert_eq!(ts.col, STEP_COUNT - 1);
        ts.apply(&mut gb, InputEvent::Right);
        assert_eq!(ts.col, 0);
    }

    #[test]
    fn toggle_hits_the_cell_under_the_cursor() {
        let mut gb = groovebox(Instrument::Drums);
        let mut ts = TuiState::default();
        ts.apply(&mut gb, InputEvent::Down);
        ts.apply(&mut gb, InputEvent::Right);
        ts.apply(&mut gb, InputEvent::ToggleStep);
        let snare = TrackAddress::Drum(DrumTrack::Snare);
        assert!(gb.pattern().is_set(snare, Step::new(1).unwrap()));
        assert!(ts.last_error.is_none());
    }

    #[test]
    fn switching_to_a_smaller_instrument_clamps_the_row() {
        let mut gb = groovebox(Instrument::Synth);
        let mut ts = TuiState {
            row: 5,
            ..TuiState::default()
        };
        // synth -> drop (4 rows)
        ts.apply(&mut gb, InputEvent::NextInstrument);
        assert_eq!(gb.active_instrument(), Instrument::Drop);
        assert_eq!(ts.row, 3);
    }

    #[test]
    fn knobs_clamp_to_legal_range() {
        let mut gb = groovebox(Instrument::Synth);
        let mut ts = TuiState::default();
        gb.set_tempo(3).unwrap();
        ts.apply(&mut gb, InputEvent::AdjustTempo(-5));
        assert_eq!(gb.tempo(), 1);
        gb.set_tempo(KNOB_MAX_TEMPO - 2).unwrap();
        ts.apply(&mut gb, InputEvent::AdjustTempo(5));
        assert_eq!(gb.tempo(), KNOB_MAX_TEMPO);

        for _ in 0..10 {
            ts.apply(&mut gb, InputEvent::AdjustVolume(0.05));
        }
        assert_eq!(gb.volume(), 1.0);
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut gb = groovebox(Instrument::Synth);
        let mut ts = TuiState::default();
        assert!(ts.apply(&mut gb, InputEvent::LoadDemo));
        assert!(!ts.apply(&mut gb, InputEvent::Quit));
    }
}
