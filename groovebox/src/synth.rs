// Synthesizers: given the master node and a voice, schedule one short sound.
// Fire-and-forget; nothing comes back to the caller.

use crate::audio::OutputNode;
use crate::audio_api::{TriggerParams, Waveform};
use crate::shared::{DROP_DURATIONS, DrumTrack, MELODIC_ROWS, MelodicCategory, TrackAddress};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Voice {
    Kick,
    Snare,
    HiHat,
    Bass(usize),
    Synth(usize),
    Strings(usize),
    Drop { row: usize, duration: f32 },
}

impl Voice {
    /// The voice a track fires; drop rows carry their fixed length.
    pub fn for_track(address: TrackAddress) -> Voice {
        match address {
            TrackAddress::Drum(DrumTrack::Kick) => Voice::Kick,
            TrackAddress::Drum(DrumTrack::Snare) => Voice::Snare,
            TrackAddress::Drum(DrumTrack::HiHat) => Voice::HiHat,
            TrackAddress::Melodic(MelodicCategory::Bass, row) => Voice::Bass(row.index()),
            TrackAddress::Melodic(MelodicCategory::Synth, row) => Voice::Synth(row.index()),
            TrackAddress::Melodic(MelodicCategory::Strings, row) => Voice::Strings(row.index()),
            TrackAddress::Drop(row) => Voice::Drop {
                row: row.index(),
                duration: DROP_DURATIONS[row.index()],
            },
        }
    }
}

pub trait Synthesizer: Send + Sync {
    fn play(&self, out: &OutputNode, voice: Voice);
}

// C minor pentatonic, row 0 lowest
const SCALE: [u8; MELODIC_ROWS] = [0, 3, 5, 7, 10, 12];
const BASS_ROOT: u8 = 36; // C2
const STRINGS_ROOT: u8 = 48; // C3
const SYNTH_ROOT: u8 = 60; // C4

pub fn midi_note_to_frequency(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

fn row_freq(root: u8, row: usize) -> f32 {
    // rows past the scale fold back onto it an octave up
    let degree = SCALE[row % MELODIC_ROWS] + 12 * (row / MELODIC_ROWS) as u8;
    midi_note_to_frequency(root + degree)
}

/// The built-in oscillator kit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToneSynth;

impl ToneSynth {
    pub fn voice_params(voice: Voice) -> Vec<TriggerParams> {
        match voice {
            Voice::Kick => vec![
                TriggerParams::tone(Waveform::Sine, 150.0, 0.45)
                    .sweep_to(45.0)
                    .attack(0.001)
                    .level(0.9),
            ],
            Voice::Snare => vec![
                TriggerParams::tone(Waveform::Noise, 1.0, 0.18)
                    .attack(0.001)
                    .level(0.35),
                TriggerParams::tone(Waveform::Triangle, 180.0, 0.1)
                    .attack(0.001)
                    .level(0.3),
            ],
            Voice::HiHat => vec![
                TriggerParams::tone(Waveform::Noise, 1.0, 0.05)
                    .attack(0.0005)
                    .level(0.2),
            ],
            Voice::Bass(row) => vec![
                TriggerParams::tone(Waveform::Saw, row_freq(BASS_ROOT, row), 0.3).level(0.4),
            ],
            Voice::Synth(row) => vec![
                TriggerParams::tone(Waveform::Square, row_freq(SYNTH_ROOT, row), 0.25).level(0.2),
            ],
            Voice::Strings(row) => {
                let freq = row_freq(STRINGS_ROOT, row);
                // two slightly detuned saws with a slow bow
                [0.997, 1.003]
                    .into_iter()
                    .map(|detune| {
                        TriggerParams::tone(Waveform::Saw, freq * detune, 0.9)
                            .attack(0.15)
                            .level(0.15)
                    })
                    .collect()
            }
            Voice::Drop { row, duration } => vec![
                TriggerParams::tone(Waveform::Saw, 220.0 + 40.0 * row as f32, duration)
                    .sweep_to(40.0)
                    .attack(0.01)
                    .level(0.45),
            ],
        }
    }
}

impl Synthesizer for ToneSynth {
    fn play(&self, out: &OutputNode, voice: Voice) {
        for params in Self::voice_params(voice) {
            out.schedule(params);
        }
    }
}
