use crate::audio_api::{AudioCommand, TriggerParams};

use super::voice::Voice;

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback

pub struct Engine {
    sample_rate: f32,
    voices: [Voice; MAX_VOICES], // fixed pool of voices
    next_steal: usize,
}

impl Engine {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            voices: [Voice::default(); MAX_VOICES],
            next_steal: 0,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Trigger(t) => self.trigger_voice(&t),
        }
    }

    fn trigger_voice(&mut self, t: &TriggerParams) {
        // what slot do we write to? a free one, else round-robin steal
        let slot = match self.voices.iter().position(|v| !v.active) {
            Some(slot) => slot,
            None => {
                let slot = self.next_steal;
                self.next_steal = (self.next_steal + 1) % MAX_VOICES;
                slot
            }
        };
        self.voices[slot] = Voice::new(t, self.sample_rate);
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    pub fn next_sample(&mut self) -> f32 {
        let mut out = 0.0f32;
        for v in &mut self.voices {
            out += v.next_sample(self.sample_rate);
        }
        out
    }

    /// Fills an interleaved buffer, the same mono signal on every channel,
    /// scaled by the master gain.
    pub fn render_block(&mut self, data: &mut [f32], channels: usize, gain: f32) {
        for frame in data.chunks_mut(channels.max(1)) {
            let sample = (self.next_sample() * gain).clamp(-1.0, 1.0);
            frame.fill(sample);
        }
    }
}
