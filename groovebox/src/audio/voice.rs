use crate::audio_api::{TriggerParams, Waveform};

const SILENT: Voice = Voice {
    waveform: Waveform::Sine,
    phase: 0.0,
    freq: 0.0,
    ratio: 1.0,
    age: 0,
    attack: 0,
    length: 0,
    level: 0.0,
    active: false,
};

#[derive(Clone, Copy, Debug)]
pub struct Voice {
    waveform: Waveform,
    phase: f32,
    freq: f32,
    // per-sample frequency multiplier for the exponential sweep
    ratio: f32,
    age: u32,
    attack: u32,
    length: u32,
    level: f32,
    pub active: bool,
}

impl Default for Voice {
    fn default() -> Self {
        SILENT
    }
}

impl Voice {
    pub fn new(params: &TriggerParams, sample_rate: f32) -> Self {
        let length = (params.length.max(0.0) * sample_rate) as u32;
        if length == 0 || params.freq <= 0.0 {
            return SILENT;
        }
        let attack = ((params.attack.max(0.0) * sample_rate) as u32).min(length);
        let ratio = if params.freq_end > 0.0 {
            (params.freq_end / params.freq).powf(1.0 / length as f32)
        } else {
            1.0
        };

        Self {
            waveform: params.waveform,
            phase: 0.0,
            freq: params.freq,
            ratio,
            age: 0,
            attack,
            length,
            level: params.level,
            active: true,
        }
    }

    fn envelope(&self) -> f32 {
        if self.age < self.attack {
            return self.age as f32 / self.attack as f32;
        }
        let decay = (self.age - self.attack) as f32 / (self.length - self.attack).max(1) as f32;
        let remaining = 1.0 - decay;
        remaining * remaining
    }

    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        if self.age >= self.length {
            self.active = false;
            return 0.0;
        }

        let out = self.waveform.sample(self.phase) * self.envelope() * self.level;

        self.phase += self.freq / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }
        self.freq *= self.ratio;
        self.age += 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f32 = 1000.0;

    #[test]
    fn voice_dies_after_its_length() {
        let params = TriggerParams::tone(Waveform::Sine, 50.0, 0.1);
        let mut voice = Voice::new(&params, RATE);
        for _ in 0..100 {
            voice.next_sample(RATE);
        }
        assert!(voice.active);
        voice.next_sample(RATE);
        assert!(!voice.active);
        assert_eq!(voice.next_sample(RATE), 0.0);
    }

    #[test]
    fn zero_length_trigger_is_silent() {
        let params = TriggerParams::tone(Waveform::Saw, 110.0, 0.0);
        assert!(!Voice::new(&params, RATE).active);
    }

    #[test]
    fn sweep_reaches_target_frequency() {
        let params = TriggerParams::tone(Waveform::Sine, 200.0, 1.0).sweep_to(50.0);
        let mut voice = Voice::new(&params, RATE);
        for _ in 0..1000 {
            voice.next_sample(RATE);
        }
        assert!((voice.freq - 50.0).abs() < 0.5, "ended at {}", voice.freq);
    }

    #[test]
    fn output_stays_within_level() {
        let params = TriggerParams::tone(Waveform::Square, 100.0, 0.2).level(0.4);
        let mut voice = Voice::new(&params, RATE);
        for _ in 0..200 {
            assert!(voice.next_sample(RATE).abs() <= 0.4 + f32::EPSILON);
        }
    }
}
