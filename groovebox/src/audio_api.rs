// What synthesizers hand to the audio thread. The engine never builds sounds on
// its own; it only renders the triggers it is sent.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
    Noise,
}

impl Waveform {
    // phase in [0, 1)
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => phase * 2.0 - 1.0,
            Waveform::Triangle => {
                if phase < 0.5 {
                    phase * 4.0 - 1.0
                } else {
                    3.0 - phase * 4.0
                }
            }
            Waveform::Noise => fastrand::f32() * 2.0 - 1.0,
        }
    }
}

/// One momentary sound: an oscillator that sweeps from `freq` to `freq_end`
/// over `length` seconds under an attack/decay envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerParams {
    pub waveform: Waveform,
    pub freq: f32,
    pub freq_end: f32,
    pub attack: f32,
    pub length: f32,
    pub level: f32,
}

impl TriggerParams {
    pub fn tone(waveform: Waveform, freq: f32, length: f32) -> Self {
        Self {
            waveform,
            freq,
            freq_end: freq,
            attack: 0.005,
            length,
            level: 0.5,
        }
    }

    pub fn sweep_to(mut self, freq_end: f32) -> Self {
        self.freq_end = freq_end;
        self
    }

    pub fn attack(mut self, seconds: f32) -> Self {
        self.attack = seconds;
        self
    }

    pub fn level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioCommand {
    Trigger(TriggerParams),
}
