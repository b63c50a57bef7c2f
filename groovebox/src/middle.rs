// The one place that owns groovebox behaviour. The terminal surface (or any
// other caller) only ever goes through `GrooveBox`.
//
// Every mutation validates first and publishes second, so a rejected call
// leaves the pattern, tempo and volume exactly as they were. Opening the
// audio output happens last, and only from calls a user made on purpose:
// when it fails the mutation has still been committed and the caller gets
// `ResourceUnavailable` to show.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::{AudioBackend, DeviceBackend, HeadlessBackend, OutputNode};
use crate::clock::{self, PlaybackState, Scheduler, ThreadScheduler, Transport};
use crate::dispatch::dispatch_track;
use crate::error::{Result, ValidationError};
use crate::pipeline::config::GrooveConfig;
use crate::pipeline::live::LiveState;
use crate::pipeline::pattern::Pattern;
use crate::pipeline::preset::Preset;
use crate::shared::{Instrument, RowRef, Step, TrackAddress};
use crate::synth::{Synthesizer, ToneSynth};

pub struct GrooveBox {
    live: Arc<LiveState>,
    transport: Transport,
    backend: Box<dyn AudioBackend>,
    synth: Arc<dyn Synthesizer>,
    instrument: Instrument,
    audio: bool,
    preset: Option<String>,
}

fn validate_tempo(bpm: u32) -> Result<u32, ValidationError> {
    if bpm == 0 {
        return Err(ValidationError::TempoOutOfRange(bpm));
    }
    Ok(bpm)
}

fn validate_volume(volume: f32) -> Result<f32, ValidationError> {
    if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
        return Err(ValidationError::VolumeOutOfRange(volume));
    }
    Ok(volume)
}

impl GrooveBox {
    /// The stock engine: the default device (or a silent output when `audio`
    /// is off), a clock thread and the built-in synth.
    pub fn new(config: &GrooveConfig) -> Result<Self> {
        let backend: Box<dyn AudioBackend> = if config.audio {
            Box::new(DeviceBackend)
        } else {
            Box::new(HeadlessBackend::discarding())
        };
        Self::with_parts(
            config,
            backend,
            Box::new(ThreadScheduler::new()),
            Arc::new(ToneSynth),
        )
    }

    pub fn with_parts(
        config: &GrooveConfig,
        backend: Box<dyn AudioBackend>,
        scheduler: Box<dyn Scheduler>,
        synth: Arc<dyn Synthesizer>,
    ) -> Result<Self> {
        let tempo = validate_tempo(config.tempo)?;
        let volume = validate_volume(config.volume)?;
        let pattern = match config.preset.as_deref() {
            Some(name) => name.parse::<Preset>()?.build()?,
            None => Pattern::empty(),
        };

        let live = LiveState::new_shared(pattern, tempo, volume);
        let transport = Transport::new(scheduler, Arc::clone(&live), Arc::clone(&synth));
        Ok(Self {
            live,
            transport,
            backend,
            synth,
            instrument: config.instrument,
            audio: config.audio,
            preset: config.preset.clone(),
        })
    }

    // -- mutations --

    /// Flips one cell. While playing, toggling the cell under the cursor on
    /// sounds it straight away as well as on later passes.
    pub fn toggle_step<'a>(
        &mut self,
        instrument: Instrument,
        row: impl Into<RowRef<'a>>,
        step: usize,
    ) -> Result<()> {
        let address = TrackAddress::resolve(instrument, row.into())?;
        let step = Step::new(step)?;

        let next = self.live.pattern().toggled(address, step);
        let now_on = next.is_set(address, step);
        self.live.publish_pattern(next);
        debug!(track = %address.label(), %instrument, step = step.index(), now_on, "step toggled");

        if self.live.is_playing() && self.live.cursor() == step && now_on {
            let out = self.ensure_output()?;
            dispatch_track(
                &self.live.pattern(),
                address,
                step,
                &out,
                self.synth.as_ref(),
            );
        }
        Ok(())
    }

    /// Starts or stops playback and returns the new state. Playback starts
    /// even if the output can't be opened; the error still comes back.
    pub fn toggle_playback(&mut self) -> Result<PlaybackState> {
        if self.live.is_playing() {
            self.transport.stop()?;
            return Ok(PlaybackState::Stopped);
        }
        let opened = self.ensure_output();
        self.transport.start()?;
        opened?;
        Ok(PlaybackState::Playing)
    }

    pub fn set_tempo(&mut self, bpm: u32) -> Result<()> {
        let bpm = validate_tempo(bpm)?;
        self.live.publish_tempo(bpm);
        debug!(bpm, "tempo set");
        self.transport.retime()
    }

    /// Takes effect on the master gain at once, playing or not.
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        let volume = validate_volume(volume)?;
        self.live.publish_volume(volume);
        debug!(volume, "volume set");
        self.ensure_output()?.set_gain(volume);
        Ok(())
    }

    pub fn load_preset(&mut self, preset: Preset) -> Result<()> {
        let label = preset.label();
        let pattern = preset.build()?;
        self.live.publish_pattern(pattern);
        debug!(preset = label, "preset loaded");
        Ok(())
    }

    pub fn load_preset_named(&mut self, name: &str) -> Result<()> {
        let preset: Preset = name.parse()?;
        self.load_preset(preset)
    }

    pub fn load_demo(&mut self) -> Result<()> {
        self.load_preset(Preset::Demo)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.load_preset(Preset::Empty)
    }

    // -- editing surface --

    pub fn active_instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn set_active_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    pub fn cycle_instrument(&mut self) -> Instrument {
        self.instrument = self.instrument.next();
        self.instrument
    }

    // -- reads --

    pub fn pattern(&self) -> Arc<Pattern> {
        self.live.pattern()
    }

    /// Always 0 while stopped.
    pub fn cursor(&self) -> Step {
        self.live.cursor()
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    pub fn is_playing(&self) -> bool {
        self.live.is_playing()
    }

    pub fn tempo(&self) -> u32 {
        self.live.tempo()
    }

    pub fn volume(&self) -> f32 {
        self.live.volume()
    }

    pub fn tick_period(&self) -> Duration {
        clock::tick_period(self.live.tempo())
    }

    pub fn output_ready(&self) -> bool {
        self.live.output().is_some()
    }

    /// The current knobs, in the shape they are saved in.
    pub fn config(&self) -> GrooveConfig {
        GrooveConfig {
            tempo: self.tempo(),
            volume: self.volume(),
            instrument: self.instrument,
            audio: self.audio,
            preset: self.preset.clone(),
        }
    }

    pub fn shutdown(&mut self) -> Result<()> {
        self.transport.stop()
    }

    // The node is created once; later calls hand back the installed one.
    fn ensure_output(&mut self) -> Result<Arc<OutputNode>> {
        if let Some(out) = self.live.output() {
            return Ok(out);
        }
        let out = self.backend.open()?;
        out.set_gain(self.live.volume());
        self.live.install_output(Arc::clone(&out))?;
        Ok(out)
    }
}

impl Drop for GrooveBox {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("shutdown: {e}");
        }
    }
}
