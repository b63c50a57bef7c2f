// The audio output: one device stream per process, and one master node that
// every synthesizer call routes through.
//
// The cpal stream is not `Send`, so it lives on its own `groovebox-audio`
// thread for the rest of the process. Everything else talks to it through an
// `OutputNode`: a command queue into the voice engine plus the master gain,
// which the callback reads once per block.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::Context;
use atomic_float::AtomicF32;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{error, info, warn};

use crate::audio_api::{AudioCommand, TriggerParams};
use crate::error::{GrooveError, Result};

mod engine;
mod voice;

pub use engine::Engine;

const COMMAND_QUEUE: usize = 1024;
const HEADLESS_SAMPLE_RATE: u32 = 44_100;

/// The shared master node.
pub struct OutputNode {
    tx: Sender<AudioCommand>,
    gain: Arc<AtomicF32>,
    sample_rate: u32,
}

impl OutputNode {
    fn new(tx: Sender<AudioCommand>, gain: Arc<AtomicF32>, sample_rate: u32) -> Self {
        Self {
            tx,
            gain,
            sample_rate,
        }
    }

    /// Queues a momentary sound. Never blocks; a full queue drops the trigger.
    pub fn schedule(&self, params: TriggerParams) {
        match self.tx.try_send(AudioCommand::Trigger(params)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("audio queue full, trigger dropped"),
            // receiver gone: nothing is listening, which is fine for a headless node
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain.load(Ordering::Relaxed)
    }

    pub(crate) fn set_gain(&self, gain: f32) {
        self.gain.store(gain, Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Creates the output node. Only ever called from inside a user action.
pub trait AudioBackend: Send {
    fn open(&mut self) -> Result<Arc<OutputNode>>;
}

// -- device backend ---------------------------------------------------

// process-wide: once a device node exists, every later open hands it back
static DEVICE: Mutex<Option<Arc<OutputNode>>> = Mutex::new(None);

#[derive(Debug, Default)]
pub struct DeviceBackend;

impl AudioBackend for DeviceBackend {
    fn open(&mut self) -> Result<Arc<OutputNode>> {
        let mut slot = DEVICE
            .lock()
            .map_err(|_| GrooveError::InternalInvariant("audio device slot poisoned".into()))?;
        if let Some(node) = slot.as_ref() {
            return Ok(Arc::clone(node));
        }

        let node = spawn_device_thread().map_err(|e| {
            warn!("could not open audio output: {e:#}");
            GrooveError::ResourceUnavailable(format!("{e:#}"))
        })?;
        *slot = Some(Arc::clone(&node));
        Ok(node)
    }
}

fn spawn_device_thread() -> anyhow::Result<Arc<OutputNode>> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded::<anyhow::Result<OutputNode>>(1);

    thread::Builder::new()
        .name("groovebox-audio".into())
        .spawn(move || match start_stream() {
            Ok((stream, node)) => {
                if ready_tx.send(Ok(node)).is_err() {
                    return;
                }
                // the stream lives until the process goes away
                let _stream = stream;
                loop {
                    thread::park();
                }
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
            }
        })
        .context("failed to spawn audio thread")?;

    let node = ready_rx
        .recv()
        .context("audio thread exited before reporting")??;
    Ok(Arc::new(node))
}

fn start_stream() -> anyhow::Result<(cpal::Stream, OutputNode)> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let gain = Arc::new(AtomicF32::new(0.0));

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_output_stream_f32(
            &device,
            &config.into(),
            rx,
            Arc::clone(&gain),
            sample_rate as f32,
            channels,
        )?,
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    };
    stream.play().context("failed to play output stream")?;

    info!(sample_rate, channels, "audio output opened");
    Ok((stream, OutputNode::new(tx, gain, sample_rate)))
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    gain: Arc<AtomicF32>,
    sample_rate: f32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate);

    let err_fn = |err| error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }
            engine.render_block(data, channels, gain.load(Ordering::Relaxed));
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

// -- headless backend -------------------------------------------------

/// An output with no device behind it. Triggers pile up in a queue that can be
/// drained, or rendered offline through an `Engine`.
pub struct HeadlessBackend {
    sample_rate: u32,
    tx: Sender<AudioCommand>,
    // None when nobody is listening; triggers are then dropped quietly
    rx: Option<Receiver<AudioCommand>>,
    gain: Arc<AtomicF32>,
    opened: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(HEADLESS_SAMPLE_RATE)
    }
}

impl HeadlessBackend {
    pub fn new(sample_rate: u32) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(COMMAND_QUEUE);
        Self {
            sample_rate,
            tx,
            rx: Some(rx),
            gain: Arc::new(AtomicF32::new(0.0)),
            opened: 0,
        }
    }

    /// A headless output whose triggers go nowhere.
    pub fn discarding() -> Self {
        let mut backend = Self::default();
        backend.rx = None;
        backend
    }

    /// A handle on the command queue; stays valid after the backend is boxed.
    pub fn commands(&self) -> Receiver<AudioCommand> {
        match &self.rx {
            Some(rx) => rx.clone(),
            None => crossbeam_channel::never(),
        }
    }

    /// A backend that refuses to open, standing in for a missing device.
    pub fn unavailable() -> FailingBackend {
        FailingBackend
    }
}

impl AudioBackend for HeadlessBackend {
    fn open(&mut self) -> Result<Arc<OutputNode>> {
        self.opened += 1;
        if self.opened > 1 {
            warn!(times = self.opened, "headless output opened again");
        }
        Ok(Arc::new(OutputNode::new(
            self.tx.clone(),
            Arc::clone(&self.gain),
            self.sample_rate,
        )))
    }
}

#[derive(Debug, Default)]
pub struct FailingBackend;

impl AudioBackend for FailingBackend {
    fn open(&mut self) -> Result<Arc<OutputNode>> {
        Err(GrooveError::ResourceUnavailable("no output device".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::Waveform;

    #[test]
    fn headless_node_queues_triggers() {
        let mut backend = HeadlessBackend::new(8000);
        let commands = backend.commands();
        let node = backend.open().unwrap();
        let params = TriggerParams::tone(Waveform::Sine, 220.0, 0.1);
        node.schedule(params);
        assert_eq!(commands.try_recv(), Ok(AudioCommand::Trigger(params)));
        assert_eq!(node.sample_rate(), 8000);
    }

    #[test]
    fn gain_is_shared_by_every_handle() {
        let mut backend = HeadlessBackend::default();
        let a = backend.open().unwrap();
        let b = backend.open().unwrap();
        a.set_gain(0.25);
        assert_eq!(b.gain(), 0.25);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let mut backend = HeadlessBackend::default();
        let node = backend.open().unwrap();
        for _ in 0..COMMAND_QUEUE + 10 {
            node.schedule(TriggerParams::tone(Waveform::Noise, 1.0, 0.1));
        }
        assert_eq!(backend.commands().len(), COMMAND_QUEUE);
    }

    #[test]
    fn discarding_node_drops_quietly() {
        let mut backend = HeadlessBackend::discarding();
        let node = backend.open().unwrap();
        for _ in 0..COMMAND_QUEUE + 10 {
            node.schedule(TriggerParams::tone(Waveform::Sine, 440.0, 0.1));
        }
        assert!(backend.commands().try_recv().is_err());
    }

    #[test]
    fn failing_backend_reports_resource_unavailable() {
        let mut backend = HeadlessBackend::unavailable();
        assert!(matches!(
            backend.open(),
            Err(GrooveError::ResourceUnavailable(_))
        ));
    }
}
