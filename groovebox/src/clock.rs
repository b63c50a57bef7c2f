// The playback clock: a Stopped/Playing state machine over a periodic
// scheduler. Every tick advances the cursor and dispatches against whatever
// is published at that instant; nothing is captured when playback starts.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use crate::dispatch::fire_step;
use crate::error::{GrooveError, Result};
use crate::pipeline::live::LiveState;
use crate::shared::Step;
use crate::synth::Synthesizer;

pub type TickFn = Box<dyn FnMut() + Send + 'static>;

/// One tick per sixteenth note.
pub fn tick_period_ms(bpm: u32) -> f64 {
    60_000.0 / (4.0 * bpm as f64)
}

pub fn tick_period(bpm: u32) -> Duration {
    Duration::from_secs_f64(tick_period_ms(bpm) / 1000.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Runs a callback every `period` until cancelled.
pub trait Scheduler: Send {
    /// Replaces any running callback.
    fn arm(&mut self, period: Duration, tick: TickFn) -> Result<()>;
    /// No tick runs after this returns.
    fn cancel(&mut self) -> Result<()>;
    fn is_armed(&self) -> bool;
}

// -- thread scheduler -------------------------------------------------

struct Running {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Ticks on a `groovebox-clock` thread. Deadlines accumulate from the arm
/// instant, so a slow tick does not push every later one back.
#[derive(Default)]
pub struct ThreadScheduler {
    running: Option<Running>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&mut self, period: Duration, mut tick: TickFn) -> Result<()> {
        self.cancel()?;

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("groovebox-clock".into())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                loop {
                    match stop_rx.recv_deadline(deadline) {
                        Err(RecvTimeoutError::Timeout) => {
                            tick();
                            deadline += period;
                            let now = Instant::now();
                            if deadline < now {
                                // fell a whole period behind; skip rather than burst
                                warn!(late_ms = (now - deadline).as_millis() as u64, "clock overrun");
                                deadline = now + period;
                            }
                        }
                        // stop signal or the scheduler went away
                        _ => break,
                    }
                }
            })
            .map_err(|e| GrooveError::InternalInvariant(format!("failed to spawn clock thread: {e}")))?;

        self.running = Some(Running { stop_tx, handle });
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        let _ = running.stop_tx.send(());
        running
            .handle
            .join()
            .map_err(|_| GrooveError::InternalInvariant("clock thread panicked".into()))
    }

    fn is_armed(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.cancel() {
            warn!("{e}");
        }
    }
}

// -- manual scheduler -------------------------------------------------

#[derive(Default)]
struct ManualInner {
    tick: Option<TickFn>,
    period: Option<Duration>,
    arm_count: usize,
}

/// A scheduler that only ticks when told to. Clones share the same slot, so a
/// test can keep one handle and give the other to the engine.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick. Returns false when nothing is armed.
    pub fn fire(&self) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        match inner.tick.as_mut() {
            Some(tick) => {
                tick();
                true
            }
            None => false,
        }
    }

    pub fn fire_n(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }

    /// The period of the armed callback, if any.
    pub fn period(&self) -> Option<Duration> {
        self.inner.lock().ok().and_then(|inner| inner.period)
    }

    /// How many times a callback has been armed so far.
    pub fn arm_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.arm_count).unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, period: Duration, tick: TickFn) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| GrooveError::InternalInvariant("manual scheduler poisoned".into()))?;
        inner.tick = Some(tick);
        inner.period = Some(period);
        inner.arm_count += 1;
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| GrooveError::InternalInvariant("manual scheduler poisoned".into()))?;
        inner.tick = None;
        inner.period = None;
        Ok(())
    }

    fn is_armed(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.tick.is_some())
            .unwrap_or(false)
    }
}

// -- transport --------------------------------------------------------

pub struct Transport {
    scheduler: Box<dyn Scheduler>,
    live: Arc<LiveState>,
    synth: Arc<dyn Synthesizer>,
}

impl Transport {
    pub fn new(
        scheduler: Box<dyn Scheduler>,
        live: Arc<LiveState>,
        synth: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            scheduler,
            live,
            synth,
        }
    }

    pub fn state(&self) -> PlaybackState {
        if self.live.is_playing() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    /// Plays step 0 right away, then ticks at the current tempo.
    pub fn start(&mut self) -> Result<()> {
        if self.live.is_playing() {
            return Ok(());
        }
        self.live.set_cursor(Step::ZERO);
        fire_step(&self.live, Step::ZERO, self.synth.as_ref());
        self.live.set_playing(true);

        let bpm = self.live.tempo();
        if let Err(e) = self.arm(bpm) {
            self.live.set_playing(false);
            return Err(e);
        }
        info!(bpm, "playback started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if !self.live.is_playing() {
            return Ok(());
        }
        let cancelled = self.scheduler.cancel();
        self.live.set_playing(false);
        self.live.set_cursor(Step::ZERO);
        info!("playback stopped");
        cancelled
    }

    /// Re-arms at the published tempo, keeping the cursor where it is.
    pub fn retime(&mut self) -> Result<()> {
        if !self.live.is_playing() {
            return Ok(());
        }
        let bpm = self.live.tempo();
        let rearmed = match self.scheduler.cancel() {
            Ok(()) => self.arm(bpm),
            Err(e) => Err(e),
        };
        if let Err(e) = rearmed {
            // nothing is ticking any more, so we are not playing either
            self.live.set_playing(false);
            self.live.set_cursor(Step::ZERO);
            warn!("clock lost, playback stopped: {e}");
            return Err(e);
        }
        debug!(bpm, cursor = self.live.cursor().index(), "clock re-armed");
        Ok(())
    }

    fn arm(&mut self, bpm: u32) -> Result<()> {
        let live = Arc::clone(&self.live);
        let synth = Arc::clone(&self.synth);
        self.scheduler.arm(
            tick_period(bpm),
            Box::new(move || {
                if !live.is_playing() {
                    return;
                }
                let step = live.advance_cursor();
                fire_step(&live, step, synth.as_ref());
            }),
        )
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::audio::{AudioBackend, HeadlessBackend, OutputNode};
    use crate::pipeline::pattern::Pattern;
    use crate::pipeline::preset;
    use crate::synth::Voice;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl Synthesizer for Counter {
        fn play(&self, _out: &OutputNode, _voice: Voice) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn transport(pattern: Pattern) -> (Transport, ManualScheduler, Arc<LiveState>, Arc<Counter>) {
        let live = LiveState::new_shared(pattern, 120, 0.7);
        live.install_output(HeadlessBackend::default().open().unwrap())
            .unwrap();
        let sched = ManualScheduler::new();
        let counter = Arc::new(Counter::default());
        let t = Transport::new(
            Box::new(sched.clone()),
            Arc::clone(&live),
            Arc::clone(&counter) as Arc<dyn Synthesizer>,
        );
        (t, sched, live, counter)
    }

    #[test]
    fn period_is_a_sixteenth_note() {
        assert_eq!(tick_period_ms(120), 125.0);
        assert_eq!(tick_period_ms(60), 250.0);
        assert_eq!(tick_period_ms(1), 15_000.0);
        assert_eq!(tick_period(120), Duration::from_millis(125));
    }

    #[test]
    fn start_plays_step_zero_before_any_tick() {
        let (mut t, sched, live, counter) = transport(preset::demo());
        t.start().unwrap();
        assert_eq!(t.state(), PlaybackState::Playing);
        assert_eq!(live.cursor(), Step::ZERO);
        assert_eq!(counter.0.load(Ordering::SeqCst), 5);
        assert_eq!(sched.period(), Some(Duration::from_millis(125)));
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let (mut t, sched, _live, _counter) = transport(Pattern::empty());
        t.start().unwrap();
        t.start().unwrap();
        assert_eq!(sched.arm_count(), 1);
    }

    #[test]
    fn ticks_advance_and_wrap() {
        let (mut t, sched, live, _counter) = transport(Pattern::empty());
        t.start().unwrap();
        sched.fire_n(3);
        assert_eq!(live.cursor().index(), 3);
        sched.fire_n(13);
        assert_eq!(live.cursor(), Step::ZERO);
    }

    #[test]
    fn stop_cancels_and_resets_cursor() {
        let (mut t, sched, live, _counter) = transport(Pattern::empty());
        t.start().unwrap();
        sched.fire_n(5);
        t.stop().unwrap();
        assert_eq!(t.state(), PlaybackState::Stopped);
        assert_eq!(live.cursor(), Step::ZERO);
        assert!(!sched.is_armed());
        assert!(!sched.fire());
        // stopping again is fine
        t.stop().unwrap();
    }

    #[test]
    fn retime_keeps_cursor() {
        let (mut t, sched, live, _counter) = transport(Pattern::empty());
        t.start().unwrap();
        sched.fire_n(6);
        live.publish_tempo(60);
        t.retime().unwrap();
        assert_eq!(live.cursor().index(), 6);
        assert_eq!(sched.period(), Some(Duration::from_millis(250)));
        assert_eq!(sched.arm_count(), 2);
        sched.fire();
        assert_eq!(live.cursor().index(), 7);
    }

    // a scheduler whose clock has died: it arms fine but cannot be cancelled
    #[derive(Default)]
    struct DeadClock {
        armed: bool,
    }

    impl Scheduler for DeadClock {
        fn arm(&mut self, _period: Duration, _tick: TickFn) -> Result<()> {
            self.armed = true;
            Ok(())
        }

        fn cancel(&mut self) -> Result<()> {
            self.armed = false;
            Err(GrooveError::InternalInvariant("clock thread panicked".into()))
        }

        fn is_armed(&self) -> bool {
            self.armed
        }
    }

    #[test]
    fn failed_retime_leaves_transport_stopped() {
        let live = LiveState::new_shared(Pattern::empty(), 120, 0.7);
        let mut t = Transport::new(
            Box::new(DeadClock::default()),
            Arc::clone(&live),
            Arc::new(Counter::default()),
        );
        t.start().unwrap();
        live.set_cursor(Step::new(7).unwrap());

        live.publish_tempo(90);
        assert!(matches!(t.retime(), Err(GrooveError::InternalInvariant(_))));
        assert_eq!(t.state(), PlaybackState::Stopped);
        assert_eq!(live.cursor(), Step::ZERO);
        // a later stop has nothing left to do
        t.stop().unwrap();
    }

    #[test]
    fn retime_while_stopped_does_not_arm() {
        let (mut t, sched, _live, _counter) = transport(Pattern::empty());
        t.retime().unwrap();
        assert_eq!(sched.arm_count(), 0);
    }

    #[test]
    fn thread_scheduler_stops_ticking_after_cancel() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut sched = ThreadScheduler::new();
        let counted = Arc::clone(&ticks);
        sched
            .arm(
                Duration::from_millis(2),
                Box::new(move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert!(sched.is_armed());
        thread::sleep(Duration::from_millis(30));
        sched.cancel().unwrap();
        assert!(!sched.is_armed());

        let after_cancel = ticks.load(Ordering::SeqCst);
        assert!(after_cancel > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }
}
