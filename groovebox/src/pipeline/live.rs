// The published state the clock thread reads while the editing side writes.
//
// The pattern is swapped whole (readers keep whatever snapshot they loaded);
// the scalars are plain atomics. The output node is installed once and then
// only ever read.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use atomic_float::AtomicF32;

use crate::audio::OutputNode;
use crate::error::{GrooveError, Result};
use crate::pipeline::pattern::Pattern;
use crate::shared::{DEFAULT_TEMPO, DEFAULT_VOLUME, STEP_COUNT, Step};

pub struct LiveState {
    pattern: ArcSwap<Pattern>,
    tempo: AtomicU32,
    volume: AtomicF32,
    cursor: AtomicUsize,
    playing: AtomicBool,
    output: ArcSwapOption<OutputNode>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new(Pattern::empty(), DEFAULT_TEMPO, DEFAULT_VOLUME)
    }
}

impl LiveState {
    pub fn new(pattern: Pattern, tempo: u32, volume: f32) -> Self {
        Self {
            pattern: ArcSwap::from_pointee(pattern),
            tempo: AtomicU32::new(tempo),
            volume: AtomicF32::new(volume),
            cursor: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            output: ArcSwapOption::empty(),
        }
    }

    pub fn new_shared(pattern: Pattern, tempo: u32, volume: f32) -> Arc<Self> {
        Arc::new(Self::new(pattern, tempo, volume))
    }

    /// The current snapshot. Stays valid for as long as the caller holds it.
    pub fn pattern(&self) -> Arc<Pattern> {
        self.pattern.load_full()
    }

    pub fn publish_pattern(&self, pattern: Pattern) {
        self.pattern.store(Arc::new(pattern));
    }

    pub fn tempo(&self) -> u32 {
        self.tempo.load(Ordering::Acquire)
    }

    pub fn publish_tempo(&self, bpm: u32) {
        self.tempo.store(bpm, Ordering::Release);
    }

    pub fn volume(&self) -> f32 {
        self.volume.load(Ordering::Acquire)
    }

    pub fn publish_volume(&self, volume: f32) {
        self.volume.store(volume, Ordering::Release);
    }

    pub fn cursor(&self) -> Step {
        // only ever stored through Step, so this never falls back
        Step::new(self.cursor.load(Ordering::Acquire)).unwrap_or(Step::ZERO)
    }

    pub fn set_cursor(&self, step: Step) {
        self.cursor.store(step.index(), Ordering::Release);
    }

    /// Moves the cursor one step forward (wrapping) and returns the new step.
    pub fn advance_cursor(&self) -> Step {
        let prev = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
                Some((c + 1) % STEP_COUNT)
            })
            .unwrap_or(0);
        Step::new((prev + 1) % STEP_COUNT).unwrap_or(Step::ZERO)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    pub fn output(&self) -> Option<Arc<OutputNode>> {
        self.output.load_full()
    }

    pub fn install_output(&self, node: Arc<OutputNode>) -> Result<()> {
        let prev = self.output.compare_and_swap(&None::<Arc<OutputNode>>, Some(node));
        if prev.is_some() {
            return Err(GrooveError::InternalInvariant(
                "output node installed twice".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioBackend, HeadlessBackend};
    use crate::shared::{DrumTrack, TrackAddress};

    #[test]
    fn readers_keep_their_snapshot() {
        let live = LiveState::default();
        let before = live.pattern();
        let kick = TrackAddress::Drum(DrumTrack::Kick);
        live.publish_pattern(before.toggled(kick, Step::ZERO));
        assert!(!before.is_set(kick, Step::ZERO));
        assert!(live.pattern().is_set(kick, Step::ZERO));
    }

    #[test]
    fn cursor_wraps() {
        let live = LiveState::default();
        live.set_cursor(Step::new(STEP_COUNT - 1).unwrap());
        assert_eq!(live.advance_cursor(), Step::ZERO);
        assert_eq!(live.advance_cursor().index(), 1);
        assert_eq!(live.cursor().index(), 1);
    }

    #[test]
    fn scalars_publish() {
        let live = LiveState::new(Pattern::empty(), 90, 0.2);
        assert_eq!(live.tempo(), 90);
        live.publish_tempo(140);
        live.publish_volume(0.5);
        assert_eq!(live.tempo(), 140);
        assert_eq!(live.volume(), 0.5);
    }

    #[test]
    fn output_installs_once() {
        let live = LiveState::default();
        let mut backend = HeadlessBackend::default();
        assert!(live.output().is_none());
        live.install_output(backend.open().unwrap()).unwrap();
        assert!(live.output().is_some());
        assert!(matches!(
            live.install_output(backend.open().unwrap()),
            Err(GrooveError::InternalInvariant(_))
        ));
    }
}
