// Read-and-fan-out: one pattern snapshot, one step, one synthesizer call per
// trigger. Nothing here waits on the audio thread.

use tracing::trace;

use crate::audio::OutputNode;
use crate::pipeline::live::LiveState;
use crate::pipeline::pattern::Pattern;
use crate::shared::{Step, TrackAddress};
use crate::synth::{Synthesizer, Voice};

/// Plays every trigger at `step`, drums first, then bass, synth, strings and
/// drop rows in ascending order. Returns how many voices were fired.
pub fn dispatch(pattern: &Pattern, step: Step, out: &OutputNode, synth: &dyn Synthesizer) -> usize {
    let mut fired = 0;
    for address in pattern.triggers_at(step) {
        synth.play(out, Voice::for_track(address));
        fired += 1;
    }
    if fired > 0 {
        trace!(step = step.index(), fired, "dispatched");
    }
    fired
}

/// Plays a single track at `step` if its cell is on.
pub fn dispatch_track(
    pattern: &Pattern,
    address: TrackAddress,
    step: Step,
    out: &OutputNode,
    synth: &dyn Synthesizer,
) -> bool {
    if !pattern.is_set(address, step) {
        return false;
    }
    synth.play(out, Voice::for_track(address));
    true
}

/// Dispatches `step` against whatever is published right now. Silent when no
/// output has been opened yet.
pub fn fire_step(live: &LiveState, step: Step, synth: &dyn Synthesizer) -> usize {
    match live.output() {
        Some(out) => dispatch(&live.pattern(), step, &out, synth),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::audio::{AudioBackend, HeadlessBackend};
    use crate::pipeline::preset;
    use crate::shared::{DrumTrack, Instrument, MelodicCategory, Row};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Voice>>);

    impl Synthesizer for Recorder {
        fn play(&self, _out: &OutputNode, voice: Voice) {
            self.0.lock().unwrap().push(voice);
        }
    }

    fn node() -> Arc<OutputNode> {
        HeadlessBackend::default().open().unwrap()
    }

    #[test]
    fn demo_step_zero_in_category_order() {
        let rec = Recorder::default();
        let fired = dispatch(&preset::demo(), Step::ZERO, &node(), &rec);
        let voices = rec.0.into_inner().unwrap();
        assert_eq!(fired, voices.len());
        assert_eq!(
            voices,
            vec![
                Voice::Kick,
                Voice::HiHat,
                Voice::Bass(0),
                Voice::Strings(5),
                Voice::Drop {
                    row: 0,
                    duration: 0.3
                },
            ]
        );
    }

    #[test]
    fn empty_pattern_is_silent() {
        let rec = Recorder::default();
        for step in Step::all() {
            assert_eq!(dispatch(&Pattern::empty(), step, &node(), &rec), 0);
        }
        assert!(rec.0.into_inner().unwrap().is_empty());
    }

    #[test]
    fn single_track_only_when_on() {
        let rec = Recorder::default();
        let pattern = preset::demo();
        let bass = TrackAddress::Melodic(
            MelodicCategory::Bass,
            Row::new(1, Instrument::Bass).unwrap(),
        );
        let out = node();
        assert!(!dispatch_track(&pattern, bass, Step::ZERO, &out, &rec));
        assert!(dispatch_track(&pattern, bass, Step::new(4).unwrap(), &out, &rec));
        assert_eq!(rec.0.into_inner().unwrap(), vec![Voice::Bass(1)]);
    }

    #[test]
    fn fire_step_without_output_is_silent() {
        let rec = Recorder::default();
        let live = LiveState::new(preset::demo(), 120, 0.7);
        assert_eq!(fire_step(&live, Step::ZERO, &rec), 0);

        live.install_output(node()).unwrap();
        assert!(fire_step(&live, Step::ZERO, &rec) > 0);
        assert!(rec.0.into_inner().unwrap().contains(&Voice::for_track(
            TrackAddress::Drum(DrumTrack::Kick)
        )));
    }
}
