// The pattern store. A `Pattern` is an immutable value: every edit builds a new
// one, and the clock only ever sees whole patterns.
//
// Each category sits behind an `Arc`, and so does each track inside it. Toggling
// a step copies the touched category (a handful of pointers) and the touched
// track (16 bools); every other track is shared with the previous pattern.

use std::sync::Arc;

use crate::shared::{
    DROP_ROWS, DrumTrack, MELODIC_ROWS, MelodicCategory, STEP_COUNT, Step, TrackAddress,
};

pub type Track = [bool; STEP_COUNT];

pub const EMPTY_TRACK: Track = [false; STEP_COUNT];

/// Builds a track with the given steps switched on.
pub const fn track_with(on: &[usize]) -> Track {
    let mut track = EMPTY_TRACK;
    let mut i = 0;
    while i < on.len() {
        track[on[i]] = true;
        i += 1;
    }
    track
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrumKit {
    kick: Arc<Track>,
    snare: Arc<Track>,
    hihat: Arc<Track>,
}

impl DrumKit {
    pub fn new(kick: Track, snare: Track, hihat: Track) -> Self {
        Self {
            kick: Arc::new(kick),
            snare: Arc::new(snare),
            hihat: Arc::new(hihat),
        }
    }

    pub fn track(&self, drum: DrumTrack) -> &Arc<Track> {
        match drum {
            DrumTrack::Kick => &self.kick,
            DrumTrack::Snare => &self.snare,
            DrumTrack::HiHat => &self.hihat,
        }
    }

    fn track_mut(&mut self, drum: DrumTrack) -> &mut Arc<Track> {
        match drum {
            DrumTrack::Kick => &mut self.kick,
            DrumTrack::Snare => &mut self.snare,
            DrumTrack::HiHat => &mut self.hihat,
        }
    }

    fn empty(shared: &Arc<Track>) -> Self {
        Self {
            kick: Arc::clone(shared),
            snare: Arc::clone(shared),
            hihat: Arc::clone(shared),
        }
    }
}

/// A fixed-size stack of pitch rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Rows<const N: usize>([Arc<Track>; N]);

impl<const N: usize> Rows<N> {
    pub fn new(rows: [Track; N]) -> Self {
        Self(rows.map(Arc::new))
    }

    pub fn row(&self, index: usize) -> &Arc<Track> {
        &self.0[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.0.iter().map(|t| t.as_ref())
    }

    fn empty(shared: &Arc<Track>) -> Self {
        Self(std::array::from_fn(|_| Arc::clone(shared)))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    drums: Arc<DrumKit>,
    bass: Arc<Rows<MELODIC_ROWS>>,
    synth: Arc<Rows<MELODIC_ROWS>>,
    strings: Arc<Rows<MELODIC_ROWS>>,
    drop: Arc<Rows<DROP_ROWS>>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::empty()
    }
}

impl Pattern {
    /// The canonical empty pattern: every track all-false.
    pub fn empty() -> Self {
        let blank = Arc::new(EMPTY_TRACK);
        Self {
            drums: Arc::new(DrumKit::empty(&blank)),
            bass: Arc::new(Rows::empty(&blank)),
            synth: Arc::new(Rows::empty(&blank)),
            strings: Arc::new(Rows::empty(&blank)),
            drop: Arc::new(Rows::empty(&blank)),
        }
    }

    pub fn from_parts(
        drums: DrumKit,
        bass: Rows<MELODIC_ROWS>,
        synth: Rows<MELODIC_ROWS>,
        strings: Rows<MELODIC_ROWS>,
        drop: Rows<DROP_ROWS>,
    ) -> Self {
        Self {
            drums: Arc::new(drums),
            bass: Arc::new(bass),
            synth: Arc::new(synth),
            strings: Arc::new(strings),
            drop: Arc::new(drop),
        }
    }

    pub fn drums(&self) -> &DrumKit {
        &self.drums
    }

    pub fn melodic(&self, category: MelodicCategory) -> &Rows<MELODIC_ROWS> {
        match category {
            MelodicCategory::Bass => &self.bass,
            MelodicCategory::Synth => &self.synth,
            MelodicCategory::Strings => &self.strings,
        }
    }

    pub fn drop_rows(&self) -> &Rows<DROP_ROWS> {
        &self.drop
    }

    fn track_arc(&self, address: TrackAddress) -> &Arc<Track> {
        match address {
            TrackAddress::Drum(drum) => self.drums.track(drum),
            TrackAddress::Melodic(category, row) => self.melodic(category).row(row.index()),
            TrackAddress::Drop(row) => self.drop.row(row.index()),
        }
    }

    pub fn track(&self, address: TrackAddress) -> &Track {
        self.track_arc(address)
    }

    pub fn is_set(&self, address: TrackAddress, step: Step) -> bool {
        self.track(address)[step.index()]
    }

    /// A new pattern with one cell flipped. Only the touched track and its
    /// category container are fresh allocations.
    pub fn toggled(&self, address: TrackAddress, step: Step) -> Pattern {
        let mut next = self.clone();
        let slot = match address {
            TrackAddress::Drum(drum) => Arc::make_mut(&mut next.drums).track_mut(drum),
            TrackAddress::Melodic(category, row) => {
                let rows = match category {
                    MelodicCategory::Bass => &mut next.bass,
                    MelodicCategory::Synth => &mut next.synth,
                    MelodicCategory::Strings => &mut next.strings,
                };
                &mut Arc::make_mut(rows).0[row.index()]
            }
            TrackAddress::Drop(row) => &mut Arc::make_mut(&mut next.drop).0[row.index()],
        };

        let mut cells = **slot;
        cells[step.index()] = !cells[step.index()];
        *slot = Arc::new(cells);
        next
    }

    /// Tracks with a trigger at `step`, in dispatch order.
    pub fn triggers_at(&self, step: Step) -> impl Iterator<Item = TrackAddress> + '_ {
        TrackAddress::all().filter(move |address| self.is_set(*address, step))
    }

    pub fn is_empty(&self) -> bool {
        TrackAddress::all().all(|address| self.track(address).iter().all(|cell| !cell))
    }

    pub fn active_cells(&self) -> usize {
        TrackAddress::all()
            .map(|address| self.track(address).iter().filter(|cell| **cell).count())
            .sum()
    }

    /// True when both patterns hold the very same allocation for this track.
    pub fn shares_track(&self, other: &Pattern, address: TrackAddress) -> bool {
        Arc::ptr_eq(self.track_arc(address), other.track_arc(address))
    }
}
