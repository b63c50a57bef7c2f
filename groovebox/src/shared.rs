// Fixed shapes of the groovebox grid, and the addresses that point into it.
//
// Every category has a closed set of tracks:
//   drums    3 named tracks (kick, snare, hihat)
//   bass     6 rows, one per pitch
//   synth    6 rows
//   strings  6 rows
//   drop     4 rows, each bound to its own trigger length
//
// Callers hand us loose addresses (an instrument plus a name or a number, the
// way the editing surface sees them); `TrackAddress::resolve` turns those into
// the closed `TrackAddress` sum type, and from then on a row address can't be
// out of range for its category.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const STEP_COUNT: usize = 16;
pub const MELODIC_ROWS: usize = 6;
pub const DROP_ROWS: usize = 4;

// row 0 is the tight drop, row 3 the epic one (seconds)
pub const DROP_DURATIONS: [f32; DROP_ROWS] = [0.3, 0.6, 1.0, 1.5];

pub const DEFAULT_TEMPO: u32 = 120;
pub const DEFAULT_VOLUME: f32 = 0.7;

/// One sixteenth-note slot in the loop, always within `[0, STEP_COUNT)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step(u8);

impl Step {
    pub const ZERO: Step = Step(0);

    pub fn new(index: usize) -> Result<Self, ValidationError> {
        if index < STEP_COUNT {
            Ok(Step(index as u8))
        } else {
            Err(ValidationError::StepOutOfRange(index))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The step after this one, wrapping at the end of the loop.
    pub fn next(self) -> Step {
        Step(((self.index() + 1) % STEP_COUNT) as u8)
    }

    pub fn all() -> impl Iterator<Item = Step> {
        (0..STEP_COUNT).map(|i| Step(i as u8))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Drums,
    Bass,
    Synth,
    Drop,
    Strings,
}

impl Instrument {
    pub const ALL: [Instrument; 5] = [
        Instrument::Drums,
        Instrument::Bass,
        Instrument::Synth,
        Instrument::Drop,
        Instrument::Strings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Drums => "drums",
            Instrument::Bass => "bass",
            Instrument::Synth => "synth",
            Instrument::Drop => "drop",
            Instrument::Strings => "strings",
        }
    }

    /// How many tracks the category holds.
    pub fn rows(self) -> usize {
        match self {
            Instrument::Drums => DrumTrack::ALL.len(),
            Instrument::Bass | Instrument::Synth | Instrument::Strings => MELODIC_ROWS,
            Instrument::Drop => DROP_ROWS,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Instrument::Drums => Instrument::Bass,
            Instrument::Bass => Instrument::Synth,
            Instrument::Synth => Instrument::Drop,
            Instrument::Drop => Instrument::Strings,
            Instrument::Strings => Instrument::Drums,
        }
    }

    /// Every address in this category, in dispatch order.
    pub fn tracks(self) -> Vec<TrackAddress> {
        match self {
            Instrument::Drums => DrumTrack::ALL.into_iter().map(TrackAddress::Drum).collect(),
            Instrument::Bass => melodic_tracks(MelodicCategory::Bass),
            Instrument::Synth => melodic_tracks(MelodicCategory::Synth),
            Instrument::Strings => melodic_tracks(MelodicCategory::Strings),
            Instrument::Drop => (0..DROP_ROWS)
                .map(|i| TrackAddress::Drop(Row(i as u8)))
                .collect(),
        }
    }
}

fn melodic_tracks(category: MelodicCategory) -> Vec<TrackAddress> {
    (0..MELODIC_ROWS)
        .map(|i| TrackAddress::Melodic(category, Row(i as u8)))
        .collect()
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownInstrument(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrumTrack {
    Kick,
    Snare,
    HiHat,
}

impl DrumTrack {
    pub const ALL: [DrumTrack; 3] = [DrumTrack::Kick, DrumTrack::Snare, DrumTrack::HiHat];

    pub fn name(self) -> &'static str {
        match self {
            DrumTrack::Kick => "kick",
            DrumTrack::Snare => "snare",
            DrumTrack::HiHat => "hihat",
        }
    }
}

impl fmt::Display for DrumTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DrumTrack {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kick" => Ok(DrumTrack::Kick),
            "snare" => Ok(DrumTrack::Snare),
            "hihat" | "hi-hat" => Ok(DrumTrack::HiHat),
            _ => Err(ValidationError::UnknownDrum(s.to_string())),
        }
    }
}

/// The categories addressed by numeric pitch row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MelodicCategory {
    Bass,
    Synth,
    Strings,
}

impl MelodicCategory {
    pub fn instrument(self) -> Instrument {
        match self {
            MelodicCategory::Bass => Instrument::Bass,
            MelodicCategory::Synth => Instrument::Synth,
            MelodicCategory::Strings => Instrument::Strings,
        }
    }
}

/// A row index that is known to be in range for an `N`-row category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Row<const N: usize>(u8);

impl<const N: usize> Row<N> {
    pub fn new(index: usize, instrument: Instrument) -> Result<Self, ValidationError> {
        if index < N {
            Ok(Row(index as u8))
        } else {
            Err(ValidationError::RowOutOfRange {
                instrument,
                row: index,
            })
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The row half of a loose address: drums go by name, everything else by number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowRef<'a> {
    Name(&'a str),
    Index(usize),
    Drum(DrumTrack),
}

impl From<usize> for RowRef<'_> {
    fn from(index: usize) -> Self {
        RowRef::Index(index)
    }
}

impl<'a> From<&'a str> for RowRef<'a> {
    fn from(name: &'a str) -> Self {
        RowRef::Name(name)
    }
}

impl From<DrumTrack> for RowRef<'_> {
    fn from(drum: DrumTrack) -> Self {
        RowRef::Drum(drum)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackAddress {
    Drum(DrumTrack),
    Melodic(MelodicCategory, Row<MELODIC_ROWS>),
    Drop(Row<DROP_ROWS>),
}

impl TrackAddress {
    pub fn resolve(instrument: Instrument, row: RowRef<'_>) -> Result<Self, ValidationError> {
        let melodic = |category: MelodicCategory| -> Result<Self, ValidationError> {
            match row {
                RowRef::Index(i) => Ok(TrackAddress::Melodic(category, Row::new(i, instrument)?)),
                _ => Err(ValidationError::WrongRowKind {
                    instrument,
                    expected: "row number",
                }),
            }
        };

        match instrument {
            Instrument::Drums => match row {
                RowRef::Drum(drum) => Ok(TrackAddress::Drum(drum)),
                RowRef::Name(name) => Ok(TrackAddress::Drum(name.parse()?)),
                RowRef::Index(_) => Err(ValidationError::WrongRowKind {
                    instrument,
                    expected: "track name",
                }),
            },
            Instrument::Bass => melodic(MelodicCategory::Bass),
            Instrument::Synth => melodic(MelodicCategory::Synth),
            Instrument::Strings => melodic(MelodicCategory::Strings),
            Instrument::Drop => match row {
                RowRef::Index(i) => Ok(TrackAddress::Drop(Row::new(i, instrument)?)),
                _ => Err(ValidationError::WrongRowKind {
                    instrument,
                    expected: "row number",
                }),
            },
        }
    }

    /// All 25 tracks in dispatch order: drums, bass, synth, strings, drop.
    pub fn all() -> impl Iterator<Item = TrackAddress> {
        [
            Instrument::Drums,
            Instrument::Bass,
            Instrument::Synth,
            Instrument::Strings,
            Instrument::Drop,
        ]
        .into_iter()
        .flat_map(Instrument::tracks)
    }

    pub fn instrument(self) -> Instrument {
        match self {
            TrackAddress::Drum(_) => Instrument::Drums,
            TrackAddress::Melodic(category, _) => category.instrument(),
            TrackAddress::Drop(_) => Instrument::Drop,
        }
    }

    pub fn label(self) -> String {
        match self {
            TrackAddress::Drum(drum) => drum.name().to_string(),
            TrackAddress::Melodic(_, row) => format!("row {}", row.index()),
            TrackAddress::Drop(row) => format!("{:.1}s", DROP_DURATIONS[row.index()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_at_loop_end() {
        let last = Step::new(STEP_COUNT - 1).unwrap();
        assert_eq!(last.next(), Step::ZERO);
        assert_eq!(Step::ZERO.next().index(), 1);
    }

    #[test]
    fn step_rejects_out_of_range() {
        assert_eq!(
            Step::new(STEP_COUNT),
            Err(ValidationError::StepOutOfRange(STEP_COUNT))
        );
    }

    #[test]
    fn drums_resolve_by_name_only() {
        assert_eq!(
            TrackAddress::resolve(Instrument::Drums, "hi-hat".into()),
            Ok(TrackAddress::Drum(DrumTrack::HiHat))
        );
        assert_eq!(
            TrackAddress::resolve(Instrument::Drums, "cowbell".into()),
            Err(ValidationError::UnknownDrum("cowbell".into()))
        );
        assert!(matches!(
            TrackAddress::resolve(Instrument::Drums, 0.into()),
            Err(ValidationError::WrongRowKind { .. })
        ));
    }

    #[test]
    fn rows_are_bounded_per_category() {
        assert!(TrackAddress::resolve(Instrument::Bass, 5.into()).is_ok());
        assert_eq!(
            TrackAddress::resolve(Instrument::Bass, 6.into()),
            Err(ValidationError::RowOutOfRange {
                instrument: Instrument::Bass,
                row: 6
            })
        );
        assert!(TrackAddress::resolve(Instrument::Drop, 3.into()).is_ok());
        assert!(TrackAddress::resolve(Instrument::Drop, 4.into()).is_err());
        assert!(TrackAddress::resolve(Instrument::Synth, "kick".into()).is_err());
    }

    #[test]
    fn every_track_is_listed_once() {
        let all: Vec<_> = TrackAddress::all().collect();
        assert_eq!(all.len(), 3 + 3 * MELODIC_ROWS + DROP_ROWS);
        assert_eq!(all[0], TrackAddress::Drum(DrumTrack::Kick));
        assert_eq!(all.last().map(|a| a.instrument()), Some(Instrument::Drop));
    }

    #[test]
    fn instrument_parses_and_cycles() {
        assert_eq!("Strings".parse::<Instrument>(), Ok(Instrument::Strings));
        assert!("piano".parse::<Instrument>().is_err());
        let mut i = Instrument::Drums;
        for _ in 0..Instrument::ALL.len() {
            i = i.next();
        }
        assert_eq!(i, Instrument::Drums);
    }
}
