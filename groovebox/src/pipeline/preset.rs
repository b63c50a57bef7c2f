use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pipeline::pattern::{DrumKit, EMPTY_TRACK, Pattern, Rows, Track, track_with};
use crate::shared::{DROP_ROWS, DrumTrack, Instrument, MELODIC_ROWS, MelodicCategory};

// -- the demo groove --
// Four on the floor, snare on the backbeat, hats on every even step, and one
// note per beat spread over bass, synth, strings and the drops.

const DEMO_KICK: Track = track_with(&[0, 4, 8, 12]);
const DEMO_SNARE: Track = track_with(&[4, 12]);
const DEMO_HIHAT: Track = track_with(&[0, 2, 4, 6, 8, 10, 12, 14]);

const DEMO_BASS: [Track; MELODIC_ROWS] = [
    track_with(&[0, 8]),
    track_with(&[4]),
    track_with(&[12]),
    EMPTY_TRACK,
    EMPTY_TRACK,
    EMPTY_TRACK,
];

const DEMO_SYNTH: [Track; MELODIC_ROWS] = [
    EMPTY_TRACK,
    track_with(&[14]),
    track_with(&[10]),
    track_with(&[6]),
    track_with(&[2]),
    EMPTY_TRACK,
];

const DEMO_STRINGS: [Track; MELODIC_ROWS] = [
    EMPTY_TRACK,
    EMPTY_TRACK,
    track_with(&[12]),
    track_with(&[4]),
    track_with(&[8]),
    track_with(&[0]),
];

const DEMO_DROP: [Track; DROP_ROWS] = [
    track_with(&[0]),
    track_with(&[4]),
    track_with(&[8]),
    track_with(&[12]),
];

pub fn demo() -> Pattern {
    Pattern::from_parts(
        DrumKit::new(DEMO_KICK, DEMO_SNARE, DEMO_HIHAT),
        Rows::new(DEMO_BASS),
        Rows::new(DEMO_SYNTH),
        Rows::new(DEMO_STRINGS),
        Rows::new(DEMO_DROP),
    )
}

#[derive(Clone, Debug, PartialEq)]
pub enum Preset {
    Empty,
    Demo,
    Grid(PatternGrid),
}

impl Preset {
    pub fn build(self) -> Result<Pattern, ValidationError> {
        match self {
            Preset::Empty => Ok(Pattern::empty()),
            Preset::Demo => Ok(demo()),
            Preset::Grid(grid) => Pattern::try_from(grid),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Empty => "empty",
            Preset::Demo => "demo",
            Preset::Grid(_) => "grid",
        }
    }
}

impl FromStr for Preset {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "demo" => Ok(Preset::Demo),
            "empty" | "clear" => Ok(Preset::Empty),
            _ => Err(ValidationError::UnknownPreset(s.to_string())),
        }
    }
}

/// Plain data form of a pattern, shaped like the editing surface sees it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternGrid {
    pub drums: DrumGrid,
    pub bass: Vec<Vec<bool>>,
    pub synth: Vec<Vec<bool>>,
    pub drop: Vec<Vec<bool>>,
    pub strings: Vec<Vec<bool>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DrumGrid {
    pub kick: Vec<bool>,
    pub snare: Vec<bool>,
    pub hihat: Vec<bool>,
}

fn to_track(name: String, cells: &[bool]) -> Result<Track, ValidationError> {
    <Track>::try_from(cells).map_err(|_| ValidationError::TrackLength {
        track: name,
        len: cells.len(),
    })
}

fn to_rows<const N: usize>(
    instrument: Instrument,
    rows: &[Vec<bool>],
) -> Result<Rows<N>, ValidationError> {
    if rows.len() != N {
        return Err(ValidationError::RowCount {
            instrument,
            expected: N,
            got: rows.len(),
        });
    }
    let mut tracks = [EMPTY_TRACK; N];
    for (i, (slot, cells)) in tracks.iter_mut().zip(rows).enumerate() {
        *slot = to_track(format!("{instrument} row {i}"), cells)?;
    }
    Ok(Rows::new(tracks))
}

impl TryFrom<PatternGrid> for Pattern {
    type Error = ValidationError;

    fn try_from(grid: PatternGrid) -> Result<Self, Self::Error> {
        let drums = DrumKit::new(
            to_track("kick".into(), &grid.drums.kick)?,
            to_track("snare".into(), &grid.drums.snare)?,
            to_track("hihat".into(), &grid.drums.hihat)?,
        );
        Ok(Pattern::from_parts(
            drums,
            to_rows(Instrument::Bass, &grid.bass)?,
            to_rows(Instrument::Synth, &grid.synth)?,
            to_rows(Instrument::Strings, &grid.strings)?,
            to_rows(Instrument::Drop, &grid.drop)?,
        ))
    }
}

impl From<&Pattern> for PatternGrid {
    fn from(pattern: &Pattern) -> Self {
        let melodic = |category| -> Vec<Vec<bool>> {
            pattern
                .melodic(category)
                .iter()
                .map(|t| t.to_vec())
                .collect()
        };
        let drum = |d| pattern.drums().track(d).to_vec();
        PatternGrid {
            drums: DrumGrid {
                kick: drum(DrumTrack::Kick),
                snare: drum(DrumTrack::Snare),
                hihat: drum(DrumTrack::HiHat),
            },
            bass: melodic(MelodicCategory::Bass),
            synth: melodic(MelodicCategory::Synth),
            drop: pattern.drop_rows().iter().map(|t| t.to_vec()).collect(),
            strings: melodic(MelodicCategory::Strings),
        }
    }
}

impl PatternGrid {
    /// An all-off grid with the right shape.
    pub fn blank() -> Self {
        PatternGrid::from(&Pattern::empty())
    }
}
