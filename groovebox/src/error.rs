use thiserror::Error;

use crate::shared::{Instrument, STEP_COUNT};

/// A caller mistake. Raised before anything is published, so the engine state
/// is exactly what it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("step {0} is outside 0..{max}", max = STEP_COUNT)]
    StepOutOfRange(usize),
    #[error("row {row} does not exist on {instrument}")]
    RowOutOfRange { instrument: Instrument, row: usize },
    #[error("{instrument} tracks are addressed by {expected}")]
    WrongRowKind {
        instrument: Instrument,
        expected: &'static str,
    },
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
    #[error("unknown drum track '{0}'")]
    UnknownDrum(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("tempo must be at least 1 bpm, got {0}")]
    TempoOutOfRange(u32),
    #[error("volume must be within [0, 1], got {0}")]
    VolumeOutOfRange(f32),
    #[error("{instrument} needs {expected} rows, got {got}")]
    RowCount {
        instrument: Instrument,
        expected: usize,
        got: usize,
    },
    #[error("track '{track}' has {len} steps, expected {}", STEP_COUNT)]
    TrackLength { track: String, len: usize },
}

#[derive(Debug, Error)]
pub enum GrooveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // The mutation that hit this has already been committed; only sound is missing.
    #[error("audio output unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl GrooveError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GrooveError::Validation(_))
    }
}

pub type Result<T, E = GrooveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_bad_value() {
        assert_eq!(
            ValidationError::StepOutOfRange(16).to_string(),
            "step 16 is outside 0..16"
        );
        assert_eq!(
            ValidationError::TempoOutOfRange(0).to_string(),
            "tempo must be at least 1 bpm, got 0"
        );
        assert_eq!(
            ValidationError::TrackLength {
                track: "kick".into(),
                len: 8
            }
            .to_string(),
            "track 'kick' has 8 steps, expected 16"
        );
    }

    #[test]
    fn validation_converts_into_groove_error() {
        let err: GrooveError = ValidationError::TempoOutOfRange(0).into();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "tempo must be at least 1 bpm, got 0");
    }
}
