pub mod audio;
pub mod audio_api;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod middle;
pub mod pipeline;
pub mod shared;
pub mod synth;

pub use clock::PlaybackState;
pub use error::{GrooveError, Result, ValidationError};
pub use middle::GrooveBox;
pub use pipeline::config::GrooveConfig;
pub use pipeline::preset::Preset;
