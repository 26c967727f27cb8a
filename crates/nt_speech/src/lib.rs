pub mod chunking;
pub mod engines;
pub mod playback;

pub use chunking::{chunks_for, estimate_duration, format_duration, segment_into_chunks};
pub use engines::{create_engine, CommandEngine, DummyEngine, EngineKind};
pub use playback::{PlaybackController, PlaybackMachine, PlaybackState, PlaybackStatus};

pub mod prelude {
    pub use super::chunking::{estimate_duration, format_duration, segment_into_chunks};
    pub use super::playback::{PlaybackController, PlaybackState, PlaybackStatus};
    pub use nt_core::{Error, Result, SpeechEngine};
}
