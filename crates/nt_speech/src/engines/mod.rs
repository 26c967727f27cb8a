use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use nt_core::config::SpeechConfig;
use nt_core::{Error, Result, SpeechEngine};

pub mod command;
pub mod dummy;

pub use command::CommandEngine;
pub use dummy::DummyEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// External TTS program from `speech.command`.
    Command,
    /// No audio, paced at the configured reading speed.
    Silent,
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "command" | "espeak" => Ok(EngineKind::Command),
            "silent" | "dummy" => Ok(EngineKind::Silent),
            other => Err(Error::Config(format!(
                "Unknown speech engine '{}'. Available engines: command, silent",
                other
            ))),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Command => write!(f, "command"),
            EngineKind::Silent => write!(f, "silent"),
        }
    }
}

pub fn create_engine(kind: EngineKind, config: &SpeechConfig) -> Result<Arc<dyn SpeechEngine>> {
    match kind {
        EngineKind::Command => Ok(Arc::new(CommandEngine::new(&config.command)?)),
        EngineKind::Silent => Ok(Arc::new(DummyEngine::paced(config.words_per_minute))),
    }
}
