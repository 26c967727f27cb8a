use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Speak a single utterance, resolving once it is done.
    ///
    /// Resolves with [`crate::Error::SpeechCancelled`] when [`SpeechEngine::stop`]
    /// interrupts it and [`crate::Error::Synthesis`] when the engine fails.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Cancel the utterance in flight, if any.
    fn stop(&self);
}
