use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use nt_core::{Error, Result, SpeechEngine};
use tokio::sync::Notify;

use crate::chunking::estimate_duration;

/// Engine that produces no audio. It remembers what it was asked to say and
/// can be told to fail on given texts.
pub struct DummyEngine {
    words_per_minute: Option<f64>,
    fail_on: HashSet<String>,
    spoken: Mutex<Vec<String>>,
    stops: AtomicUsize,
    stop_signal: Notify,
}

impl fmt::Debug for DummyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyEngine")
            .field("words_per_minute", &self.words_per_minute)
            .finish()
    }
}

impl Default for DummyEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyEngine {
    /// Completes every utterance right away.
    pub fn new() -> Self {
        Self {
            words_per_minute: None,
            fail_on: HashSet::new(),
            spoken: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            stop_signal: Notify::new(),
        }
    }

    /// Takes as long as reading the text aloud would.
    pub fn paced(words_per_minute: f64) -> Self {
        Self {
            words_per_minute: Some(words_per_minute),
            ..Self::new()
        }
    }

    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.fail_on.insert(text.into());
        self
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for DummyEngine {
    fn name(&self) -> &str {
        "silent"
    }

    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());

        if self.fail_on.contains(text) {
            return Err(Error::Synthesis(format!("refusing to say {:?}", text)));
        }

        match self.words_per_minute {
            Some(wpm) => {
                tokio::select! {
                    _ = tokio::time::sleep(estimate_duration(text, wpm)) => Ok(()),
                    _ = self.stop_signal.notified() => Err(Error::SpeechCancelled),
                }
            }
            None => {
                tokio::task::yield_now().await;
                Ok(())
            }
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stop_signal.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_records_and_fails() {
        let engine = DummyEngine::new().failing_on("bad.");
        engine.speak("good.").await.unwrap();
        assert!(matches!(engine.speak("bad.").await, Err(Error::Synthesis(_))));
        assert_eq!(engine.spoken(), vec!["good.", "bad."]);
    }

    #[tokio::test]
    async fn test_paced_utterance_can_be_stopped() {
        // one word at 1 wpm would take a minute
        let engine = Arc::new(DummyEngine::paced(1.0));
        let speaking = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.speak("slow").await })
        };
        while !speaking.is_finished() {
            engine.stop();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matches!(speaking.await.unwrap(), Err(Error::SpeechCancelled)));
        assert!(engine.stop_count() >= 1);
    }
}
